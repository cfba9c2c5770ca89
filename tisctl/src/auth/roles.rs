//! Roles and the role registry.
//!
//! Roles are persisted as small integers (`users.role_id`) and travel in access tokens as
//! lowercase names. [`RoleRegistry`] is the single source of truth for the mapping between
//! the two. It is built once at startup, never mutated, and shared through
//! [`AppState`](crate::AppState).
//!
//! | name        | id |
//! |-------------|----|
//! | `admin`     | 1  |
//! | `inspector` | 2  |
//! | `analyst`   | 3  |

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::errors::Error;
use crate::types::RoleId;

/// Rendered in place of a role name when a stored id has no mapping.
pub const UNKNOWN_ROLE: &str = "unknown";

const ROLE_CODES: [(Role, RoleId); 3] = [(Role::Admin, 1), (Role::Inspector, 2), (Role::Analyst, 3)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Inspector,
    Analyst,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Inspector => "inspector",
            Role::Analyst => "analyst",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable bidirectional mapping between role names and role ids.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    by_name: HashMap<&'static str, RoleId>,
    by_id: HashMap<RoleId, Role>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self {
            by_name: ROLE_CODES.iter().map(|(role, id)| (role.as_str(), *id)).collect(),
            by_id: ROLE_CODES.iter().map(|(role, id)| (*id, *role)).collect(),
        }
    }

    /// Resolve a role name to its storage id.
    ///
    /// Unknown names are an error since this guards write paths (user creation, role
    /// assignment). Matching is exact: `"Admin"` is not a role name.
    pub fn name_to_id(&self, name: &str) -> Result<RoleId, Error> {
        self.by_name.get(name).copied().ok_or_else(|| Error::InvalidRole { name: name.to_string() })
    }

    /// Render a stored role id as a name, or [`UNKNOWN_ROLE`] if it has no mapping.
    pub fn id_to_name(&self, id: RoleId) -> &'static str {
        self.role_for_id(id).map(|role| role.as_str()).unwrap_or(UNKNOWN_ROLE)
    }

    pub fn role_for_id(&self, id: RoleId) -> Option<Role> {
        self.by_id.get(&id).copied()
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_mapping() {
        let registry = RoleRegistry::new();

        assert_eq!(registry.name_to_id("admin").unwrap(), 1);
        assert_eq!(registry.name_to_id("inspector").unwrap(), 2);
        assert_eq!(registry.name_to_id("analyst").unwrap(), 3);

        assert_eq!(registry.id_to_name(1), "admin");
        assert_eq!(registry.id_to_name(2), "inspector");
        assert_eq!(registry.id_to_name(3), "analyst");
    }

    #[test]
    fn test_round_trip_for_every_role() {
        let registry = RoleRegistry::new();

        for (role, _) in ROLE_CODES {
            let id = registry.name_to_id(role.as_str()).unwrap();
            assert_eq!(registry.id_to_name(id), role.as_str());
            assert_eq!(registry.role_for_id(id), Some(role));
        }
    }

    #[test]
    fn test_unmapped_id_renders_unknown() {
        let registry = RoleRegistry::new();

        assert_eq!(registry.id_to_name(0), UNKNOWN_ROLE);
        assert_eq!(registry.id_to_name(99), UNKNOWN_ROLE);
        assert_eq!(registry.id_to_name(-1), UNKNOWN_ROLE);
        assert_eq!(registry.role_for_id(4), None);
    }

    #[test]
    fn test_unknown_name_is_invalid_role() {
        let registry = RoleRegistry::new();

        for name in ["superuser", "", "Admin", " admin"] {
            match registry.name_to_id(name) {
                Err(Error::InvalidRole { name: reported }) => assert_eq!(reported, name),
                other => panic!("Expected InvalidRole for {name:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Inspector).unwrap(), "\"inspector\"");
        let role: Role = serde_json::from_str("\"analyst\"").unwrap();
        assert_eq!(role, Role::Analyst);
    }
}
