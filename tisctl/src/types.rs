//! Common identifier types.
//!
//! Entity IDs are the integer primary keys PostgreSQL assigns (`SERIAL`), wrapped in type
//! aliases so signatures say which table an id belongs to:
//!
//! - [`UserId`]: user account identifier, also the acting identity bound into transactions
//! - [`RoleId`]: storage code of a role, see [`crate::auth::roles`]
//! - [`DriverId`]: driver record identifier
//! - [`VehicleId`]: vehicle record identifier

use std::fmt;

pub type UserId = i32;
pub type RoleId = i16;
pub type DriverId = i32;
pub type VehicleId = i32;

/// Kinds of records managed by the service, used in error messages and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    Driver,
    Vehicle,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::User => write!(f, "User"),
            Resource::Driver => write!(f, "Driver"),
            Resource::Vehicle => write!(f, "Vehicle"),
        }
    }
}
