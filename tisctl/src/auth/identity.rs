//! The authenticated identity of a request and the context handed to units of work.
//!
//! The access gate inserts an [`Identity`] into the request extensions once the credential
//! has been validated. Handlers read it back with the [`Identity`] extractor (which fails if
//! the route was not gated) or with [`RequestContext`], which treats absence as a valid,
//! anonymous state and is what [`run_in_transaction`](crate::db::unit_of_work::run_in_transaction)
//! consumes.

use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

use crate::{auth::roles::Role, errors::Error, types::UserId};

/// Who is acting, as asserted by a verified access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Identity>().copied().ok_or(Error::MissingCredential)
    }
}

/// Per-request context carried into a unit of work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestContext {
    identity: Option<Identity>,
}

impl RequestContext {
    /// Context with no acting identity; units of work run without a binding.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The user id to bind into a transaction, if any.
    ///
    /// A zero id is treated the same as an absent identity.
    pub fn acting_user_id(&self) -> Option<UserId> {
        self.identity.map(|identity| identity.user_id).filter(|id| *id != 0)
    }
}

impl From<Identity> for RequestContext {
    fn from(identity: Identity) -> Self {
        Self { identity: Some(identity) }
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            identity: parts.extensions.get::<Identity>().copied(),
        })
    }
}
