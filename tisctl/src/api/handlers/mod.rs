//! HTTP request handlers for all API endpoints.
//!
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Business logic execution via database repositories
//! - Response serialization
//!
//! Access control happens before a handler runs, in the gate attached to its route group
//! (see [`crate::auth::gate`]). Handlers that mutate data take a
//! [`RequestContext`](crate::auth::identity::RequestContext) and run their repository calls
//! through [`run_in_transaction`](crate::db::unit_of_work::run_in_transaction).
//!
//! # Handler Modules
//!
//! - [`auth`]: Login and logout
//! - [`drivers`]: Driver registration, updates and lookups
//! - [`users`]: User CRUD operations
//! - [`vehicles`]: Vehicle registration, updates and listing

pub mod auth;
pub mod drivers;
pub mod users;
pub mod vehicles;
