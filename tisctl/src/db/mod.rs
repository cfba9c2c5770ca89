//! Database layer for data persistence and access.
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations for CRUD operations
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types
//! - [`unit_of_work`]: Transactions bound to the acting user
//!
//! All mutating request paths run their repository calls inside
//! [`unit_of_work::run_in_transaction`], which binds `app.current_user_id` for the
//! duration of the transaction. The schema's audit trigger reads that setting to fill the
//! `created_by` and `updated_by` columns.

pub mod errors;
pub mod handlers;
pub mod models;
pub mod unit_of_work;
