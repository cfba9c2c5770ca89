//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Authentication** (`/users/login`, `/users/logout`): public login, authenticated logout
//! - **Users** (`/users/*`): account management, admin only except `/users/update`
//! - **Drivers** (`/drivers/*`): driver records, any authenticated user
//! - **Vehicles** (`/vehicles/*`): vehicle records, any authenticated user
//!
//! Bodies are JSON. Errors are rendered as `{"message": ...}` with the status code chosen by
//! [`crate::errors::Error`].

pub mod handlers;
pub mod models;
