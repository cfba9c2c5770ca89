//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection`, which in request handling is the connection
//! of an open transaction handed out by
//! [`run_in_transaction`](crate::db::unit_of_work::run_in_transaction). Repositories never
//! begin or commit transactions themselves.
//!
//! # Available Repositories
//!
//! - [`Users`]: User accounts and credential lookup
//! - [`Drivers`]: Driver records, keyed externally by license number
//! - [`Vehicles`]: Vehicle records, keyed externally by plate number
//!
//! # Common Pattern
//!
//! ```ignore
//! use tisctl::db::handlers::{Repository, Users};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Users::new(&mut tx);
//!
//!     let users = repo.list(&UserFilter::new(0, 10)).await?;
//!
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod drivers;
pub mod repository;
pub mod users;
pub mod vehicles;

pub use drivers::Drivers;
pub use repository::Repository;
pub use users::Users;
pub use vehicles::Vehicles;
