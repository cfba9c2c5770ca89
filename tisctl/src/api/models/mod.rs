//! API request and response data models.
//!
//! API models are kept apart from the database models so that the wire format (field names
//! such as `date_birth` or `type`, string dates, role names) can differ from the storage
//! representation. Request models validate themselves on conversion into their database
//! counterparts.
//!
//! - [`users`]: User management and login/logout payloads
//! - [`drivers`]: Driver records
//! - [`vehicles`]: Vehicle records
//! - [`pagination`]: Chunked list parameters

pub mod drivers;
pub mod pagination;
pub mod users;
pub mod vehicles;
