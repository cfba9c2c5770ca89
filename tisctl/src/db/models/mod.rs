//! Database record structures.
//!
//! Each entity has a create request, an update request (all fields optional, `None` leaves
//! the column untouched) and a response type mapped from the table row.

pub mod drivers;
pub mod users;
pub mod vehicles;
