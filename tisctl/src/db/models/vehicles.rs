//! Database models for vehicles.

use crate::types::{DriverId, UserId, VehicleId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct VehicleCreateDBRequest {
    pub plate_number: String,
    pub model: String,
    pub year: i32,
    pub vehicle_type: String,
    pub owner_driver_id: Option<DriverId>,
}

#[derive(Debug, Clone, Default)]
pub struct VehicleUpdateDBRequest {
    pub plate_number: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub vehicle_type: Option<String>,
    pub owner_driver_id: Option<DriverId>,
}

#[derive(Debug, Clone, FromRow)]
pub struct VehicleDBResponse {
    pub id: VehicleId,
    pub plate_number: String,
    pub model: String,
    pub year: i32,
    pub vehicle_type: String,
    pub owner_driver_id: Option<DriverId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
}
