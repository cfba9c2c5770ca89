//! API request and response models for vehicles.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::vehicles::{VehicleCreateDBRequest, VehicleDBResponse, VehicleUpdateDBRequest},
    errors::Error,
    types::{DriverId, VehicleId},
};

/// Year of the first production automobile.
pub const MIN_YEAR: i32 = 1886;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddVehicleRequest {
    pub number: String,
    pub model: String,
    pub year: i32,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    /// Id of the owning driver, if any
    pub owner: Option<DriverId>,
}

/// Partial update of the vehicle registered as `number`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateVehicleRequest {
    pub number: String,
    pub new_number: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,
    pub owner: Option<DriverId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleResponse {
    pub id: VehicleId,
    pub number: String,
    pub model: String,
    pub year: i32,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub owner: Option<DriverId>,
    pub created_at: DateTime<Utc>,
}

impl From<VehicleDBResponse> for VehicleResponse {
    fn from(vehicle: VehicleDBResponse) -> Self {
        Self {
            id: vehicle.id,
            number: vehicle.plate_number,
            model: vehicle.model,
            year: vehicle.year,
            vehicle_type: vehicle.vehicle_type,
            owner: vehicle.owner_driver_id,
            created_at: vehicle.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehiclesResponse {
    pub vehicles: Vec<VehicleResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleCreatedResponse {
    pub message: String,
    pub vehicle_id: VehicleId,
}

/// Query for listing vehicles, optionally restricted to one owner.
#[derive(Debug, Default, Deserialize)]
pub struct VehicleListQuery {
    /// Owner driver id, kept raw so a malformed value is reported as a JSON bad request
    pub owner: Option<String>,
}

impl VehicleListQuery {
    pub fn owner_id(&self) -> Result<Option<DriverId>, Error> {
        self.owner
            .as_deref()
            .map(|owner| owner.trim().parse::<DriverId>().map_err(|_| bad_request("invalid 'owner' parameter")))
            .transpose()
    }
}

fn bad_request(message: &str) -> Error {
    Error::BadRequest {
        message: message.to_string(),
    }
}

fn check_year(year: i32, today: NaiveDate) -> Result<(), Error> {
    let latest = today.year() + 1;
    if !(MIN_YEAR..=latest).contains(&year) {
        return Err(Error::BadRequest {
            message: format!("year must be between {MIN_YEAR} and {latest}"),
        });
    }
    Ok(())
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().is_empty())
}

impl AddVehicleRequest {
    pub fn into_db(self, today: NaiveDate) -> Result<VehicleCreateDBRequest, Error> {
        if self.number.trim().is_empty() || self.model.trim().is_empty() || self.vehicle_type.trim().is_empty() {
            return Err(bad_request("invalid or empty data"));
        }
        check_year(self.year, today)?;

        Ok(VehicleCreateDBRequest {
            plate_number: self.number,
            model: self.model,
            year: self.year,
            vehicle_type: self.vehicle_type,
            owner_driver_id: self.owner,
        })
    }
}

impl UpdateVehicleRequest {
    pub fn into_db(self, today: NaiveDate) -> Result<VehicleUpdateDBRequest, Error> {
        if is_blank(self.new_number.as_deref()) || is_blank(self.model.as_deref()) || is_blank(self.vehicle_type.as_deref()) {
            return Err(bad_request("invalid or empty data"));
        }
        if let Some(year) = self.year {
            check_year(year, today)?;
        }

        Ok(VehicleUpdateDBRequest {
            plate_number: self.new_number,
            model: self.model,
            year: self.year,
            vehicle_type: self.vehicle_type,
            owner_driver_id: self.owner,
        })
    }
}
