//! API request and response models for drivers.
//!
//! Dates cross the API as `YYYY-MM-DD` strings and are parsed and checked here, before any
//! database work starts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::drivers::{DriverCreateDBRequest, DriverDBResponse, DriverUpdateDBRequest},
    errors::Error,
    types::DriverId,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDriverRequest {
    pub name: String,
    pub date_birth: String,
    pub license_number: String,
    pub license_issue_date: String,
    pub experience: i32,
}

/// Partial update of the driver holding `license`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDriverRequest {
    pub license: String,
    pub name: Option<String>,
    pub date_birth: Option<String>,
    pub new_license: Option<String>,
    pub license_issue_date: Option<String>,
    pub experience: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverResponse {
    pub id: DriverId,
    pub name: String,
    pub date_birth: NaiveDate,
    pub total_accidents: i32,
    pub license_number: String,
    pub license_issue_date: NaiveDate,
    pub experience: i32,
    pub created_at: DateTime<Utc>,
}

impl From<DriverDBResponse> for DriverResponse {
    fn from(driver: DriverDBResponse) -> Self {
        Self {
            id: driver.id,
            name: driver.full_name,
            date_birth: driver.date_of_birth,
            total_accidents: driver.total_accidents,
            license_number: driver.license_number,
            license_issue_date: driver.license_issue_date,
            experience: driver.experience_years,
            created_at: driver.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriversResponse {
    pub drivers: Vec<DriverResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverCreatedResponse {
    pub message: String,
    pub driver_id: DriverId,
}

fn bad_request(message: &str) -> Error {
    Error::BadRequest {
        message: message.to_string(),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| bad_request("incorrect date format, use YYYY-MM-DD"))
}

fn check_dates(date_of_birth: NaiveDate, license_issue_date: NaiveDate, today: NaiveDate) -> Result<(), Error> {
    if date_of_birth > today || license_issue_date > today {
        return Err(bad_request("dates must not be in the future"));
    }
    if license_issue_date < date_of_birth {
        return Err(bad_request("license cannot be issued before date of birth"));
    }
    Ok(())
}

fn check_experience(experience: i32) -> Result<(), Error> {
    if experience < 0 {
        return Err(bad_request("experience must be >= 0"));
    }
    Ok(())
}

impl AddDriverRequest {
    /// Validate the request against `today` and convert it into a database insert.
    pub fn into_db(self, today: NaiveDate) -> Result<DriverCreateDBRequest, Error> {
        if self.name.trim().is_empty()
            || self.date_birth.is_empty()
            || self.license_number.trim().is_empty()
            || self.license_issue_date.is_empty()
        {
            return Err(bad_request("invalid or empty data"));
        }

        let date_of_birth = parse_date(&self.date_birth)?;
        let license_issue_date = parse_date(&self.license_issue_date)?;
        check_dates(date_of_birth, license_issue_date, today)?;
        check_experience(self.experience)?;

        Ok(DriverCreateDBRequest {
            full_name: self.name,
            date_of_birth,
            license_number: self.license_number,
            license_issue_date,
            experience_years: self.experience,
        })
    }
}

impl UpdateDriverRequest {
    /// Validate the update as applied to `current` and convert it into a database update.
    pub fn into_db(self, current: &DriverDBResponse, today: NaiveDate) -> Result<DriverUpdateDBRequest, Error> {
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty())
            || self.new_license.as_deref().is_some_and(|license| license.trim().is_empty())
        {
            return Err(bad_request("invalid or empty data"));
        }

        let date_of_birth = self.date_birth.as_deref().map(parse_date).transpose()?;
        let license_issue_date = self.license_issue_date.as_deref().map(parse_date).transpose()?;
        check_dates(
            date_of_birth.unwrap_or(current.date_of_birth),
            license_issue_date.unwrap_or(current.license_issue_date),
            today,
        )?;
        if let Some(experience) = self.experience {
            check_experience(experience)?;
        }

        Ok(DriverUpdateDBRequest {
            full_name: self.name,
            date_of_birth,
            license_number: self.new_license,
            license_issue_date,
            experience_years: self.experience,
        })
    }
}
