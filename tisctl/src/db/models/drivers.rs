//! Database models for drivers.

use crate::types::{DriverId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct DriverCreateDBRequest {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub license_number: String,
    pub license_issue_date: NaiveDate,
    pub experience_years: i32,
}

#[derive(Debug, Clone, Default)]
pub struct DriverUpdateDBRequest {
    pub full_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub license_number: Option<String>,
    pub license_issue_date: Option<NaiveDate>,
    pub experience_years: Option<i32>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DriverDBResponse {
    pub id: DriverId,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub total_accidents: i32,
    pub license_number: String,
    pub license_issue_date: NaiveDate,
    pub experience_years: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
}
