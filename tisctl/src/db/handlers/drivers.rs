//! Database repository for drivers.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::drivers::{DriverCreateDBRequest, DriverDBResponse, DriverUpdateDBRequest},
};
use crate::types::DriverId;
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing drivers
#[derive(Debug, Clone, Default)]
pub struct DriverFilter {
    /// Case-insensitive substring match on the full name
    pub name_contains: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

impl DriverFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            name_contains: None,
            skip,
            limit,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name_contains = Some(name.into());
        self
    }
}

/// Escape `LIKE` metacharacters so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub struct Drivers<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Drivers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_license(&mut self, license_number: &str) -> Result<Option<DriverDBResponse>> {
        let driver = sqlx::query_as::<_, DriverDBResponse>("SELECT * FROM drivers WHERE license_number = $1")
            .bind(license_number)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(driver)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Drivers<'c> {
    type CreateRequest = DriverCreateDBRequest;
    type UpdateRequest = DriverUpdateDBRequest;
    type Response = DriverDBResponse;
    type Id = DriverId;
    type Filter = DriverFilter;

    #[instrument(skip(self, request), fields(license = %request.license_number), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let driver = sqlx::query_as::<_, DriverDBResponse>(
            r#"
            INSERT INTO drivers (full_name, date_of_birth, license_number, license_issue_date, experience_years)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&request.full_name)
        .bind(request.date_of_birth)
        .bind(&request.license_number)
        .bind(request.license_issue_date)
        .bind(request.experience_years)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(driver)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let driver = sqlx::query_as::<_, DriverDBResponse>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(driver)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let pattern = filter.name_contains.as_deref().map(|name| format!("%{}%", escape_like(name)));

        let drivers = sqlx::query_as::<_, DriverDBResponse>(
            r#"
            SELECT * FROM drivers
            WHERE ($1::TEXT IS NULL OR full_name ILIKE $1)
            ORDER BY full_name, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(drivers)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let driver = sqlx::query_as::<_, DriverDBResponse>(
            r#"
            UPDATE drivers SET
                full_name = COALESCE($2, full_name),
                date_of_birth = COALESCE($3, date_of_birth),
                license_number = COALESCE($4, license_number),
                license_issue_date = COALESCE($5, license_issue_date),
                experience_years = COALESCE($6, experience_years)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.full_name)
        .bind(request.date_of_birth)
        .bind(&request.license_number)
        .bind(request.license_issue_date)
        .bind(request.experience_years)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(driver)
    }
}
