//! Database repository for vehicles.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::vehicles::{VehicleCreateDBRequest, VehicleDBResponse, VehicleUpdateDBRequest},
};
use crate::types::{DriverId, VehicleId};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing vehicles
#[derive(Debug, Clone, Default)]
pub struct VehicleFilter {
    pub owner_driver_id: Option<DriverId>,
    pub skip: i64,
    pub limit: i64,
}

impl VehicleFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            owner_driver_id: None,
            skip,
            limit,
        }
    }
}

pub struct Vehicles<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Vehicles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_plate_number(&mut self, plate_number: &str) -> Result<Option<VehicleDBResponse>> {
        let vehicle = sqlx::query_as::<_, VehicleDBResponse>("SELECT * FROM vehicles WHERE plate_number = $1")
            .bind(plate_number)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(vehicle)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Vehicles<'c> {
    type CreateRequest = VehicleCreateDBRequest;
    type UpdateRequest = VehicleUpdateDBRequest;
    type Response = VehicleDBResponse;
    type Id = VehicleId;
    type Filter = VehicleFilter;

    #[instrument(skip(self, request), fields(plate = %request.plate_number), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let vehicle = sqlx::query_as::<_, VehicleDBResponse>(
            r#"
            INSERT INTO vehicles (plate_number, model, year, vehicle_type, owner_driver_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&request.plate_number)
        .bind(&request.model)
        .bind(request.year)
        .bind(&request.vehicle_type)
        .bind(request.owner_driver_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(vehicle)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let vehicle = sqlx::query_as::<_, VehicleDBResponse>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(vehicle)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let vehicles = sqlx::query_as::<_, VehicleDBResponse>(
            r#"
            SELECT * FROM vehicles
            WHERE ($1::INTEGER IS NULL OR owner_driver_id = $1)
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.owner_driver_id)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(vehicles)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let vehicle = sqlx::query_as::<_, VehicleDBResponse>(
            r#"
            UPDATE vehicles SET
                plate_number = COALESCE($2, plate_number),
                model = COALESCE($3, model),
                year = COALESCE($4, year),
                vehicle_type = COALESCE($5, vehicle_type),
                owner_driver_id = COALESCE($6, owner_driver_id)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.plate_number)
        .bind(&request.model)
        .bind(request.year)
        .bind(&request.vehicle_type)
        .bind(request.owner_driver_id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(vehicle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    async fn create_driver(conn: &mut PgConnection, license: &str) -> DriverId {
        sqlx::query_scalar(
            "INSERT INTO drivers (full_name, date_of_birth, license_number, license_issue_date, experience_years)
             VALUES ('Owner', '1980-01-01', $1, '2000-01-01', 10) RETURNING id",
        )
        .bind(license)
        .fetch_one(conn)
        .await
        .unwrap()
    }

    fn create_request(plate: &str, owner_driver_id: Option<DriverId>) -> VehicleCreateDBRequest {
        VehicleCreateDBRequest {
            plate_number: plate.to_string(),
            model: "Lada Vesta".to_string(),
            year: 2020,
            vehicle_type: "sedan".to_string(),
            owner_driver_id,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_by_plate(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let owner = create_driver(&mut conn, "OWN-1").await;
        let mut repo = Vehicles::new(&mut conn);

        let created = repo.create(&create_request("A123BC77", Some(owner))).await.unwrap();
        assert_eq!(created.owner_driver_id, Some(owner));

        let fetched = repo.get_by_plate_number("A123BC77").await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert!(repo.get_by_plate_number("X000XX00").await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unowned_vehicle(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Vehicles::new(&mut conn);

        let created = repo.create(&create_request("B456CD99", None)).await.unwrap();
        assert_eq!(created.owner_driver_id, None);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_owner_is_foreign_key_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Vehicles::new(&mut conn);

        let err = repo.create(&create_request("C789EF50", Some(4242))).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_plate_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Vehicles::new(&mut conn);

        repo.create(&create_request("D000DD00", None)).await.unwrap();
        let err = repo.create(&create_request("D000DD00", None)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_by_owner_and_update(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let first = create_driver(&mut conn, "OWN-A").await;
        let second = create_driver(&mut conn, "OWN-B").await;
        let mut repo = Vehicles::new(&mut conn);

        let v1 = repo.create(&create_request("P1", Some(first))).await.unwrap();
        repo.create(&create_request("P2", Some(second))).await.unwrap();
        repo.create(&create_request("P3", None)).await.unwrap();

        let owned = repo
            .list(&VehicleFilter {
                owner_driver_id: Some(first),
                ..VehicleFilter::new(0, 10)
            })
            .await
            .unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].plate_number, "P1");

        assert_eq!(repo.list(&VehicleFilter::new(0, 10)).await.unwrap().len(), 3);

        let updated = repo
            .update(
                v1.id,
                &VehicleUpdateDBRequest {
                    owner_driver_id: Some(second),
                    year: Some(2021),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.owner_driver_id, Some(second));
        assert_eq!(updated.year, 2021);
        assert_eq!(updated.model, "Lada Vesta");
    }
}
