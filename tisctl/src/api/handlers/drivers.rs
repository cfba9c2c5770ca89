use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::info;

use crate::{
    AppState,
    api::models::{
        drivers::{AddDriverRequest, DriverCreatedResponse, DriverResponse, DriversResponse, UpdateDriverRequest},
        pagination::{ChunkPagination, MAX_SIZE},
    },
    auth::identity::RequestContext,
    db::{
        handlers::{Drivers, Repository, drivers::DriverFilter},
        unit_of_work::run_in_transaction,
    },
    errors::{Error, Result},
    types::Resource,
};

fn license_taken() -> Error {
    Error::Conflict {
        message: "driver with this license already exists".to_string(),
    }
}

#[tracing::instrument(skip_all, fields(license = %request.license_number))]
pub async fn add_driver(
    State(state): State<AppState>,
    context: RequestContext,
    Json(request): Json<AddDriverRequest>,
) -> Result<(StatusCode, Json<DriverCreatedResponse>)> {
    let db_request = request.into_db(Utc::now().date_naive())?;

    let driver = run_in_transaction(&state.db, &context, move |conn| {
        Box::pin(async move {
            let mut repo = Drivers::new(conn);
            if repo.get_by_license(&db_request.license_number).await?.is_some() {
                return Err(license_taken());
            }
            Ok(repo.create(&db_request).await?)
        })
    })
    .await?;

    info!(driver_id = driver.id, "Driver added");
    Ok((
        StatusCode::CREATED,
        Json(DriverCreatedResponse {
            message: "driver added".to_string(),
            driver_id: driver.id,
        }),
    ))
}

/// Update the driver identified by `license`; `new_license` renames it.
#[tracing::instrument(skip_all, fields(license = %request.license))]
pub async fn update_driver(
    State(state): State<AppState>,
    context: RequestContext,
    Json(request): Json<UpdateDriverRequest>,
) -> Result<Json<DriverResponse>> {
    if request.license.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "license field is required".to_string(),
        });
    }

    let today = Utc::now().date_naive();
    let driver = run_in_transaction(&state.db, &context, move |conn| {
        Box::pin(async move {
            let mut repo = Drivers::new(conn);
            let current = repo.get_by_license(&request.license).await?.ok_or_else(|| Error::NotFound {
                resource: Resource::Driver,
                id: request.license.clone(),
            })?;

            let id = current.id;
            let db_request = request.into_db(&current, today)?;
            if let Some(new_license) = &db_request.license_number
                && repo.get_by_license(new_license).await?.is_some_and(|other| other.id != id)
            {
                return Err(license_taken());
            }
            Ok(repo.update(id, &db_request).await?)
        })
    })
    .await?;

    info!(driver_id = driver.id, "Driver updated");
    Ok(Json(DriverResponse::from(driver)))
}

#[tracing::instrument(skip_all)]
pub async fn get_driver_by_license(State(state): State<AppState>, Path(license): Path<String>) -> Result<Json<DriverResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    match Drivers::new(&mut pool_conn).get_by_license(&license).await? {
        Some(driver) => Ok(Json(DriverResponse::from(driver))),
        None => Err(Error::NotFound {
            resource: Resource::Driver,
            id: license,
        }),
    }
}

/// Drivers whose name contains `name`, case-insensitively.
///
/// Without `chunk`/`size` the first [`MAX_SIZE`] matches are returned.
#[tracing::instrument(skip_all)]
pub async fn get_drivers_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(pagination): Query<ChunkPagination>,
) -> Result<Json<DriversResponse>> {
    let (skip, limit) = if pagination.is_unset() { (0, MAX_SIZE) } else { pagination.params()? };

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let drivers = Drivers::new(&mut pool_conn)
        .list(&DriverFilter::new(skip, limit).with_name(name))
        .await?;

    Ok(Json(DriversResponse {
        drivers: drivers.into_iter().map(DriverResponse::from).collect(),
    }))
}
