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
        pagination::ChunkPagination,
        vehicles::{AddVehicleRequest, UpdateVehicleRequest, VehicleCreatedResponse, VehicleListQuery, VehicleResponse, VehiclesResponse},
    },
    auth::identity::RequestContext,
    db::{
        handlers::{Repository, Vehicles, vehicles::VehicleFilter},
        unit_of_work::run_in_transaction,
    },
    errors::{Error, Result},
    types::Resource,
};

fn plate_taken() -> Error {
    Error::Conflict {
        message: "vehicle with this number already exists".to_string(),
    }
}

#[tracing::instrument(skip_all, fields(number = %request.number))]
pub async fn add_vehicle(
    State(state): State<AppState>,
    context: RequestContext,
    Json(request): Json<AddVehicleRequest>,
) -> Result<(StatusCode, Json<VehicleCreatedResponse>)> {
    let db_request = request.into_db(Utc::now().date_naive())?;

    let vehicle = run_in_transaction(&state.db, &context, move |conn| {
        Box::pin(async move {
            let mut repo = Vehicles::new(conn);
            if repo.get_by_plate_number(&db_request.plate_number).await?.is_some() {
                return Err(plate_taken());
            }
            Ok(repo.create(&db_request).await?)
        })
    })
    .await?;

    info!(vehicle_id = vehicle.id, "Vehicle added");
    Ok((
        StatusCode::CREATED,
        Json(VehicleCreatedResponse {
            message: "vehicle added".to_string(),
            vehicle_id: vehicle.id,
        }),
    ))
}

/// Update the vehicle registered as `number`; `new_number` re-plates it.
#[tracing::instrument(skip_all, fields(number = %request.number))]
pub async fn update_vehicle(
    State(state): State<AppState>,
    context: RequestContext,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Json<VehicleResponse>> {
    if request.number.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "number field is required".to_string(),
        });
    }

    let number = request.number.clone();
    let db_request = request.into_db(Utc::now().date_naive())?;

    let vehicle = run_in_transaction(&state.db, &context, move |conn| {
        Box::pin(async move {
            let mut repo = Vehicles::new(conn);
            let current = repo.get_by_plate_number(&number).await?.ok_or_else(|| Error::NotFound {
                resource: Resource::Vehicle,
                id: number.clone(),
            })?;

            if let Some(new_number) = &db_request.plate_number
                && repo.get_by_plate_number(new_number).await?.is_some_and(|other| other.id != current.id)
            {
                return Err(plate_taken());
            }
            Ok(repo.update(current.id, &db_request).await?)
        })
    })
    .await?;

    info!(vehicle_id = vehicle.id, "Vehicle updated");
    Ok(Json(VehicleResponse::from(vehicle)))
}

#[tracing::instrument(skip_all)]
pub async fn get_vehicle_by_number(State(state): State<AppState>, Path(number): Path<String>) -> Result<Json<VehicleResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    match Vehicles::new(&mut pool_conn).get_by_plate_number(&number).await? {
        Some(vehicle) => Ok(Json(VehicleResponse::from(vehicle))),
        None => Err(Error::NotFound {
            resource: Resource::Vehicle,
            id: number,
        }),
    }
}

#[tracing::instrument(skip_all)]
pub async fn list_vehicles(
    State(state): State<AppState>,
    Query(pagination): Query<ChunkPagination>,
    Query(query): Query<VehicleListQuery>,
) -> Result<Json<VehiclesResponse>> {
    let (skip, limit) = pagination.params()?;
    let filter = VehicleFilter {
        owner_driver_id: query.owner_id()?,
        ..VehicleFilter::new(skip, limit)
    };

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let vehicles = Vehicles::new(&mut pool_conn).list(&filter).await?;

    Ok(Json(VehiclesResponse {
        vehicles: vehicles.into_iter().map(VehicleResponse::from).collect(),
    }))
}
