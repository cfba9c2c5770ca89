use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;

use crate::{
    AppState,
    api::models::{
        pagination::ChunkPagination,
        users::{AddUserRequest, UpdateUserRequest, UserCreatedResponse, UserResponse, UserUpdatedResponse, UsersResponse, validate_email},
    },
    auth::{
        identity::{Identity, RequestContext},
        password,
    },
    db::{
        handlers::{Repository, Users, users::UserFilter},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
        unit_of_work::run_in_transaction,
    },
    errors::{Error, Result},
    types::{Resource, UserId},
};

fn email_in_use() -> Error {
    Error::BadRequest {
        message: "Email is already used".to_string(),
    }
}

/// Create a user (admin only).
#[tracing::instrument(skip_all, fields(email = %request.email))]
pub async fn add_user(
    State(state): State<AppState>,
    context: RequestContext,
    Json(request): Json<AddUserRequest>,
) -> Result<(StatusCode, Json<UserCreatedResponse>)> {
    validate_email(&request.email)?;
    let role_id = state.roles.name_to_id(&request.role)?;
    let password_hash = password::hash_password_blocking(request.password, state.config.auth.password.argon2_params()).await?;

    let db_request = UserCreateDBRequest {
        username: request.name,
        email: request.email,
        password_hash,
        role_id,
    };

    let user = run_in_transaction(&state.db, &context, move |conn| {
        Box::pin(async move {
            let mut repo = Users::new(conn);
            if repo.get_user_by_email(&db_request.email).await?.is_some() {
                return Err(email_in_use());
            }
            Ok(repo.create(&db_request).await?)
        })
    })
    .await?;

    info!(user_id = user.id, "User created");
    Ok((StatusCode::CREATED, Json(UserCreatedResponse { id: user.id })))
}

/// Update a user. Admins may update anyone; other users only themselves, and never their
/// own role.
#[tracing::instrument(skip_all, fields(target_id = request.id))]
pub async fn update_user(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserUpdatedResponse>> {
    if !identity.is_admin() && (identity.user_id != request.id || request.role.is_some()) {
        return Err(Error::Forbidden {
            message: "Forbidden to update user".to_string(),
        });
    }

    if let Some(email) = &request.email {
        validate_email(email)?;
    }
    let role_id = request.role.as_deref().map(|name| state.roles.name_to_id(name)).transpose()?;
    let password_hash = match request.password {
        Some(password) => Some(password::hash_password_blocking(password, state.config.auth.password.argon2_params()).await?),
        None => None,
    };

    let id = request.id;
    let db_request = UserUpdateDBRequest {
        username: request.name,
        email: request.email,
        password_hash,
        role_id,
    };

    let context = RequestContext::from(identity);
    run_in_transaction(&state.db, &context, move |conn| {
        Box::pin(async move {
            let mut repo = Users::new(conn);
            if repo.get_by_id(id).await?.is_none() {
                return Err(Error::NotFound {
                    resource: Resource::User,
                    id: id.to_string(),
                });
            }
            if let Some(email) = &db_request.email
                && repo.get_user_by_email(email).await?.is_some_and(|other| other.id != id)
            {
                return Err(email_in_use());
            }
            Ok(repo.update(id, &db_request).await?)
        })
    })
    .await?;

    info!(user_id = id, "User updated");
    Ok(Json(UserUpdatedResponse {
        updated_id: id,
        status: "ok".to_string(),
    }))
}

/// Delete a user (admin only).
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn delete_user(State(state): State<AppState>, context: RequestContext, Path(id): Path<UserId>) -> Result<StatusCode> {
    let deleted = run_in_transaction(&state.db, &context, move |conn| {
        Box::pin(async move { Ok(Users::new(conn).delete(id).await?) })
    })
    .await?;

    if !deleted {
        return Err(Error::NotFound {
            resource: Resource::User,
            id: id.to_string(),
        });
    }

    info!(user_id = id, "User deleted");
    Ok(StatusCode::OK)
}

/// List users one chunk at a time (admin only).
#[tracing::instrument(skip_all)]
pub async fn list_users(State(state): State<AppState>, Query(pagination): Query<ChunkPagination>) -> Result<Json<UsersResponse>> {
    let (skip, limit) = pagination.params()?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let users = Users::new(&mut pool_conn).list(&UserFilter::new(skip, limit)).await?;

    Ok(Json(UsersResponse {
        users: users.into_iter().map(|user| UserResponse::from_db(user, &state.roles)).collect(),
    }))
}

/// Look up a user by username (admin only).
#[tracing::instrument(skip_all)]
pub async fn get_user_by_name(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<UserResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    match Users::new(&mut pool_conn).get_user_by_username(&name).await? {
        Some(user) => Ok(Json(UserResponse::from_db(user, &state.roles))),
        None => Err(Error::NotFound {
            resource: Resource::User,
            id: name,
        }),
    }
}
