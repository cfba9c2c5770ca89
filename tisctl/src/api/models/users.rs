//! API request and response models for users and authentication.

use axum::{
    Json,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{auth::roles::RoleRegistry, db::models::users::UserDBResponse, errors::Error, types::UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddUserRequest {
    pub name: String,
    pub password: String,
    pub email: String,
    pub role: String,
}

/// Partial update of a user; absent fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub id: UserId,
    pub name: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A user as seen through the API. The password hash never leaves the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Role name, or `unknown` when the stored role id has no mapping
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn from_db(user: UserDBResponse, roles: &RoleRegistry) -> Self {
        Self {
            id: user.id,
            role: roles.id_to_name(user.role_id).to_string(),
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<UserResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreatedResponse {
    pub id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserUpdatedResponse {
    pub updated_id: UserId,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthMessage {
    pub message: String,
}

/// Successful login: the access token travels only in the `Set-Cookie` header.
#[derive(Debug)]
pub struct LoginResponse {
    pub body: AuthMessage,
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        ([(header::SET_COOKIE, self.cookie)], Json(self.body)).into_response()
    }
}

#[derive(Debug)]
pub struct LogoutResponse {
    pub body: AuthMessage,
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        ([(header::SET_COOKIE, self.cookie)], Json(self.body)).into_response()
    }
}

/// Email addresses only need to contain an `@`.
pub fn validate_email(email: &str) -> Result<(), Error> {
    if email.contains('@') {
        Ok(())
    } else {
        Err(Error::BadRequest {
            message: "Invalid email, @ not found".to_string(),
        })
    }
}
