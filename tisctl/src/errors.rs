use crate::auth::roles::Role;
use crate::db::errors::DbError;
use crate::types::Resource;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// The request carried no credential cookie
    #[error("Missing credential")]
    MissingCredential,

    /// The credential failed signature, structure or expiry checks
    #[error("Invalid credential")]
    InvalidCredential,

    /// Login rejected (wrong password)
    #[error("Authentication failed")]
    Unauthenticated { message: Option<String> },

    /// The credential is valid but its role does not satisfy the route's gate.
    /// Reported as 401, like the other credential failures.
    #[error("Role {role} may not access this resource")]
    InsufficientRole { role: Role },

    /// A role name not known to the role registry
    #[error("Invalid role: {name}")]
    InvalidRole { name: String },

    /// Commit of a unit of work failed; none of its writes may be assumed applied
    #[error("Failed to commit transaction: {source}")]
    CommitFailed { source: sqlx::Error },

    /// Authenticated caller attempting an operation on someone else's record
    #[error("{message}")]
    Forbidden { message: String },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} {id} not found")]
    NotFound { resource: Resource, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// Conflict with an existing record
    #[error("Conflict: {message}")]
    Conflict { message: String },
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingCredential | Error::InvalidCredential | Error::Unauthenticated { .. } | Error::InsufficientRole { .. } => {
                StatusCode::UNAUTHORIZED
            }
            Error::InvalidRole { .. } => StatusCode::BAD_REQUEST,
            Error::CommitFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Conflict { .. } => StatusCode::CONFLICT,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::MissingCredential => "Authentication required".to_string(),
            // A role mismatch reads the same as a bad credential
            Error::InvalidCredential | Error::InsufficientRole { .. } => "Invalid or expired credential".to_string(),
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication failed".to_string()),
            Error::InvalidRole { name } => format!("Invalid role: {name}"),
            Error::CommitFailed { .. } => "Failed to save changes".to_string(),
            Error::Forbidden { message } => message.clone(),
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} {id} not found"),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation {
                    table, conflicting_value, ..
                } => unique_violation_message(table.as_deref(), conflicting_value.as_deref()),
                DbError::ForeignKeyViolation { table, .. } => match table.as_deref() {
                    Some("vehicles") => "Owner driver does not exist".to_string(),
                    _ => "Invalid reference to related resource".to_string(),
                },
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
            Error::Conflict { message } => message.clone(),
        }
    }
}

/// Friendly messages for the unique constraints the schema defines
fn unique_violation_message(table: Option<&str>, value: Option<&str>) -> String {
    match (table, value) {
        (Some("users"), Some(v)) => format!("An account with email {v} already exists"),
        (Some("users"), None) => "An account with this email address already exists".to_string(),
        (Some("drivers"), Some(v)) => format!("A driver with license number {v} already exists"),
        (Some("drivers"), None) => "A driver with this license number already exists".to_string(),
        (Some("vehicles"), Some(v)) => format!("A vehicle with plate number {v} already exists"),
        (Some("vehicles"), None) => "A vehicle with this plate number already exists".to_string(),
        _ => "Resource already exists".to_string(),
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) | Error::CommitFailed { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::MissingCredential
            | Error::InvalidCredential
            | Error::Unauthenticated { .. }
            | Error::InsufficientRole { .. }
            | Error::Forbidden { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } | Error::InvalidRole { .. } => {
                tracing::debug!("Client error: {}", self);
            }
            Error::Conflict { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
        }

        let status = self.status_code();
        let body = json!({ "message": self.user_message() });
        (status, Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
