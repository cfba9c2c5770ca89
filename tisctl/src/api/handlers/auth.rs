use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    AppState,
    api::models::users::{AuthMessage, LoginRequest, LoginResponse, LogoutResponse},
    auth::{identity::Identity, password},
    config::Config,
    db::handlers::Users,
    errors::Error,
    types::Resource,
};

/// Log in with email and password, receiving the access token as a cookie.
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    let user = user_repo
        .get_user_by_email(&request.email)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: Resource::User,
            id: request.email.clone(),
        })?;

    // Verify password on a blocking thread to avoid blocking async runtime
    let is_valid = password::verify_password_blocking(request.password, user.password_hash.clone()).await?;
    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Incorrect password".to_string()),
        });
    }

    let role = state.roles.role_for_id(user.role_id).ok_or_else(|| Error::InvalidRole {
        name: state.roles.id_to_name(user.role_id).to_string(),
    })?;

    let issued_at = Utc::now();
    let token = state.sessions.issue_at(user.id, role, issued_at)?;
    let cookie = create_session_cookie(&token, issued_at, &state);

    info!(user_id = user.id, %role, "User logged in");

    Ok(LoginResponse {
        body: AuthMessage {
            message: "Login successful".to_string(),
        },
        cookie,
    })
}

/// Log out by clearing the session cookie.
///
/// Tokens are not revoked server-side: a copy of the token stays valid until it expires.
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, identity: Identity) -> Result<LogoutResponse, Error> {
    info!(user_id = identity.user_id, "User logged out");

    Ok(LogoutResponse {
        body: AuthMessage {
            message: "logged out".to_string(),
        },
        cookie: clear_session_cookie(&state.config),
    })
}

/// Format a timestamp as an HTTP date (RFC 7231 IMF-fixdate).
fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn secure_attribute(config: &Config) -> &'static str {
    if config.auth.session.cookie_secure { "; Secure" } else { "" }
}

/// Helper function to create a session cookie
fn create_session_cookie(token: &str, issued_at: DateTime<Utc>, state: &AppState) -> String {
    let validity = state.sessions.validity();

    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Expires={}; Max-Age={}{}",
        state.config.auth.session.cookie_name,
        token,
        http_date(issued_at + validity),
        validity.num_seconds(),
        secure_attribute(&state.config)
    )
}

/// An already-expired, empty session cookie
fn clear_session_cookie(config: &Config) -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Expires={}{}",
        config.auth.session.cookie_name,
        http_date(DateTime::<Utc>::UNIX_EPOCH),
        secure_attribute(config)
    )
}
