//! Access gate middleware.
//!
//! Each protected route group is wrapped in one of [`require_authenticated`] or
//! [`require_admin`]. The gate reads the access token from the session cookie, verifies it,
//! checks the role when the mode demands it, and publishes the [`Identity`] into the request
//! extensions. Rejected requests never reach the handler.
//!
//! Every rejection is a 401, including a valid credential with the wrong role.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::{trace, warn};

use crate::{
    AppState,
    auth::{identity::Identity, roles::Role, session::SessionKeys},
    errors::Error,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    /// Any valid credential
    Authenticated,
    /// A valid credential carrying the admin role
    AdminOnly,
}

/// Find the named cookie's value across all `Cookie` headers.
///
/// An empty value (as left behind by logout) counts as absent.
pub fn session_cookie<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Run the gate's checks against a request's headers.
pub fn authorize(headers: &HeaderMap, sessions: &SessionKeys, cookie_name: &str, mode: GateMode) -> Result<Identity, Error> {
    let token = session_cookie(headers, cookie_name).ok_or(Error::MissingCredential)?;
    let identity = sessions.verify(token)?;

    if mode == GateMode::AdminOnly && identity.role != Role::Admin {
        return Err(Error::InsufficientRole { role: identity.role });
    }

    Ok(identity)
}

async fn gate(state: &AppState, mode: GateMode, mut request: Request, next: Next) -> Result<Response, Error> {
    let cookie_name = &state.config.auth.session.cookie_name;

    match authorize(request.headers(), &state.sessions, cookie_name, mode) {
        Ok(identity) => {
            trace!(user_id = identity.user_id, role = %identity.role, ?mode, "Request authorized");
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        Err(e) => {
            warn!(
                method = %request.method(),
                path = request.uri().path(),
                ?mode,
                "Access denied: {e}"
            );
            Err(e)
        }
    }
}

/// Admit any request carrying a valid access token.
pub async fn require_authenticated(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, Error> {
    gate(&state, GateMode::Authenticated, request, next).await
}

/// Admit only requests whose access token carries the admin role.
pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, Error> {
    gate(&state, GateMode::AdminOnly, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::RequestContext;
    use crate::test_utils::{create_test_state, session_cookie_for};
    use axum::{Json, Router, http::HeaderValue, http::StatusCode, middleware::from_fn_with_state, routing::get};
    use axum_test::TestServer;
    use chrono::{TimeDelta, Utc};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn keys() -> SessionKeys {
        SessionKeys::new(b"gate-test-secret", Duration::from_secs(3600)).unwrap()
    }

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_session_cookie_parsing() {
        let headers = headers_with_cookie("theme=dark; access_token=abc.def.ghi; lang=en");
        assert_eq!(session_cookie(&headers, "access_token"), Some("abc.def.ghi"));
        assert_eq!(session_cookie(&headers, "missing"), None);

        let cleared = headers_with_cookie("access_token=");
        assert_eq!(session_cookie(&cleared, "access_token"), None);

        let mut split = HeaderMap::new();
        split.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        split.append(header::COOKIE, HeaderValue::from_static("access_token=xyz"));
        assert_eq!(session_cookie(&split, "access_token"), Some("xyz"));
    }

    #[test]
    fn test_authorize_missing_credential() {
        let keys = keys();
        let result = authorize(&HeaderMap::new(), &keys, "access_token", GateMode::Authenticated);
        assert!(matches!(result, Err(Error::MissingCredential)));
    }

    #[test]
    fn test_authorize_invalid_credential() {
        let keys = keys();
        let headers = headers_with_cookie("access_token=garbage");
        let result = authorize(&headers, &keys, "access_token", GateMode::Authenticated);
        assert!(matches!(result, Err(Error::InvalidCredential)));
    }

    #[test]
    fn test_authorize_modes() {
        let keys = keys();
        let inspector = keys.issue(3, Role::Inspector).unwrap();
        let headers = headers_with_cookie(&format!("access_token={inspector}"));

        let identity = authorize(&headers, &keys, "access_token", GateMode::Authenticated).unwrap();
        assert_eq!(identity.user_id, 3);

        let denied = authorize(&headers, &keys, "access_token", GateMode::AdminOnly);
        assert!(matches!(
            denied,
            Err(Error::InsufficientRole {
                role: Role::Inspector
            })
        ));

        let admin = keys.issue(1, Role::Admin).unwrap();
        let headers = headers_with_cookie(&format!("access_token={admin}"));
        let identity = authorize(&headers, &keys, "access_token", GateMode::AdminOnly).unwrap();
        assert_eq!(identity.role, Role::Admin);
    }

    /// Router with one admin-gated and one authenticated route that record invocations.
    fn gated_router(state: AppState, hits: Arc<AtomicUsize>) -> Router {
        let admin_hits = hits.clone();
        let admin = Router::new()
            .route(
                "/admin",
                get(move |context: RequestContext| async move {
                    admin_hits.fetch_add(1, Ordering::SeqCst);
                    Json(context.acting_user_id())
                }),
            )
            .route_layer(from_fn_with_state(state.clone(), require_admin));

        let user = Router::new()
            .route(
                "/me",
                get(move |identity: Identity| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(identity.user_id)
                }),
            )
            .route_layer(from_fn_with_state(state.clone(), require_authenticated));

        admin.merge(user).with_state(state)
    }

    #[tokio::test]
    async fn test_admin_gate_publishes_identity() {
        let state = create_test_state();
        let hits = Arc::new(AtomicUsize::new(0));
        let server = TestServer::new(gated_router(state.clone(), hits.clone())).unwrap();

        let response = server
            .get("/admin")
            .add_header(header::COOKIE, session_cookie_for(&state, 7, Role::Admin))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Option<i32>>(), Some(7));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_admin_gate_rejections_skip_handler() {
        let state = create_test_state();
        let hits = Arc::new(AtomicUsize::new(0));
        let server = TestServer::new(gated_router(state.clone(), hits.clone())).unwrap();

        // No credential
        let response = server.get("/admin").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<serde_json::Value>()["message"], "Authentication required");

        // Expired credential
        let expired = state
            .sessions
            .issue_at(7, Role::Admin, Utc::now() - TimeDelta::hours(2))
            .unwrap();
        let response = server
            .get("/admin")
            .add_header(header::COOKIE, format!("access_token={expired}"))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<serde_json::Value>()["message"], "Invalid or expired credential");

        // Valid credential, wrong role: still 401
        let response = server
            .get("/admin")
            .add_header(header::COOKIE, session_cookie_for(&state, 3, Role::Analyst))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_role_mismatch_is_indistinguishable_from_invalid_credential() {
        let state = create_test_state();
        let hits = Arc::new(AtomicUsize::new(0));
        let server = TestServer::new(gated_router(state.clone(), hits.clone())).unwrap();

        let invalid = server
            .get("/admin")
            .add_header(header::COOKIE, "access_token=garbage".to_string())
            .await;
        let mismatch = server
            .get("/admin")
            .add_header(header::COOKIE, session_cookie_for(&state, 3, Role::Analyst))
            .await;

        invalid.assert_status(StatusCode::UNAUTHORIZED);
        mismatch.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(invalid.json::<serde_json::Value>(), mismatch.json::<serde_json::Value>());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_authenticated_gate_admits_any_role() {
        let state = create_test_state();
        let hits = Arc::new(AtomicUsize::new(0));
        let server = TestServer::new(gated_router(state.clone(), hits.clone())).unwrap();

        for (user_id, role) in [(1, Role::Admin), (2, Role::Inspector), (3, Role::Analyst)] {
            let response = server
                .get("/me")
                .add_header(header::COOKIE, session_cookie_for(&state, user_id, role))
                .await;
            response.assert_status_ok();
            assert_eq!(response.json::<i32>(), user_id);
        }

        server.get("/me").await.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }
}
