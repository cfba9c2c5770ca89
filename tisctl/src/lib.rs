//! # tisctl: Traffic Incident Service
//!
//! `tisctl` keeps the records a traffic inspectorate works with: the staff accounts that
//! operate the system, the drivers they register and the vehicles those drivers own. It
//! exposes a JSON-over-HTTP API and stores everything in PostgreSQL.
//!
//! ## Overview
//!
//! Every request other than login carries a signed access token in the `access_token`
//! cookie. The token names the user and their role (admin, inspector or analyst). Route
//! groups are wrapped in an access gate that checks the token, and optionally the admin
//! role, before the handler runs. All rejections are `401 Unauthorized`.
//!
//! Once admitted, mutating handlers run their repository calls in a unit of work: a
//! database transaction that has the acting user's id bound into the transaction-local
//! setting `app.current_user_id`. Triggers in the schema read that setting to stamp the
//! `created_by` and `updated_by` columns, so attribution happens in the database rather
//! than in each query.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses PostgreSQL (through [sqlx](https://github.com/launchbadge/sqlx)) for persistence.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) holds the request handlers and their JSON models for users,
//! drivers and vehicles.
//!
//! The **authentication layer** ([`auth`]) issues and verifies access tokens, maps roles to
//! their storage codes, hashes passwords and implements the access gate.
//!
//! The **database layer** ([`db`]) uses the repository pattern for data access and provides
//! [`run_in_transaction`](db::unit_of_work::run_in_transaction), the unit of work every
//! mutation goes through.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use tisctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = tisctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     tisctl::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations are embedded in the binary and run on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! tisctl::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{self, HeaderValue},
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
};
use bon::Builder;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};

pub use config::Config;

use crate::{
    api::handlers::{auth as auth_handlers, drivers, users, vehicles},
    auth::{
        gate::{require_admin, require_authenticated},
        password::{self, Argon2Params},
        roles::{Role, RoleRegistry},
        session::SessionKeys,
    },
    config::{AdminConfig, CorsOrigin},
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    types::UserId,
};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .sessions(Arc::new(sessions))
///     .roles(Arc::new(RoleRegistry::new()))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Signs and verifies access tokens
    pub sessions: Arc<SessionKeys>,
    pub roles: Arc<RoleRegistry>,
}

/// Get the tisctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// This function is idempotent: the account is looked up by email and created with the
/// admin role when missing. If it already exists its password is reset to the configured
/// one, so the configuration stays the way to recover admin access.
///
/// Returns the user ID of the created or existing admin user.
#[instrument(skip_all, fields(email = %admin.email))]
pub async fn create_initial_admin_user(admin: &AdminConfig, params: Argon2Params, db: &PgPool) -> anyhow::Result<UserId> {
    let password_hash = password::hash_password_blocking(admin.password.clone(), params).await?;

    // Use a transaction to ensure atomicity
    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing_user) = user_repo.get_user_by_email(&admin.email).await? {
        let update = UserUpdateDBRequest {
            password_hash: Some(password_hash),
            ..Default::default()
        };
        user_repo.update(existing_user.id, &update).await?;
        tx.commit().await?;
        debug!(user_id = existing_user.id, "Initial admin user already present");
        return Ok(existing_user.id);
    }

    let role_id = RoleRegistry::new().name_to_id(Role::Admin.as_str())?;
    let user_create = UserCreateDBRequest {
        username: admin.username.clone(),
        email: admin.email.clone(),
        password_hash,
        role_id,
    };

    let created_user = user_repo.create(&user_create).await?;
    tx.commit().await?;

    info!(user_id = created_user.id, "Created initial admin user");
    Ok(created_user.id)
}

/// Run migrations and seed the initial admin on an existing pool.
async fn prepare_database(config: &Config, pool: &PgPool) -> anyhow::Result<()> {
    migrator().run(pool).await?;

    create_initial_admin_user(&config.admin, config.auth.password.argon2_params(), pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {e}"))?;

    Ok(())
}

async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let settings = &config.database.pool;
    let optional = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(optional(settings.idle_timeout_secs))
        .max_lifetime(optional(settings.max_lifetime_secs))
        .connect(&config.database.url)
        .await?;

    prepare_database(config, &pool).await?;
    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allowed = &config.auth.security.cors.allowed_origins;

    // AllowOrigin::list rejects "*", so a wildcard anywhere means any origin
    let allow_origin = if allowed.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in allowed {
            if let CorsOrigin::Url(url) = origin {
                // Url::as_str keeps a trailing slash that browsers never send in Origin
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PATCH, http::Method::DELETE])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Abort requests that outlive `request_timeout` with `408 Request Timeout`.
fn create_timeout_layer(config: &Config) -> TimeoutLayer {
    TimeoutLayer::with_status_code(http::StatusCode::REQUEST_TIMEOUT, config.request_timeout)
}

/// Build the main application router with all endpoints and middleware.
///
/// Routes fall into three groups:
/// - public: login and the health check
/// - authenticated: logout, self-service user update, drivers and vehicles
/// - admin: user management
///
/// The gates are attached with `route_layer`, so unknown paths still answer 404 instead of 401.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let public = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/users/login", post(auth_handlers::login));

    let authenticated = Router::new()
        .route("/users/logout", post(auth_handlers::logout))
        .route("/users/update", patch(users::update_user))
        // Drivers
        .route("/drivers/add", post(drivers::add_driver))
        .route("/drivers/update", patch(drivers::update_driver))
        .route("/drivers/get_by_license/{license}", get(drivers::get_driver_by_license))
        .route("/drivers/get_by_name/{name}", get(drivers::get_drivers_by_name))
        // Vehicles
        .route("/vehicles/add", post(vehicles::add_vehicle))
        .route("/vehicles/update", patch(vehicles::update_vehicle))
        .route("/vehicles/get_by_number/{number}", get(vehicles::get_vehicle_by_number))
        .route("/vehicles/get_all", get(vehicles::list_vehicles))
        .route_layer(from_fn_with_state(state.clone(), require_authenticated));

    let admin = Router::new()
        .route("/users/add", post(users::add_user))
        .route("/users/delete/{id}", delete(users::delete_user))
        .route("/users/get_all", get(users::list_users))
        .route("/users/get_user/{name}", get(users::get_user_by_name))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let router = public.merge(authenticated).merge(admin).with_state(state.clone());

    let router = router.layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_request(DefaultOnRequest::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(create_cors_layer(&state.config)?)
            .layer(create_timeout_layer(&state.config)),
    );

    Ok(router)
}

fn build_state(config: &Config, pool: PgPool) -> anyhow::Result<AppState> {
    let sessions = SessionKeys::from_config(config)?;

    Ok(AppState::builder()
        .db(pool)
        .config(config.clone())
        .sessions(Arc::new(sessions))
        .roles(Arc::new(RoleRegistry::new()))
        .build())
}

pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting traffic incident service with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;
        Self::from_parts(config, pool)
    }

    /// Create an application on an existing pool. Migrations and admin seeding still run.
    pub async fn new_with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        prepare_database(&config, &pool).await?;
        Self::from_parts(config, pool)
    }

    fn from_parts(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        let app_state = build_state(&config, pool.clone())?;
        let router = build_router(&app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Traffic incident service listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{create_cors_layer, create_initial_admin_user, create_timeout_layer};
    use crate::{
        auth::{password, roles::Role},
        config::CorsOrigin,
        db::handlers::Users,
        test_utils::*,
    };
    use axum::http::{StatusCode, header};
    use chrono::{TimeDelta, Utc};
    use serde_json::json;
    use sqlx::PgPool;

    fn driver_body(license: &str) -> serde_json::Value {
        json!({
            "name": "Olga Sidorova",
            "date_birth": "1979-11-02",
            "license_number": license,
            "license_issue_date": "1999-05-20",
            "experience": 25,
        })
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_healthz(pool: PgPool) {
        let server = create_test_app(pool).await;
        let response = server.get("/healthz").await;
        response.assert_status_ok();
        response.assert_text("OK");
    }

    #[test]
    fn test_cors_layer_from_config() {
        let mut config = create_test_config();
        assert!(create_cors_layer(&config).is_ok());

        config.auth.security.cors.allowed_origins = vec![
            CorsOrigin::Url("https://inspectorate.example.com/".parse().unwrap()),
            CorsOrigin::Url("http://localhost:5173".parse().unwrap()),
        ];
        config.auth.security.cors.allow_credentials = true;
        assert!(create_cors_layer(&config).is_ok());
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let mut config = create_test_config();
        config.request_timeout = std::time::Duration::from_millis(20);

        let router = axum::Router::new()
            .route(
                "/slow",
                axum::routing::get(|| async {
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    "done"
                }),
            )
            .route("/fast", axum::routing::get(|| async { "done" }))
            .layer(create_timeout_layer(&config));
        let server = axum_test::TestServer::new(router).unwrap();

        server.get("/slow").await.assert_status(StatusCode::REQUEST_TIMEOUT);
        server.get("/fast").await.assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_route_is_not_found(pool: PgPool) {
        let server = create_test_app(pool).await;
        server.get("/nothing/here").await.assert_status(StatusCode::NOT_FOUND);
    }

    /// An admin credential for user 7 reaches the handler, and the write is attributed to 7.
    #[sqlx::test]
    #[test_log::test]
    async fn test_acting_identity_flows_into_writes(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let state = create_test_state();

        server
            .post("/drivers/add")
            .add_header(header::COOKIE, session_cookie_for(&state, 7, Role::Admin))
            .json(&driver_body("E2E-0001"))
            .await
            .assert_status(StatusCode::CREATED);

        let (created_by, updated_by): (Option<i32>, Option<i32>) =
            sqlx::query_as("SELECT created_by, updated_by FROM drivers WHERE license_number = 'E2E-0001'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(created_by, Some(7));
        assert_eq!(updated_by, Some(7));

        // A later update by someone else keeps the creator
        server
            .patch("/drivers/update")
            .add_header(header::COOKIE, session_cookie_for(&state, 9, Role::Inspector))
            .json(&json!({"license": "E2E-0001", "experience": 26}))
            .await
            .assert_status_ok();

        let (created_by, updated_by): (Option<i32>, Option<i32>) =
            sqlx::query_as("SELECT created_by, updated_by FROM drivers WHERE license_number = 'E2E-0001'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(created_by, Some(7));
        assert_eq!(updated_by, Some(9));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_expired_credential_never_runs_operation(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let state = create_test_state();
        let expired = state
            .sessions
            .issue_at(7, Role::Admin, Utc::now() - TimeDelta::minutes(61))
            .unwrap();

        let response = server
            .post("/drivers/add")
            .add_header(header::COOKIE, format!("access_token={expired}"))
            .json(&driver_body("E2E-0002"))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM drivers").fetch_one(&pool).await.unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_seeded_admin_can_log_in(pool: PgPool) {
        let server = create_test_app(pool).await;
        let config = create_test_config();

        let response = server
            .post("/users/login")
            .json(&json!({"email": config.admin.email, "password": config.admin.password}))
            .await;
        response.assert_status_ok();

        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().split(';').next().unwrap().to_string();
        server
            .get("/users/get_all?chunk=1&size=10")
            .add_header(header::COOKIE, cookie)
            .await
            .assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_initial_admin_user_is_idempotent(pool: PgPool) {
        let mut config = create_test_config();
        let params = config.auth.password.argon2_params();

        let first = create_initial_admin_user(&config.admin, params, &pool).await.unwrap();
        let second = create_initial_admin_user(&config.admin, params, &pool).await.unwrap();
        assert_eq!(first, second);

        // A changed password replaces the stored hash
        config.admin.password = "rotated-admin-password".to_string();
        let third = create_initial_admin_user(&config.admin, params, &pool).await.unwrap();
        assert_eq!(first, third);

        let mut conn = pool.acquire().await.unwrap();
        let admin = Users::new(&mut conn).get_user_by_email(&config.admin.email).await.unwrap().unwrap();
        assert_eq!(admin.role_id, 1);
        assert!(password::verify_password("rotated-admin-password", &admin.password_hash).unwrap());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(&pool).await.unwrap();
        assert_eq!(count, 1);
    }
}
