//! Test utilities shared by unit and integration tests.

use std::sync::Arc;

use axum_test::TestServer;
use sqlx::{PgPool, postgres::PgPoolOptions};
use uuid::Uuid;

use crate::{
    AppState,
    auth::{password, roles::Role, roles::RoleRegistry, session::SessionKeys},
    config::{AuthConfig, Config, DatabaseConfig, PasswordConfig, PoolSettings},
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
    types::UserId,
};

/// Password given to every user made by [`create_test_user`].
pub const TEST_PASSWORD: &str = "test-password";

pub async fn create_test_app(pool: PgPool) -> TestServer {
    let app = crate::Application::new_with_pool(create_test_config(), pool)
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig {
            // Tests hand in their own pool
            url: "postgres://localhost:5432/tisctl_test".to_string(),
            pool: PoolSettings {
                max_connections: 4,
                min_connections: 0,
                ..Default::default()
            },
        },
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        auth: AuthConfig {
            // Cheap hashing keeps login tests fast
            password: PasswordConfig {
                argon2_memory_kib: 128,
                argon2_iterations: 1,
                argon2_parallelism: 1,
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

/// State for tests that never reach the database. Needs a Tokio runtime for the lazy pool.
pub fn create_test_state() -> AppState {
    let config = create_test_config();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("Failed to create lazy pool");
    create_test_state_with_pool(config, pool)
}

pub fn create_test_state_with_pool(config: Config, pool: PgPool) -> AppState {
    let sessions = SessionKeys::from_config(&config).expect("Failed to build session keys");
    AppState::builder()
        .db(pool)
        .config(config)
        .sessions(Arc::new(sessions))
        .roles(Arc::new(RoleRegistry::new()))
        .build()
}

/// A `Cookie` header value carrying a fresh access token for the given identity.
pub fn session_cookie_for(state: &AppState, user_id: UserId, role: Role) -> String {
    let token = state.sessions.issue(user_id, role).expect("Failed to issue token");
    format!("{}={}", state.config.auth.session.cookie_name, token)
}

pub async fn create_test_user(pool: &PgPool, role: Role) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);
    let username = format!("testuser_{}", Uuid::new_v4().simple());
    let email = format!("{username}@example.com");

    let params = create_test_config().auth.password.argon2_params();
    let password_hash = password::hash_password(TEST_PASSWORD, params).expect("Failed to hash password");
    let role_id = RoleRegistry::new().name_to_id(role.as_str()).expect("Known role");

    let user_create = UserCreateDBRequest {
        username,
        email,
        password_hash,
        role_id,
    };

    users_repo.create(&user_create).await.expect("Failed to create test user")
}

/// Create a driver directly, returning its id.
pub async fn create_test_driver(pool: &PgPool, license_number: &str) -> i32 {
    sqlx::query_scalar(
        "INSERT INTO drivers (full_name, date_of_birth, license_number, license_issue_date, experience_years)
         VALUES ('Test Driver', '1990-01-01', $1, '2010-01-01', 5) RETURNING id",
    )
    .bind(license_number)
    .fetch_one(pool)
    .await
    .expect("Failed to create test driver")
}
