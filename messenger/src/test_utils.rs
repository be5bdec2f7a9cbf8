//! Test utilities: configuration, state and server constructors over the in-memory store.

use axum_test::{TestResponse, TestServer};
use serde_json::json;

use crate::{
    AppState,
    api::models::{auth::AuthResponse, users::UserResponse},
    auth::password::Argon2Params,
    build_router,
    config::{Config, DatabaseConfig},
    db::in_memory::InMemoryStore,
};

/// Password used by [`sign_up`].
pub const TEST_PASSWORD: &str = "password123";

/// The cheapest Argon2 parameters the library accepts, so tests don't spend seconds hashing.
pub fn fast_password_params() -> Argon2Params {
    Argon2Params {
        memory_kib: 128,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn create_test_config() -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig::InMemory,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        ..Default::default()
    };

    config.auth.session.cookie_secure = false;

    let params = fast_password_params();
    config.auth.password.argon2_memory_kib = params.memory_kib;
    config.auth.password.argon2_iterations = params.iterations;
    config.auth.password.argon2_parallelism = params.parallelism;

    config
}

pub fn create_test_state() -> AppState {
    AppState::with_store(create_test_config(), InMemoryStore::new())
}

pub fn create_test_server() -> TestServer {
    let router = build_router(create_test_state()).expect("Failed to build router");
    TestServer::new(router.into_make_service()).expect("Failed to create test server")
}

/// The `name=value` pair of the session cookie set by `response`, ready to send back as a `Cookie` header.
pub fn session_cookie(response: &TestResponse) -> String {
    let set_cookie = response.header("set-cookie");
    let set_cookie = set_cookie.to_str().expect("Set-Cookie is not valid ASCII");
    set_cookie.split(';').next().unwrap_or_default().trim().to_string()
}

/// Register `username` (email `{username}@example.com`, password [`TEST_PASSWORD`]) and return the
/// created user together with its session cookie.
pub async fn sign_up(server: &TestServer, username: &str) -> (UserResponse, String) {
    let response = server
        .post("/signUp")
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": TEST_PASSWORD,
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let cookie = session_cookie(&response);
    let body: AuthResponse = response.json();
    (body.user, cookie)
}
