//! # messenger: accounts, conferences and messages over HTTP
//!
//! `messenger` is a small chat backend. Users register and log in, create conferences (group
//! chats) together with their initial members, and post and read messages in the conferences
//! they belong to.
//!
//! ## Architecture
//!
//! The HTTP layer is built on [Axum](https://github.com/tokio-rs/axum). Handlers ([`api`]) are
//! thin: they extract the session user, call into the [`messenger::Messenger`] core and map its
//! errors onto status codes ([`errors`]). The core talks to storage only through the traits in
//! [`db::stores`], which have two implementations:
//!
//! - [`db::postgres::PostgresStore`]: PostgreSQL through sqlx, with migrations run on startup
//! - [`db::in_memory::InMemoryStore`]: process-local tables, used by tests and for local runs
//!
//! Sessions are signed JWTs in an HttpOnly cookie ([`auth`]).
//!
//! ### Routes
//!
//! | Method | Path                          | Auth    | Purpose                           |
//! |--------|-------------------------------|---------|-----------------------------------|
//! | POST   | `/signUp`                     | -       | Register and start a session      |
//! | POST   | `/login`                      | -       | Start a session                   |
//! | POST   | `/logout`                     | -       | Clear the session cookie          |
//! | GET    | `/messenger/users/{id}`       | session | Look up a user                    |
//! | GET    | `/messenger/conferences`      | session | Conferences of the session user   |
//! | POST   | `/messenger/conferences`      | session | Create a conference with members  |
//! | GET    | `/messenger/conferences/{id}` | member  | Messages of a conference          |
//! | POST   | `/messenger/conferences/{id}` | member  | Post a message                    |
//! | GET    | `/healthz`                    | -       | Liveness                          |
//! | GET    | `/docs`                       | -       | OpenAPI documentation             |
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use messenger::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = messenger::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     messenger::telemetry::init_telemetry(config.log_format)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Database Setup
//!
//! With an external database, migrations run automatically on startup. They can also be run by hand:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! messenger::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod messenger;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    auth::Authenticator,
    config::{CorsOrigin, DatabaseConfig},
    db::{
        in_memory::InMemoryStore,
        postgres::PostgresStore,
        stores::{ConferenceStore, MessageStore, UserStore},
    },
    messenger::Messenger,
    openapi::ApiDoc,
};
use axum::http::HeaderValue;
use axum::{
    Router, http,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{ConferenceId, MessageId, UserId};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .messenger(messenger)
///     .authenticator(authenticator)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub messenger: Messenger,
    pub authenticator: Authenticator,
}

impl AppState {
    /// Wire a messenger and an authenticator over a single store.
    pub fn with_store<S>(config: Config, store: S) -> Self
    where
        S: UserStore + ConferenceStore + MessageStore + 'static,
    {
        let messenger = Messenger::new(store, config.auth.password.argon2_params());
        let authenticator = Authenticator::new(messenger.users().clone());

        AppState::builder()
            .config(config)
            .messenger(messenger)
            .authenticator(authenticator)
            .build()
    }
}

/// Get the messenger database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Build the CORS layer, or `None` when no origins are configured.
fn create_cors_layer(config: &Config) -> anyhow::Result<Option<CorsLayer>> {
    let cors_config = &config.auth.security.cors;
    if cors_config.allowed_origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if cors_config.allowed_origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Browsers send origins without a trailing slash
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(cors_config.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(Some(cors))
}

/// Build the application router with all endpoints and middleware.
///
/// Layers, outermost first: tracing, CORS (when configured), request timeout.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        .route("/signUp", post(api::handlers::auth::register))
        .route("/login", post(api::handlers::auth::login))
        .route("/logout", post(api::handlers::auth::logout));

    let messenger_routes = Router::new()
        .route("/users/{id}", get(api::handlers::users::get_user))
        .route(
            "/conferences",
            get(api::handlers::conferences::list_conferences).post(api::handlers::conferences::create_conference),
        )
        .route(
            "/conferences/{id}",
            get(api::handlers::conferences::list_messages).post(api::handlers::conferences::post_message),
        );

    let cors_layer = create_cors_layer(&state.config)?;
    let request_timeout = state.config.request_timeout;

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(auth_routes)
        .nest("/messenger", messenger_routes)
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(TimeoutLayer::with_status_code(http::StatusCode::REQUEST_TIMEOUT, request_timeout));

    if let Some(cors_layer) = cors_layer {
        router = router.layer(cors_layer);
    }

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Open the configured store, running migrations for PostgreSQL.
async fn setup_store(config: &Config) -> anyhow::Result<(AppState, Option<PgPool>)> {
    match &config.database {
        DatabaseConfig::External { url, pool } => {
            info!("Using external PostgreSQL database");
            let store = PostgresStore::connect(url, pool).await?;
            migrator().run(store.pool()).await?;

            let pool = store.pool().clone();
            Ok((AppState::with_store(config.clone(), store), Some(pool)))
        }
        DatabaseConfig::InMemory => {
            info!("Using in-memory store; data will not survive a restart");
            Ok((AppState::with_store(config.clone(), InMemoryStore::new()), None))
        }
    }
}

/// A configured, ready-to-serve application.
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!(host = %config.host, port = config.port, "Starting messenger");

        let (app_state, pool) = setup_store(&config).await?;
        let router = build_router(app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Messenger listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        Ok(())
    }
}
