//! # eventreg: Event Registration Service
//!
//! `eventreg` is a small web backend for running event signups. Visitors can
//! browse published events, create an account, and register to (or withdraw
//! from) an event with an optional comment. Administrators manage the event
//! catalogue and can list everyone registered to an event.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the
//! HTTP layer and uses PostgreSQL for persistence.
//!
//! The **API layer** ([`api`]) exposes the public browsing and signup routes,
//! the authenticated profile and registration routes under `/users` and
//! `/events`, and the admin event management surface under `/admin`.
//!
//! The **authentication layer** ([`auth`]) issues HS256 JWTs on login and
//! accepts them either as a `Bearer` token or as an HttpOnly session cookie.
//! Both are resolved once per request into an
//! [`Authentication`](auth::current_user::Authentication) value; handlers pick
//! the guard they need.
//!
//! The **database layer** ([`db`]) uses the repository pattern: each entity has
//! a repository owning its queries, and handlers compose them inside
//! transactions where atomicity matters (deleting an event removes its
//! registrations in the same transaction).
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use eventreg::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = eventreg::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     eventreg::telemetry::init_telemetry()?;
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
//! Migrations run automatically on startup, and the initial admin user
//! (`admin_username`/`admin_password` from the configuration) is created if it
//! does not exist yet.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod images;
pub mod openapi;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    auth::password,
    db::handlers::{Repository, Users},
    db::models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    openapi::ApiDoc,
};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::{
    http,
    routing::{get, post, put},
    Router,
};
use bon::Builder;
pub use config::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{EventId, RegistrationId, UserId};

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the eventreg database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: creates the admin user on first startup, or updates the
/// password if the user already exists and a password is configured.
///
/// Returns the user ID of the created or existing admin user.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(username: &str, password: Option<&str>, db: &PgPool) -> anyhow::Result<UserId> {
    let password_hash = match password {
        Some(pwd) => password::hash_string(pwd).map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?,
        None => anyhow::bail!("admin_password is required to create the initial admin user"),
    };

    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing_user) = user_repo
        .get_by_username(username)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to check existing admin user: {e}"))?
    {
        user_repo
            .update(
                existing_user.id,
                &UserUpdateDBRequest {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| anyhow::anyhow!("Failed to update admin password: {e}"))?;
        tx.commit().await?;
        return Ok(existing_user.id);
    }

    let created_user = user_repo
        .create(&UserCreateDBRequest {
            name: username.to_string(),
            username: username.to_string(),
            password_hash,
            is_admin: true,
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create admin user: {e}"))?;

    tx.commit().await?;
    info!("Created initial admin user {username}");
    Ok(created_user.id)
}

/// Create the CORS layer from configuration.
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        origins.push(origin.parse::<HeaderValue>()?);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// Constructs the complete Axum router with:
/// - Public routes (index, health, event browsing, signup, login)
/// - Authenticated routes (registrations, profile)
/// - Admin routes (event management, registrant listings)
/// - OpenAPI documentation at `/docs`
/// - CORS and tracing middleware, JSON 404 fallback
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    // The profile picture upload gets its own body limit
    let upload_router = Router::new()
        .route("/users/{id}/profile-picture", put(api::handlers::users::upload_profile_picture))
        .layer(DefaultBodyLimit::max(state.config.uploads.max_file_size));

    let router = Router::new()
        .route("/", get(api::handlers::index::index))
        .route("/healthz", get(|| async { "OK" }))
        // Accounts and sessions
        .route("/signup", post(api::handlers::auth::signup))
        .route("/login", post(api::handlers::auth::login))
        .route("/logout", get(api::handlers::auth::logout))
        // Public event browsing; registration on the same path
        .route("/events", get(api::handlers::events::list_events))
        .route(
            "/events/{slug}",
            get(api::handlers::events::get_event)
                .post(api::handlers::registrations::register)
                .delete(api::handlers::registrations::unregister),
        )
        // Profile
        .route(
            "/users/me",
            get(api::handlers::users::me).patch(api::handlers::users::update_me),
        )
        .route("/users/me/events", get(api::handlers::registrations::my_events))
        .merge(upload_router)
        // Admin event management
        .route("/admin", get(api::handlers::events::admin_list_events))
        .route(
            "/admin/{slug}",
            get(api::handlers::events::admin_get_event)
                .post(api::handlers::events::create_event)
                .patch(api::handlers::events::update_event),
        )
        .route("/admin/{slug}/register", get(api::handlers::registrations::list_registrants))
        .route(
            "/admin/delete/{slug}",
            axum::routing::delete(api::handlers::events::delete_event),
        )
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .fallback(|| async {
            (
                http::StatusCode::NOT_FOUND,
                axum::Json(serde_json::json!({ "error": "not found" })),
            )
        })
        .with_state(state.clone());

    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects to the database, runs
///    migrations and seeds the initial admin user
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create a new application instance against an existing pool.
    ///
    /// Used by tests, which bring their own database.
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting eventreg with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => pool,
            None => {
                let settings = &config.database.pool;
                PgPoolOptions::new()
                    .max_connections(settings.max_connections)
                    .min_connections(settings.min_connections)
                    .acquire_timeout(std::time::Duration::from_secs(settings.acquire_timeout_secs))
                    .connect(&config.database.url)
                    .await?
            }
        };

        migrator().run(&pool).await?;

        if config.admin_password.is_some() {
            create_initial_admin_user(&config.admin_username, config.admin_password.as_deref(), &pool).await?;
        } else {
            tracing::warn!("admin_password not configured, skipping initial admin user creation");
        }

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(state)?;

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
        info!("eventreg listening on http://{}", bind_addr);

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
    use super::*;
    use crate::api::models::auth::TokenResponse;
    use crate::api::models::events::EventResponse;
    use crate::api::models::users::UserResponse;
    use crate::test_utils::create_test_config;
    use axum::http::StatusCode;
    use sqlx::PgPool;

    async fn test_application(pool: PgPool) -> axum_test::TestServer {
        let mut config = create_test_config();
        config.admin_password = Some("admin-startup-password".to_string());

        Application::new_with_pool(config, Some(pool))
            .await
            .expect("application should start")
            .into_test_server()
    }

    #[sqlx::test]
    async fn test_healthz(pool: PgPool) {
        let server = test_application(pool).await;

        let response = server.get("/healthz").await;
        response.assert_status_ok();
        response.assert_text("OK");
    }

    #[sqlx::test]
    async fn test_index_lists_routes(pool: PgPool) {
        let server = test_application(pool).await;

        let response = server.get("/").await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "eventreg");
        assert!(body["routes"]["signup"].is_string());
    }

    #[sqlx::test]
    async fn test_unknown_route_is_json_404(pool: PgPool) {
        let server = test_application(pool).await;

        let response = server.get("/no/such/route").await;
        response.assert_status(StatusCode::NOT_FOUND);

        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "not found");
    }

    #[sqlx::test]
    async fn test_admin_seeding_is_idempotent(pool: PgPool) {
        let first = create_initial_admin_user("admin", Some("first-password-1"), &pool).await.unwrap();
        let second = create_initial_admin_user("admin", Some("second-password-2"), &pool).await.unwrap();
        assert_eq!(first, second);

        // The latest password wins
        let mut conn = pool.acquire().await.unwrap();
        let admin = Users::new(&mut conn).get_by_username("admin").await.unwrap().unwrap();
        assert!(admin.is_admin);
        assert!(password::verify_string("second-password-2", &admin.password_hash).unwrap());
        assert!(!password::verify_string("first-password-1", &admin.password_hash).unwrap());
    }

    /// Full journey: signup, login, browse, register, withdraw.
    #[sqlx::test]
    #[test_log::test]
    async fn test_signup_login_register_flow(pool: PgPool) {
        let server = test_application(pool).await;

        // Admin creates an event
        let admin_login = server
            .post("/login")
            .json(&serde_json::json!({"username": "admin", "password": "admin-startup-password"}))
            .await;
        admin_login.assert_status_ok();
        let admin_token: TokenResponse = admin_login.json();
        assert!(admin_token.user.is_admin);

        let created = server
            .post("/admin/spring-meetup")
            .add_header("authorization", format!("Bearer {}", admin_token.access_token))
            .json(&serde_json::json!({"name": "Spring Meetup", "description": "Yearly gathering"}))
            .await;
        created.assert_status(StatusCode::CREATED);

        // A visitor signs up and logs in
        let signup = server
            .post("/signup")
            .json(&serde_json::json!({"name": "Visitor", "username": "visitor", "password": "visitor-password"}))
            .await;
        signup.assert_status_ok();
        let visitor: UserResponse = signup.json();
        assert!(!visitor.is_admin);

        let login = server
            .post("/login")
            .json(&serde_json::json!({"username": "visitor", "password": "visitor-password"}))
            .await;
        login.assert_status_ok();
        let token: TokenResponse = login.json();

        // Browse and register
        let events = server.get("/events").await;
        events.assert_status_ok();
        let events: Vec<EventResponse> = events.json();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].slug, "spring-meetup");

        let register = server
            .post("/events/spring-meetup")
            .add_header("authorization", format!("Bearer {}", token.access_token))
            .json(&serde_json::json!({"comment": "count me in"}))
            .await;
        register.assert_status_ok();

        // The admin sees the registrant
        let registrants = server
            .get("/admin/spring-meetup/register")
            .add_header("authorization", format!("Bearer {}", admin_token.access_token))
            .await;
        registrants.assert_status_ok();
        let registrants: Vec<serde_json::Value> = registrants.json();
        assert_eq!(registrants.len(), 1);
        assert_eq!(registrants[0]["username"], "visitor");

        // The visitor sees the event in their list, then withdraws
        let mine = server
            .get("/users/me/events")
            .add_header("authorization", format!("Bearer {}", token.access_token))
            .await;
        mine.assert_status_ok();
        let mine: Vec<EventResponse> = mine.json();
        assert_eq!(mine.len(), 1);

        let withdraw = server
            .delete("/events/spring-meetup")
            .add_header("authorization", format!("Bearer {}", token.access_token))
            .await;
        withdraw.assert_status_ok();
    }

    #[sqlx::test]
    async fn test_admin_routes_reject_regular_users(pool: PgPool) {
        let server = test_application(pool).await;

        server
            .post("/signup")
            .json(&serde_json::json!({"name": "Visitor", "username": "visitor", "password": "visitor-password"}))
            .await
            .assert_status_ok();
        let login = server
            .post("/login")
            .json(&serde_json::json!({"username": "visitor", "password": "visitor-password"}))
            .await;
        let token: TokenResponse = login.json();

        let response = server
            .get("/admin")
            .add_header("authorization", format!("Bearer {}", token.access_token))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let anonymous = server.get("/admin").await;
        anonymous.assert_status(StatusCode::UNAUTHORIZED);
    }

    /// Login also sets the session cookie, and the cookie alone authenticates.
    #[sqlx::test]
    async fn test_session_cookie_authenticates(pool: PgPool) {
        let server = test_application(pool).await;

        server
            .post("/signup")
            .json(&serde_json::json!({"name": "Visitor", "username": "visitor", "password": "visitor-password"}))
            .await
            .assert_status_ok();

        let login = server
            .post("/login")
            .json(&serde_json::json!({"username": "visitor", "password": "visitor-password"}))
            .await;
        login.assert_status_ok();

        let cookie_header = login.headers().get("set-cookie").expect("login should set a cookie");
        let cookie = cookie_header.to_str().unwrap().split(';').next().unwrap().to_string();

        let me = server.get("/users/me").add_header("cookie", cookie).await;
        me.assert_status_ok();
        let me: UserResponse = me.json();
        assert_eq!(me.username, "visitor");
    }
}
