pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod session;
pub mod state;
pub mod users;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Session management (cookie-based, no bearer token required)
        .merge(auth_routes())
        // Protected API
        .merge(user_routes())
        // Global middleware
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/current", get(handlers::users::current_user))
        .route_layer(axum::middleware::from_fn(middleware::jwt_auth_middleware))
}

// Cookies only flow with credentialed CORS, so the permissive preset is out
fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = config::config()
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "message": "Recipes API is running",
        "version": version,
        "endpoints": {
            "auth": "/api/auth/register, /api/auth/login, /api/auth/refresh, /api/auth/logout",
            "users": "/api/users/current (protected)",
        },
        "healthcheck": "/health",
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": chrono::Utc::now(),
        "uptime": state.started_at.elapsed().as_secs(),
        "environment": config::config().environment.as_str(),
        "sessions": {
            "active": state.sessions.active_sessions().await,
            "refreshes": state.sessions.refresh_calls(),
        },
    }))
}
