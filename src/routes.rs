//! Route definitions and router setup
//!
//! Configures all API routes and middleware. Everything under `/api/admin`
//! (and `/api/auth/me`) sits behind the token verification middleware; the
//! handlers then run scope resolution and policy checks themselves.

mod auth;
mod countries;
mod devices;
mod loans;
mod users;

use crate::auth::auth_middleware;
use crate::config::Settings;
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    let cors = build_cors_layer(settings);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let middleware_stack = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/admin/users", get(users::list_users))
        .route("/api/admin/users", post(users::create_user))
        .route(
            "/api/admin/users/{id}/password",
            patch(users::update_password),
        )
        .route("/api/admin/users/{id}/role", patch(users::update_role))
        .route("/api/admin/users/{id}", delete(users::delete_user))
        .route("/api/admin/countries", get(countries::list_countries))
        .route("/api/admin/countries", post(countries::create_country))
        .route("/api/admin/devices", get(devices::list_devices))
        .route("/api/admin/loans", get(loans::list_loans))
        .route_layer(middleware::from_fn(auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/login", post(auth::login))
        .merge(protected)
        .layer(middleware_stack)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let headers = [
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        header::ACCEPT,
        header::HeaderName::from_static(crate::scope::COUNTRY_HEADER),
    ];

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers)
            .max_age(Duration::from_secs(3600))
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
            .max_age(Duration::from_secs(3600))
    }
}

/// Health check endpoint, including a database reachability probe
async fn health_check(
    axum::extract::State(state): axum::extract::State<SharedState>,
) -> axum::Json<serde_json::Value> {
    let database_ok = match state.db_pool.get().await {
        Ok(client) => client.query_one("SELECT 1 as ok", &[]).await.is_ok(),
        Err(_) => false,
    };

    axum::Json(serde_json::json!({
        "success": true,
        "database": if database_ok { "up" } else { "down" },
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
