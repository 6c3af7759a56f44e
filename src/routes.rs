//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /`              - Index page from the static directory
//! - `GET  /{code}`        - Short link redirect
//! - `GET  /health`        - Health check: DB, candidate pool, page-view queue
//! - `POST /api/generate`  - Link generation (rate limited)
//! - `/static/*`           - Static assets
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket on `/api`
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{rate_limit, tracing};
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use std::path::Path;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::services::{ServeDir, ServeFile};

/// Builds the router with all routes and middleware except path normalization.
///
/// `static_dir` must contain `index.html`; everything else in it is served
/// under `/static`.
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    let api_router = api::routes::api_routes().layer(rate_limit::generate_layer());

    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route("/health", get(health_handler))
        .route("/{code}", get(redirect_handler))
        .nest("/api", api_router)
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
        .layer(tracing::layer())
}

/// Constructs the application router, trimming trailing slashes before routing.
pub fn app_router(state: AppState, static_dir: &Path) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state, static_dir))
}
