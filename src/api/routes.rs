//! API route configuration.

use crate::api::handlers::generate_handler;
use crate::state::AppState;
use axum::{Router, routing::post};

/// Public API routes.
///
/// # Endpoints
///
/// - `POST /generate` - Shorten a single URL
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/generate", post(generate_handler))
}
