//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: Counts stored records
/// 2. **Candidate Pool**: Reports queued codes and whether a refill is running
/// 3. **Page-view Queue**: Checks if the channel is open and reports free capacity
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected, 1532 records" },
///     "candidate_pool": { "status": "ok", "message": "9871 candidates" },
///     "pageview_queue": { "status": "ok", "message": "Capacity: 10000" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let database = check_database(&state).await;
    let candidate_pool = check_candidate_pool(&state);
    let pageview_queue = check_pageview_queue(&state);

    let all_healthy = database.is_ok() && candidate_pool.is_ok() && pageview_queue.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database,
            candidate_pool,
            pageview_queue,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match state.link_service.store().count().await {
        Ok(count) => CheckStatus::ok(format!("Connected, {count} records")),
        Err(e) => CheckStatus::error(format!("Database error: {e}")),
    }
}

/// An empty pool is healthy; assignments fall back to fresh codes.
fn check_candidate_pool(state: &AppState) -> CheckStatus {
    let pool = state.link_service.allocator().pool();

    if pool.is_refilling() {
        CheckStatus::ok(format!("{} candidates, refilling", pool.len()))
    } else {
        CheckStatus::ok(format!("{} candidates", pool.len()))
    }
}

fn check_pageview_queue(state: &AppState) -> CheckStatus {
    if state.pageview_sender.is_closed() {
        CheckStatus::error("Page-view queue is closed")
    } else {
        CheckStatus::ok(format!("Capacity: {}", state.pageview_sender.capacity()))
    }
}
