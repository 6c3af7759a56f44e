//! Handler for the link generation endpoint.

use axum::{Json, extract::State};
use tracing::info;
use validator::Validate;

use crate::api::dto::generate::{GenerateRequest, GenerateResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link for one URL.
///
/// # Endpoint
///
/// `POST /api/generate`
///
/// # Request Body
///
/// ```json
/// { "url": "example.com/some/page" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "code": "aB3x",
///   "short_url": "https://tny.wtf/aB3x",
///   "long_url": "http://example.com/some/page"
/// }
/// ```
///
/// # Errors
///
/// - 400 if the URL is blank, too long or not an absolute URL after repair
/// - 503 if storage is unavailable
/// - 500 if no free code was found within the attempt budget
pub async fn generate_handler(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    payload.validate()?;

    let link = state.link_service.shorten(&payload.url).await?;
    info!(code = %link.code, "Short link created");

    Ok(Json(GenerateResponse {
        short_url: state.link_service.short_url(&link.code),
        code: link.code,
        long_url: link.long_url,
    }))
}
