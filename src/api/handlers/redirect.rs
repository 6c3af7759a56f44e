//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect},
};
use metrics::counter;
use serde_json::json;
use std::net::SocketAddr;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::domain::pageview_event::PageViewEvent;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::code_generator::is_well_formed_code;

/// Redirects a short code to its long URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// Codes that cannot have been generated are rejected without touching
/// storage. Every hit increments the access counter and enqueues a page
/// view; when the queue is full the page view is dropped.
///
/// # Errors
///
/// Returns 404 Not Found if the code is malformed or unknown.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<impl IntoResponse, AppError> {
    if !is_well_formed_code(&code) {
        return Err(short_link_not_found(&code));
    }

    let long_url = state
        .link_service
        .resolve(&code)
        .await?
        .ok_or_else(|| short_link_not_found(&code))?;

    let event = PageViewEvent::new(
        long_url.clone(),
        Some(addr.ip().to_string()),
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
    );

    match state.pageview_sender.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            counter!("shortener_pageviews_dropped_total").increment(1);
            debug!(code = %code, "Page-view queue full, dropping event");
        }
        Err(TrySendError::Closed(_)) => {
            counter!("shortener_pageviews_dropped_total").increment(1);
            warn!("Page-view queue closed");
        }
    }

    Ok(Redirect::temporary(&long_url))
}

fn short_link_not_found(code: &str) -> AppError {
    AppError::not_found("Short link not found", json!({ "code": code }))
}
