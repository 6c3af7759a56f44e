//! HTTP-facing error type and conversions from the library error taxonomy.
//!
//! Storage, allocation and validation failures are mapped to a uniform
//! JSON body:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "Short link not found", "details": {} } }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::application::services::AllocationError;
use crate::domain::repositories::StoreError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error payload.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },
    #[error("{message}")]
    NotFound { message: String, details: Value },
    #[error("{message}")]
    Conflict { message: String, details: Value },
    #[error("{message}")]
    Unavailable { message: String, details: Value },
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
            AppError::Unavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")
            }
            AppError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// Returns the HTTP status this error renders with.
    pub fn status(&self) -> StatusCode {
        self.parts().0
    }

    /// Converts the error into its serializable payload.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (_, code) = self.parts();
        let (message, details) = match self {
            AppError::Validation { message, details }
            | AppError::NotFound { message, details }
            | AppError::Conflict { message, details }
            | AppError::Unavailable { message, details }
            | AppError::Internal { message, details } => (message.clone(), details.clone()),
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateKey { code } => {
                AppError::conflict("Short code already exists", json!({ "code": code }))
            }
            StoreError::Unavailable(err) => {
                tracing::error!(error = %err, "Storage unavailable");
                AppError::unavailable("Storage unavailable", json!({}))
            }
            StoreError::Migration(err) => {
                tracing::error!(error = %err, "Schema migration failed");
                AppError::internal("Database schema error", json!({}))
            }
        }
    }
}

impl From<AllocationError> for AppError {
    fn from(e: AllocationError) -> Self {
        match e {
            AllocationError::InvalidUrl { reason } => {
                AppError::bad_request("Invalid URL", json!({ "reason": reason }))
            }
            AllocationError::SpaceExhausted { attempts } => AppError::internal(
                "Failed to allocate a unique short code",
                json!({ "attempts": attempts }),
            ),
            AllocationError::Storage(err) => err.into(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&e).unwrap_or_else(|_| json!({}));
        AppError::bad_request("Request validation failed", details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::bad_request("x", json!({})).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("x", json!({})).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::unavailable("x", json!({})).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_invalid_url_maps_to_validation() {
        let err: AppError = AllocationError::InvalidUrl {
            reason: "not a valid url".to_string(),
        }
        .into();

        assert!(matches!(err, AppError::Validation { .. }));
        let info = err.to_error_info();
        assert_eq!(info.code, "validation_error");
        assert_eq!(info.details["reason"], "not a valid url");
    }

    #[test]
    fn test_storage_error_maps_to_unavailable() {
        let err: AppError = AllocationError::Storage(StoreError::Unavailable(
            sqlx::Error::PoolTimedOut,
        ))
        .into();

        assert!(matches!(err, AppError::Unavailable { .. }));
        assert_eq!(err.to_string(), "Storage unavailable");
    }

    #[test]
    fn test_space_exhausted_is_internal() {
        let err: AppError = AllocationError::SpaceExhausted { attempts: 3 }.into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_error_info().details["attempts"], 3);
    }
}
