//! DTOs for the link generation endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to shorten a single URL.
///
/// The URL may lack a scheme; it is repaired before validation.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, max = 2048, message = "URL must be 1 to 2048 characters"))]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub code: String,
    pub short_url: String,
    /// The URL as stored, after repair.
    pub long_url: String,
}
