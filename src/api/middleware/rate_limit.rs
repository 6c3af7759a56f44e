//! Rate limiting middleware using token bucket algorithm.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

/// Requests replenished per second for each client.
const GENERATE_PER_SECOND: u64 = 2;
/// Requests a client may send in a burst.
const GENERATE_BURST: u32 = 30;

/// Creates the rate limiter guarding link generation.
///
/// # Limits
///
/// - **Rate**: 2 requests per second
/// - **Burst**: 30 requests
///
/// Requests exceeding the limit receive `429 Too Many Requests`. Limits are
/// keyed by the socket peer address, so the router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
///
/// # Example
///
/// ```rust,ignore
/// let api = Router::new()
///     .route("/generate", post(generate_handler))
///     .layer(rate_limit::generate_layer());
/// ```
pub fn generate_layer()
-> GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(GENERATE_PER_SECOND)
            .burst_size(GENERATE_BURST)
            .finish()
            .expect("rate and burst are non-zero"),
    );

    GovernorLayer::new(governor_conf)
}
