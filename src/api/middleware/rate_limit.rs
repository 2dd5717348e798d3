//! Rate limiting middleware using token bucket algorithm.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

type PeerGovernorLayer =
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

fn build(replenish_ms: u64, burst: u32) -> PeerGovernorLayer {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(replenish_ms)
            .burst_size(burst)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(governor_conf)
}

/// Rate limiter for the read and write API.
///
/// # Limits
///
/// - **Rate**: 5 requests per second
/// - **Burst**: 50 requests
///
/// Requests exceeding the limit receive `429 Too Many Requests`. Limits are
/// applied per client IP taken from the socket peer address, so the server
/// must be started with connect info.
pub fn layer() -> PeerGovernorLayer {
    build(200, 50)
}

/// Stricter limiter for endpoints that start runs or write files.
///
/// # Limits
///
/// - **Rate**: 1 request per 10 seconds
/// - **Burst**: 5 requests
pub fn heavy_layer() -> PeerGovernorLayer {
    build(10_000, 5)
}
