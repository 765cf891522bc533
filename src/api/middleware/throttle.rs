//! Per-IP burst throttling.
//!
//! Token-bucket flood protection in front of the public endpoints. This is
//! not the daily creation quota; that policy lives in
//! [`crate::application::services::QuotaService`] and survives restarts; the
//! layers here only shed abusive request bursts before they reach a handler.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

/// Throttle for the redirect path.
///
/// Generous: redirects are the hot path and legitimate clients can burst
/// (link previews, unfurlers). Requests beyond the budget receive
/// `429 Too Many Requests`.
pub fn redirect_layer()
-> GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(200)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(governor_conf)
}

/// Throttle for the JSON API.
pub fn api_layer()
-> GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(50)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(governor_conf)
}
