//! Client address resolution for rate-limit actor keys.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Resolves the client IP for a request.
///
/// When `behind_proxy` is set, `X-Forwarded-For` (first hop) and `X-Real-IP`
/// are trusted before falling back to the socket peer address. Enable the
/// flag only when the service sits behind a trusted reverse proxy; otherwise
/// the headers are attacker-controlled and daily quotas become trivially
/// evadable.
pub fn resolve_client_ip(headers: &HeaderMap, peer: SocketAddr, behind_proxy: bool) -> IpAddr {
    if behind_proxy {
        if let Some(ip) = forwarded_ip(headers) {
            return ip;
        }
    }

    peer.ip()
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        // First entry is the originating client.
        if let Some(ip) = forwarded
            .split(',')
            .next()
            .and_then(|part| part.trim().parse().ok())
        {
            return Some(ip);
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
