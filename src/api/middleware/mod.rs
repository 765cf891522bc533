//! HTTP middleware.

pub mod throttle;
pub mod tracing;
