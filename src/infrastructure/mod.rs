//! Infrastructure layer: database, cache, and rate-limit backends.

pub mod cache;
pub mod persistence;
pub mod rate_limit;
