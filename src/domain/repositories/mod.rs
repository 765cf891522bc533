//! Data access traits owned by the domain layer.

pub mod rate_limit_store;
pub mod url_repository;

pub use rate_limit_store::RateLimitStore;
pub use url_repository::UrlRepository;

#[cfg(test)]
pub use rate_limit_store::MockRateLimitStore;
#[cfg(test)]
pub use url_repository::MockUrlRepository;
