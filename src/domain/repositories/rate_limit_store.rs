//! Counter primitive backing the daily creation quota.

use crate::error::AppError;
use async_trait::async_trait;

/// Atomic, self-expiring counter store.
///
/// The quota policy (key construction, limit comparison) lives in
/// [`crate::application::services::QuotaService`]; this trait only provides
/// the single atomic increment the policy needs. Check-then-increment as two
/// operations would reopen the race the original implementation had.
///
/// # Implementations
///
/// - [`crate::infrastructure::rate_limit::RedisRateLimitStore`]
/// - [`crate::infrastructure::rate_limit::MemoryRateLimitStore`]
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Atomically increments `key` and returns the post-increment count.
    ///
    /// On the first increment of a key its expiry is set to `ttl_seconds`,
    /// so day-scoped counters reset themselves without a sweeper.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when the backend is unreachable.
    async fn consume(&self, key: &str, ttl_seconds: u64) -> Result<u64, AppError>;
}
