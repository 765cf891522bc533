//! Hot-set cache trait and error types.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::entities::ShortUrl;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),
    #[error("Cache operation error: {0}")]
    Operation(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Read-through cache over the most-used, currently valid records.
///
/// Serving paths only read; the rebuild job is the single writer and
/// publishes complete generations. A hit returns the record snapshot taken
/// at rebuild time. Callers must still run the redemption validator, since
/// the snapshot's counter and window may have aged between rebuild and read.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisHotSetCache`] - generation-keyed Redis entries
/// - [`crate::infrastructure::cache::MemoryHotSetCache`] - process-local map
/// - [`crate::infrastructure::cache::NullCache`] - disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HotSetCache: Send + Sync {
    /// Looks up a record snapshot by identifier.
    ///
    /// Returns `Ok(None)` on a miss, on an entry past its TTL, or on a
    /// backend error (fail-open: errors are logged and degrade to store
    /// lookups).
    async fn get_record(&self, identifier: &str) -> CacheResult<Option<ShortUrl>>;

    /// Publishes a complete new cache generation.
    ///
    /// The new set must be fully staged before it becomes visible; readers
    /// never observe a partially populated generation, and a failure here
    /// leaves the previous generation serving.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Operation`] when the generation could not be
    /// published; the caller treats this as a failed rebuild.
    async fn publish_generation(&self, entries: Vec<ShortUrl>, ttl: Duration) -> CacheResult<()>;

    /// Checks if the cache backend is reachable.
    async fn health_check(&self) -> bool;
}
