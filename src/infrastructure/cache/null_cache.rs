//! No-op cache implementation for disabled caching.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::service::{CacheResult, HotSetCache};
use crate::domain::entities::ShortUrl;

/// A cache implementation that does nothing.
///
/// Every lookup is a miss, so redemptions always read the store. Used when
/// Redis is unavailable or caching is explicitly disabled.
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        debug!("Using NullCache (hot-set caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HotSetCache for NullCache {
    async fn get_record(&self, _identifier: &str) -> CacheResult<Option<ShortUrl>> {
        Ok(None)
    }

    async fn publish_generation(&self, _entries: Vec<ShortUrl>, _ttl: Duration) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
