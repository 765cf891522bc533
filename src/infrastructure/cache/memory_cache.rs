//! Process-local hot-set cache implementation.
//!
//! Used by the integration tests and by deployments without Redis that still
//! want the hot-set fast path. Publishing builds the replacement map off to
//! the side and swaps it in whole, the in-process equivalent of the Redis
//! implementation's generation pointer move.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use super::service::{CacheResult, HotSetCache};
use crate::domain::entities::ShortUrl;

struct CacheEntry {
    record: ShortUrl,
    expires_at: DateTime<Utc>,
}

/// In-memory hot-set cache keyed by identifier.
#[derive(Default)]
pub struct MemoryHotSetCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryHotSetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in the current generation, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl HotSetCache for MemoryHotSetCache {
    async fn get_record(&self, identifier: &str) -> CacheResult<Option<ShortUrl>> {
        let entries = self.entries.read().await;

        match entries.get(identifier) {
            Some(entry) if entry.expires_at > Utc::now() => {
                debug!("Cache HIT: {}", identifier);
                Ok(Some(entry.record.clone()))
            }
            Some(_) => {
                // Past its TTL; a stale snapshot must read as a miss.
                debug!("Cache MISS (stale): {}", identifier);
                Ok(None)
            }
            None => {
                debug!("Cache MISS: {}", identifier);
                Ok(None)
            }
        }
    }

    async fn publish_generation(&self, entries: Vec<ShortUrl>, ttl: Duration) -> CacheResult<()> {
        let expires_at = Utc::now()
            + ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::seconds(86_400));

        let staged: HashMap<String, CacheEntry> = entries
            .into_iter()
            .map(|record| {
                (
                    record.identifier.clone(),
                    CacheEntry { record, expires_at },
                )
            })
            .collect();

        let count = staged.len();
        *self.entries.write().await = staged;

        debug!("Published cache generation ({} entries)", count);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(identifier: &str) -> ShortUrl {
        let now = Utc::now();
        ShortUrl {
            identifier: identifier.to_string(),
            target_url: "https://example.com".to_string(),
            max_uses: 0,
            current_uses: 0,
            password_hash: None,
            valid_from: None,
            valid_to: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = MemoryHotSetCache::new();
        cache
            .publish_generation(vec![record("abc123")], Duration::from_secs(60))
            .await
            .unwrap();

        let hit = cache.get_record("abc123").await.unwrap();
        assert_eq!(hit.unwrap().identifier, "abc123");
        assert!(cache.get_record("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entry_past_ttl_is_a_miss() {
        let cache = MemoryHotSetCache::new();
        cache
            .publish_generation(vec![record("abc123")], Duration::ZERO)
            .await
            .unwrap();

        assert!(cache.get_record("abc123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_publish_replaces_previous_generation() {
        let cache = MemoryHotSetCache::new();
        cache
            .publish_generation(vec![record("old")], Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .publish_generation(vec![record("new")], Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.get_record("old").await.unwrap().is_none());
        assert!(cache.get_record("new").await.unwrap().is_some());
        assert_eq!(cache.len().await, 1);
    }
}
