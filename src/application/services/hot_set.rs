//! Hot-set cache rebuild.
//!
//! Walks the store's popularity index, keeps the most-used records that are
//! still redeemable at rebuild time, and publishes them as one staged
//! generation. Runs either on a fixed interval inside the server process or
//! as a one-shot from the `hotcache` binary.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::domain::entities::ShortUrl;
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;
use crate::infrastructure::cache::HotSetCache;

/// Rebuilds the hot-set cache from the store's popularity index.
pub struct HotSetRebuilder {
    urls: Arc<dyn UrlRepository>,
    cache: Arc<dyn HotSetCache>,
    size: usize,
    ttl: Duration,
}

impl HotSetRebuilder {
    /// Creates a new rebuilder.
    ///
    /// `size` bounds the published set; `ttl` is the expiry stamped on each
    /// entry of a generation.
    pub fn new(
        urls: Arc<dyn UrlRepository>,
        cache: Arc<dyn HotSetCache>,
        size: usize,
        ttl: Duration,
    ) -> Self {
        Self {
            urls,
            cache,
            size,
            ttl,
        }
    }

    /// Runs one rebuild and returns the number of published entries.
    ///
    /// Pages through the popularity index descending until the target size is
    /// reached or the index is exhausted, dropping records that are already
    /// dead (window closed or usage cap reached), since caching them would
    /// only fill slots with guaranteed denials. Records can still age out between
    /// rebuild and read; the redemption validator covers that.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when the store cannot be paged or the
    /// generation cannot be published. Either way the previously published
    /// generation keeps serving.
    pub async fn rebuild(&self) -> Result<usize, AppError> {
        let now = Utc::now();
        let page_size = self.size.max(1) as i64;

        let mut selected: Vec<ShortUrl> = Vec::with_capacity(self.size);
        let mut offset = 0i64;

        'paging: loop {
            let batch = self.urls.top_used(page_size, offset).await?;
            let exhausted = (batch.len() as i64) < page_size;
            offset += batch.len() as i64;

            for record in batch {
                if record.expired(now) || record.usage_exhausted() {
                    continue;
                }

                selected.push(record);

                if selected.len() >= self.size {
                    break 'paging;
                }
            }

            if exhausted {
                break;
            }
        }

        let count = selected.len();

        self.cache
            .publish_generation(selected, self.ttl)
            .await
            .map_err(|e| {
                AppError::internal(
                    "Failed to publish hot-set generation",
                    json!({ "reason": e.to_string() }),
                )
            })?;

        metrics::gauge!("hot_cache_entries").set(count as f64);
        Ok(count)
    }

    /// Runs rebuilds forever on a fixed interval.
    ///
    /// A single task owns this loop, so rebuilds never overlap; a tick that
    /// fires while a rebuild is still running is delayed, not stacked.
    /// Failures are logged and the previous generation keeps serving until
    /// the next successful rebuild.
    pub async fn run(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match self.rebuild().await {
                Ok(count) => info!("Hot-set rebuild published {} entries", count),
                Err(e) => {
                    warn!("Hot-set rebuild failed, previous generation keeps serving: {e}");
                    metrics::counter!("hot_cache_rebuild_failures_total").increment(1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockUrlRepository;
    use crate::infrastructure::cache::{MemoryHotSetCache, MockHotSetCache, service::CacheError};
    use chrono::Duration as ChronoDuration;

    fn record(identifier: &str, uses: i64) -> ShortUrl {
        let now = Utc::now();
        ShortUrl {
            identifier: identifier.to_string(),
            target_url: "https://example.com".to_string(),
            max_uses: 0,
            current_uses: uses,
            password_hash: None,
            valid_from: None,
            valid_to: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_rebuild_publishes_top_used() {
        let mut repo = MockUrlRepository::new();
        repo.expect_top_used()
            .withf(|limit, offset| *limit == 2 && *offset == 0)
            .times(1)
            .returning(|_, _| Ok(vec![record("high", 9), record("mid", 5)]));

        let cache = Arc::new(MemoryHotSetCache::new());
        let rebuilder = HotSetRebuilder::new(
            Arc::new(repo),
            cache.clone(),
            2,
            Duration::from_secs(60),
        );

        assert_eq!(rebuilder.rebuild().await.unwrap(), 2);
        assert!(cache.get_record("high").await.unwrap().is_some());
        assert!(cache.get_record("mid").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rebuild_filters_dead_records_and_pages_past_them() {
        let now = Utc::now();

        let mut expired = record("expired", 50);
        expired.valid_to = Some(now - ChronoDuration::seconds(10));

        let mut used_up = record("used-up", 40);
        used_up.max_uses = 40;

        let mut repo = MockUrlRepository::new();
        repo.expect_top_used()
            .withf(|_, offset| *offset == 0)
            .times(1)
            .returning(move |_, _| Ok(vec![expired.clone(), used_up.clone()]));
        repo.expect_top_used()
            .withf(|_, offset| *offset == 2)
            .times(1)
            .returning(|_, _| Ok(vec![record("alive", 3)]));

        let cache = Arc::new(MemoryHotSetCache::new());
        let rebuilder = HotSetRebuilder::new(
            Arc::new(repo),
            cache.clone(),
            2,
            Duration::from_secs(60),
        );

        // Both first-page records are dead; the second (short) page ends the walk.
        assert_eq!(rebuilder.rebuild().await.unwrap(), 1);
        assert!(cache.get_record("expired").await.unwrap().is_none());
        assert!(cache.get_record("used-up").await.unwrap().is_none());
        assert!(cache.get_record("alive").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rebuild_stops_at_target_size() {
        let mut repo = MockUrlRepository::new();
        repo.expect_top_used().times(1).returning(|_, _| {
            Ok(vec![record("a", 9), record("b", 8), record("c", 7)])
        });

        let cache = Arc::new(MemoryHotSetCache::new());
        let rebuilder = HotSetRebuilder::new(
            Arc::new(repo),
            cache.clone(),
            3,
            Duration::from_secs(60),
        );

        assert_eq!(rebuilder.rebuild().await.unwrap(), 3);
        assert_eq!(cache.len().await, 3);
    }

    #[tokio::test]
    async fn test_publish_failure_surfaces_as_rebuild_failure() {
        let mut repo = MockUrlRepository::new();
        repo.expect_top_used()
            .returning(|_, _| Ok(vec![record("a", 1)]));

        let mut cache = MockHotSetCache::new();
        cache
            .expect_publish_generation()
            .times(1)
            .returning(|_, _| Err(CacheError::Operation("redis down".to_string())));

        let rebuilder = HotSetRebuilder::new(
            Arc::new(repo),
            Arc::new(cache),
            5,
            Duration::from_secs(60),
        );

        assert!(rebuilder.rebuild().await.is_err());
    }

    #[tokio::test]
    async fn test_rebuild_with_empty_store_publishes_empty_generation() {
        let mut repo = MockUrlRepository::new();
        repo.expect_top_used().times(1).returning(|_, _| Ok(vec![]));

        let cache = Arc::new(MemoryHotSetCache::new());
        let rebuilder = HotSetRebuilder::new(
            Arc::new(repo),
            cache.clone(),
            5,
            Duration::from_secs(60),
        );

        assert_eq!(rebuilder.rebuild().await.unwrap(), 0);
        assert!(cache.is_empty().await);
    }
}
