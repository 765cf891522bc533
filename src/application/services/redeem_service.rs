//! Redemption orchestration.
//!
//! Resolves an identifier through the hot-set cache with a store fallback,
//! re-runs the redemption validator on whatever record was found, and
//! dispatches the usage increment without blocking the redirect.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::domain::entities::ShortUrl;
use crate::domain::redemption::check_redeemable;
use crate::domain::repositories::UrlRepository;
use crate::domain::usage_event::UsageEvent;
use crate::error::AppError;
use crate::infrastructure::cache::HotSetCache;
use crate::utils::password::PasswordVerifier;

/// Service resolving identifiers to redirect targets.
pub struct RedeemService {
    urls: Arc<dyn UrlRepository>,
    cache: Arc<dyn HotSetCache>,
    passwords: Arc<dyn PasswordVerifier>,
    usage_tx: mpsc::Sender<UsageEvent>,
}

impl RedeemService {
    /// Creates a new redeem service.
    pub fn new(
        urls: Arc<dyn UrlRepository>,
        cache: Arc<dyn HotSetCache>,
        passwords: Arc<dyn PasswordVerifier>,
        usage_tx: mpsc::Sender<UsageEvent>,
    ) -> Self {
        Self {
            urls,
            cache,
            passwords,
            usage_tx,
        }
    }

    /// Redeems an identifier, returning the target URL to redirect to.
    ///
    /// A cache hit only skips the store read; the validator always runs
    /// against whatever snapshot was found, so an entry that aged out between
    /// rebuild and read is still denied. On success the usage increment is
    /// dispatched to the background worker; the returned redirect never
    /// waits on it.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] - unknown identifier
    /// - [`AppError::Denied`] - validator rejected the redemption
    /// - [`AppError::Internal`] - store errors
    pub async fn redeem(
        &self,
        identifier: &str,
        password: Option<&str>,
    ) -> Result<String, AppError> {
        let record = self.resolve(identifier).await?;

        if let Err(reason) = check_redeemable(&record, Utc::now(), password, self.passwords.as_ref())
        {
            metrics::counter!("redemptions_denied_total", "reason" => reason.code()).increment(1);
            return Err(reason.into());
        }

        // Fire-and-forget; the worker owns retries. A full queue is logged
        // and counted, never surfaced to the redirect.
        if self
            .usage_tx
            .try_send(UsageEvent::new(identifier))
            .is_err()
        {
            warn!("Usage queue full, dropping increment for {}", identifier);
            metrics::counter!("usage_events_dropped_total").increment(1);
        }

        metrics::counter!("redemptions_total").increment(1);
        Ok(record.target_url)
    }

    /// Resolves a record through the cache with a store fallback.
    async fn resolve(&self, identifier: &str) -> Result<ShortUrl, AppError> {
        match self.cache.get_record(identifier).await {
            Ok(Some(record)) => {
                metrics::counter!("hot_cache_hits_total").increment(1);
                return Ok(record);
            }
            Ok(None) => {
                metrics::counter!("hot_cache_misses_total").increment(1);
            }
            Err(e) => {
                // Fail open: a broken cache must not break redirects.
                error!("Cache error for {}: {}", identifier, e);
                metrics::counter!("hot_cache_errors_total").increment(1);
            }
        }

        self.urls
            .find_by_identifier(identifier)
            .await?
            .ok_or_else(|| {
                AppError::not_found("ShortenedId not found.", json!({ "identifier": identifier }))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::redemption::Denial;
    use crate::domain::repositories::MockUrlRepository;
    use crate::infrastructure::cache::{MockHotSetCache, service::CacheError};
    use crate::utils::password::HmacPasswordVerifier;
    use chrono::Duration;

    fn record(identifier: &str) -> ShortUrl {
        let now = Utc::now();
        ShortUrl {
            identifier: identifier.to_string(),
            target_url: "https://example.com/target".to_string(),
            max_uses: 0,
            current_uses: 0,
            password_hash: None,
            valid_from: None,
            valid_to: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn service(
        repo: MockUrlRepository,
        cache: MockHotSetCache,
    ) -> (RedeemService, mpsc::Receiver<UsageEvent>) {
        let (tx, rx) = mpsc::channel(8);
        let passwords: Arc<dyn PasswordVerifier> =
            Arc::new(HmacPasswordVerifier::new("test-pepper".to_string()));

        (
            RedeemService::new(Arc::new(repo), Arc::new(cache), passwords, tx),
            rx,
        )
    }

    #[tokio::test]
    async fn test_cache_hit_skips_store_and_records_use() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_identifier().times(0);

        let mut cache = MockHotSetCache::new();
        cache
            .expect_get_record()
            .times(1)
            .returning(|_| Ok(Some(record("abc123"))));

        let (service, mut rx) = service(repo, cache);

        let target = service.redeem("abc123", None).await.unwrap();
        assert_eq!(target, "https://example.com/target");
        assert_eq!(rx.recv().await.unwrap(), UsageEvent::new("abc123"));
    }

    #[tokio::test]
    async fn test_cache_miss_falls_back_to_store() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_identifier()
            .withf(|id| id == "abc123")
            .times(1)
            .returning(|_| Ok(Some(record("abc123"))));

        let mut cache = MockHotSetCache::new();
        cache.expect_get_record().times(1).returning(|_| Ok(None));

        let (service, _rx) = service(repo, cache);

        assert!(service.redeem("abc123", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_cache_error_falls_back_to_store() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_identifier()
            .times(1)
            .returning(|_| Ok(Some(record("abc123"))));

        let mut cache = MockHotSetCache::new();
        cache
            .expect_get_record()
            .times(1)
            .returning(|_| Err(CacheError::Operation("boom".to_string())));

        let (service, _rx) = service(repo, cache);

        assert!(service.redeem("abc123", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_identifier_is_not_found() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_identifier()
            .times(1)
            .returning(|_| Ok(None));

        let mut cache = MockHotSetCache::new();
        cache.expect_get_record().times(1).returning(|_| Ok(None));

        let (service, _rx) = service(repo, cache);

        let err = service.redeem("missing", None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cache_hit_is_still_validated() {
        // Snapshot cached before expiry, read after: the hit must be denied.
        let mut expired = record("abc123");
        expired.valid_to = Some(Utc::now() - Duration::seconds(1));

        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_identifier().times(0);

        let mut cache = MockHotSetCache::new();
        cache
            .expect_get_record()
            .times(1)
            .returning(move |_| Ok(Some(expired.clone())));

        let (service, mut rx) = service(repo, cache);

        let err = service.redeem("abc123", None).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Denied {
                reason: Denial::Expired
            }
        ));

        // Denied redemptions must not count a use.
        drop(service);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_password_protected_flow() {
        let passwords = HmacPasswordVerifier::new("test-pepper".to_string());
        let mut protected = record("abc123");
        protected.password_hash = Some(passwords.hash("letmein"));

        let mut repo = MockUrlRepository::new();
        let stored = protected.clone();
        repo.expect_find_by_identifier()
            .returning(move |_| Ok(Some(stored.clone())));

        let mut cache = MockHotSetCache::new();
        cache.expect_get_record().returning(|_| Ok(None));

        let (service, _rx) = service(repo, cache);

        let err = service.redeem("abc123", None).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Denied {
                reason: Denial::PasswordRequired
            }
        ));

        let err = service.redeem("abc123", Some("wrong")).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Denied {
                reason: Denial::PasswordIncorrect
            }
        ));

        assert!(service.redeem("abc123", Some("letmein")).await.is_ok());
    }
}
