//! Background worker applying usage counter increments.
//!
//! Consumes [`UsageEvent`]s dispatched by the redemption path and applies the
//! store's atomic add-by-one. The increment is retried once on failure before
//! the event is dropped with a log line and a metric; it is never allowed to
//! fail a redirect that has already been issued.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, warn};

use crate::domain::repositories::UrlRepository;
use crate::domain::usage_event::UsageEvent;
use crate::error::AppError;

/// Upper bound for a single increment attempt.
const INCREMENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay before the single retry.
const RETRY_DELAY: Duration = Duration::from_millis(200);

/// Runs the usage worker until the channel closes.
pub async fn run_usage_worker(mut rx: mpsc::Receiver<UsageEvent>, urls: Arc<dyn UrlRepository>) {
    while let Some(event) = rx.recv().await {
        let attempt = || async {
            match tokio::time::timeout(INCREMENT_TIMEOUT, urls.increment_uses(&event.identifier))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(AppError::internal(
                    "Usage increment timed out",
                    json!({ "identifier": event.identifier }),
                )),
            }
        };

        // Initial attempt plus one retry.
        let strategy = FixedInterval::new(RETRY_DELAY).take(1);

        match Retry::spawn(strategy, attempt).await {
            Ok(()) => {
                debug!("Recorded use of {}", event.identifier);
                metrics::counter!("usage_increments_total").increment(1);
            }
            Err(e) => {
                warn!("Dropping usage increment for {}: {}", event.identifier, e);
                metrics::counter!("usage_increments_failed_total").increment(1);
            }
        }
    }

    debug!("Usage worker shutting down: channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockUrlRepository;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_applies_increment_for_each_event() {
        let mut repo = MockUrlRepository::new();
        repo.expect_increment_uses()
            .withf(|id| id == "abc123")
            .times(2)
            .returning(|_| Ok(()));

        let (tx, rx) = mpsc::channel(8);
        let worker = tokio::spawn(run_usage_worker(rx, Arc::new(repo)));

        tx.send(UsageEvent::new("abc123")).await.unwrap();
        tx.send(UsageEvent::new("abc123")).await.unwrap();
        drop(tx);

        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_retries_once_on_transient_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let mut repo = MockUrlRepository::new();
        repo.expect_increment_uses().times(2).returning(move |_| {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AppError::internal("Database error", json!({})))
            } else {
                Ok(())
            }
        });

        let (tx, rx) = mpsc::channel(8);
        let worker = tokio::spawn(run_usage_worker(rx, Arc::new(repo)));

        tx.send(UsageEvent::new("abc123")).await.unwrap();
        drop(tx);

        worker.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_retry_and_keeps_draining() {
        let mut repo = MockUrlRepository::new();
        // First event fails twice (attempt + retry), second event succeeds.
        repo.expect_increment_uses()
            .withf(|id| id == "doomed")
            .times(2)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));
        repo.expect_increment_uses()
            .withf(|id| id == "healthy")
            .times(1)
            .returning(|_| Ok(()));

        let (tx, rx) = mpsc::channel(8);
        let worker = tokio::spawn(run_usage_worker(rx, Arc::new(repo)));

        tx.send(UsageEvent::new("doomed")).await.unwrap();
        tx.send(UsageEvent::new("healthy")).await.unwrap();
        drop(tx);

        worker.await.unwrap();
    }
}
