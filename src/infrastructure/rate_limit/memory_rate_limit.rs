//! In-memory implementation of the quota counter store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::repositories::RateLimitStore;
use crate::error::AppError;

/// Process-local counter store for tests and single-node development.
///
/// Counters never expire; keys embed the UTC date, so a new day starts a new
/// counter and stale ones are only a memory-footprint concern, not a
/// correctness one.
#[derive(Default)]
pub struct MemoryRateLimitStore {
    counters: Mutex<HashMap<String, u64>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn consume(&self, key: &str, _ttl_seconds: u64) -> Result<u64, AppError> {
        let mut counters = self.counters.lock().expect("counter lock poisoned");
        let count = counters.entry(key.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_consume_counts_per_key() {
        let store = MemoryRateLimitStore::new();

        assert_eq!(store.consume("a:2026-08-06", 86_400).await.unwrap(), 1);
        assert_eq!(store.consume("a:2026-08-06", 86_400).await.unwrap(), 2);
        assert_eq!(store.consume("b:2026-08-06", 86_400).await.unwrap(), 1);

        // A new day means a new key and a fresh counter.
        assert_eq!(store.consume("a:2026-08-07", 86_400).await.unwrap(), 1);
    }
}
