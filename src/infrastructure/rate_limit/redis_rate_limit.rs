//! Redis implementation of the quota counter store.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::repositories::RateLimitStore;
use crate::error::AppError;

/// Upper bound for a single Redis command.
const OP_TIMEOUT: Duration = Duration::from_millis(500);

/// Redis-backed daily counter store.
///
/// `INCR` is the atomic check-and-consume primitive; the expiry is attached
/// when the returned value is 1, i.e. on the first use of a key, so each
/// day-scoped counter deletes itself after its window.
pub struct RedisRateLimitStore {
    client: ConnectionManager,
}

impl RedisRateLimitStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the connection cannot be established.
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = Client::open(redis_url).map_err(|e| {
            AppError::internal(
                "Failed to create Redis client",
                json!({ "reason": e.to_string() }),
            )
        })?;

        let mut manager = ConnectionManager::new(client).await.map_err(|e| {
            AppError::internal(
                "Failed to connect to Redis",
                json!({ "reason": e.to_string() }),
            )
        })?;

        manager.ping::<()>().await.map_err(|e| {
            AppError::internal("Redis PING failed", json!({ "reason": e.to_string() }))
        })?;

        info!("✓ Rate-limit store connected to Redis");

        Ok(Self { client: manager })
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn consume(&self, key: &str, ttl_seconds: u64) -> Result<u64, AppError> {
        let mut conn = self.client.clone();

        let count: u64 = tokio::time::timeout(OP_TIMEOUT, conn.incr(key, 1u64))
            .await
            .map_err(|_| {
                warn!("Rate-limit INCR timed out for {}", key);
                AppError::internal("Rate-limit backend timed out", json!({}))
            })?
            .map_err(|e| {
                warn!("Rate-limit INCR failed for {}: {}", key, e);
                AppError::internal("Rate-limit backend error", json!({}))
            })?;

        if count == 1 {
            // First use of this key; arm the daily reset.
            if let Err(e) = conn.expire::<_, ()>(key, ttl_seconds as i64).await {
                warn!("Failed to set expiry on {}: {}", key, e);
            }
        }

        Ok(count)
    }
}
