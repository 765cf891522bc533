//! Redis-backed hot-set cache implementation.

use super::service::{CacheError, CacheResult, HotSetCache};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::domain::entities::ShortUrl;

/// Upper bound for a single Redis command.
const OP_TIMEOUT: Duration = Duration::from_millis(500);

/// Redis hot-set cache.
///
/// Entries are JSON snapshots stored under generation-scoped keys
/// (`hot:{generation}:{identifier}`); a pointer key (`hot:current`) names the
/// generation readers should use. Publishing writes the full new generation
/// before moving the pointer, so a failed rebuild never leaves readers with a
/// half-populated set. Superseded generations simply age out via TTL.
///
/// Read operations are fail-open: errors are logged and reported as misses.
pub struct RedisHotSetCache {
    client: ConnectionManager,
    key_prefix: String,
}

impl RedisHotSetCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the URL is invalid, the
    /// connection cannot be established, or the PING health check fails.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        info!("Connecting to Redis at {}", redis_url);

        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("Failed to create Redis client: {e}")))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {e}")))?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::Connection(format!("Redis PING failed: {e}")))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            key_prefix: "hot".to_string(),
        })
    }

    fn pointer_key(&self) -> String {
        format!("{}:current", self.key_prefix)
    }

    fn generation_counter_key(&self) -> String {
        format!("{}:generation", self.key_prefix)
    }

    fn entry_key(&self, generation: u64, identifier: &str) -> String {
        format!("{}:{}:{}", self.key_prefix, generation, identifier)
    }

    /// Resolves the currently published generation, if any.
    async fn current_generation(&self) -> Result<Option<u64>, redis::RedisError> {
        let mut conn = self.client.clone();
        let pointer = tokio::time::timeout(OP_TIMEOUT, conn.get::<_, Option<u64>>(self.pointer_key()))
            .await
            .map_err(elapsed_to_redis_error)??;
        Ok(pointer)
    }
}

/// Maps a tokio timeout into the Redis error domain so both failure modes
/// take the same fail-open path.
fn elapsed_to_redis_error(_: tokio::time::error::Elapsed) -> redis::RedisError {
    redis::RedisError::from((redis::ErrorKind::Io, "operation timed out"))
}

#[async_trait]
impl HotSetCache for RedisHotSetCache {
    async fn get_record(&self, identifier: &str) -> CacheResult<Option<ShortUrl>> {
        let generation = match self.current_generation().await {
            Ok(Some(generation)) => generation,
            Ok(None) => {
                debug!("Cache MISS (no published generation): {}", identifier);
                return Ok(None);
            }
            Err(e) => {
                error!("Redis GET error for generation pointer: {}", e);
                return Ok(None);
            }
        };

        let key = self.entry_key(generation, identifier);
        let mut conn = self.client.clone();

        let payload =
            match tokio::time::timeout(OP_TIMEOUT, conn.get::<_, Option<String>>(&key)).await {
                Ok(Ok(payload)) => payload,
                Ok(Err(e)) => {
                    error!("Redis GET error for {}: {}", identifier, e);
                    return Ok(None);
                }
                Err(_) => {
                    warn!("Redis GET timed out for {}", identifier);
                    return Ok(None);
                }
            };

        match payload {
            Some(json) => match serde_json::from_str::<ShortUrl>(&json) {
                Ok(record) => {
                    debug!("Cache HIT: {}", identifier);
                    Ok(Some(record))
                }
                Err(e) => {
                    warn!("Discarding undecodable cache entry for {}: {}", identifier, e);
                    Ok(None)
                }
            },
            None => {
                debug!("Cache MISS: {}", identifier);
                Ok(None)
            }
        }
    }

    async fn publish_generation(&self, entries: Vec<ShortUrl>, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.client.clone();

        let generation: u64 = conn
            .incr(self.generation_counter_key(), 1)
            .await
            .map_err(|e| CacheError::Operation(format!("Failed to allocate generation: {e}")))?;

        let count = entries.len();
        let ttl_seconds = ttl.as_secs();

        for record in entries {
            let key = self.entry_key(generation, &record.identifier);
            let json = serde_json::to_string(&record)
                .map_err(|e| CacheError::Operation(format!("Failed to serialize record: {e}")))?;

            conn.set_ex::<_, _, ()>(&key, json, ttl_seconds)
                .await
                .map_err(|e| {
                    CacheError::Operation(format!(
                        "Failed to stage {} in generation {generation}: {e}",
                        record.identifier
                    ))
                })?;
        }

        // The staged set is complete; make it visible.
        conn.set::<_, _, ()>(self.pointer_key(), generation)
            .await
            .map_err(|e| {
                CacheError::Operation(format!("Failed to publish generation {generation}: {e}"))
            })?;

        debug!("Published cache generation {} ({} entries)", generation, count);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        matches!(
            tokio::time::timeout(OP_TIMEOUT, conn.ping::<()>()).await,
            Ok(Ok(()))
        )
    }
}
