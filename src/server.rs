//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache and counter backend selection,
//! background worker spawning, and Axum server lifecycle.

use crate::api::routes::app_router;
use crate::application::services::{
    AuthService, HotSetRebuilder, QuotaService, RedeemService, ShortenService,
};
use crate::config::Config;
use crate::domain::repositories::{RateLimitStore, UrlRepository};
use crate::domain::usage_worker::run_usage_worker;
use crate::infrastructure::cache::{HotSetCache, MemoryHotSetCache, NullCache, RedisHotSetCache};
use crate::infrastructure::persistence::PgUrlRepository;
use crate::infrastructure::rate_limit::{MemoryRateLimitStore, RedisRateLimitStore};
use crate::state::AppState;
use crate::utils::password::HmacPasswordVerifier;

use anyhow::Result;
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations
/// - Redis hot-set cache and quota counters (process-local fallbacks)
/// - Background usage worker and hot-set rebuild job
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if the database connection, migrations, server bind, or
/// server runtime fail.
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    let urls: Arc<dyn UrlRepository> = Arc::new(PgUrlRepository::new(Arc::new(pool)));

    let (cache, rate_limits) = connect_redis_backends(&config).await;

    let (usage_tx, usage_rx) = mpsc::channel(config.usage_queue_capacity);
    tokio::spawn(run_usage_worker(usage_rx, urls.clone()));
    tracing::info!("Usage worker started");

    let rebuilder = Arc::new(HotSetRebuilder::new(
        urls.clone(),
        cache.clone(),
        config.hot_cache_size,
        Duration::from_secs(config.hot_cache_ttl_seconds),
    ));
    tokio::spawn(rebuilder.run(Duration::from_secs(config.hot_cache_rebuild_seconds)));
    tracing::info!("Hot-set rebuild job started");

    let passwords = Arc::new(HmacPasswordVerifier::new(config.password_pepper.clone()));

    let shorten_service = Arc::new(ShortenService::new(
        urls.clone(),
        passwords.clone(),
        config.base_url.clone(),
    ));
    let redeem_service = Arc::new(RedeemService::new(
        urls.clone(),
        cache.clone(),
        passwords,
        usage_tx.clone(),
    ));
    let auth_service = Arc::new(AuthService::new(config.token_signing_secret.clone()));
    let quota_service = Arc::new(QuotaService::new(
        rate_limits,
        config.urls_per_day,
        config.urls_per_day_authenticated,
    ));

    let state = AppState {
        shorten_service,
        redeem_service,
        auth_service,
        quota_service,
        urls,
        cache,
        usage_sender: usage_tx,
        behind_proxy: config.behind_proxy,
    };

    let app = NormalizePathLayer::trim_trailing_slash().layer(app_router(state));

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

/// Selects cache and quota counter backends.
///
/// With Redis configured, both run against it; a failed connection degrades
/// to the process-local implementations rather than refusing to start.
async fn connect_redis_backends(config: &Config) -> (Arc<dyn HotSetCache>, Arc<dyn RateLimitStore>) {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Redis not configured, using process-local cache and quota counters");
        return (
            Arc::new(MemoryHotSetCache::new()),
            Arc::new(MemoryRateLimitStore::new()),
        );
    };

    let cache: Arc<dyn HotSetCache> = match RedisHotSetCache::connect(redis_url).await {
        Ok(redis) => {
            tracing::info!("Hot-set cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect Redis cache: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    };

    let rate_limits: Arc<dyn RateLimitStore> = match RedisRateLimitStore::connect(redis_url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(
                "Failed to connect Redis counters: {}. Quota counters are process-local.",
                e
            );
            Arc::new(MemoryRateLimitStore::new())
        }
    };

    (cache, rate_limits)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
