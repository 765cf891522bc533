//! Standalone hot-set cache rebuild.
//!
//! The cron-job counterpart of the server's in-process rebuild task: run it
//! from a scheduler to refresh the shared Redis cache without touching the
//! serving processes.
//!
//! # Usage
//!
//! ```bash
//! # One rebuild pass, then exit
//! cargo run --bin hotcache
//!
//! # Keep rebuilding on the configured interval
//! cargo run --bin hotcache -- --watch
//! ```
//!
//! # Environment Variables
//!
//! Reads the same configuration as the server; `REDIS_URL` is required since
//! a one-shot rebuild of a process-local cache would be pointless.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use linkgate::application::services::HotSetRebuilder;
use linkgate::config;
use linkgate::domain::repositories::UrlRepository;
use linkgate::infrastructure::cache::{HotSetCache, RedisHotSetCache};
use linkgate::infrastructure::persistence::PgUrlRepository;

/// Rebuild the hot-set cache from the URL store.
#[derive(Parser)]
#[command(name = "hotcache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Keep rebuilding on the configured interval instead of exiting after
    /// one pass.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = config::load_from_env()?;

    let redis_url = config
        .redis_url
        .clone()
        .context("REDIS_URL must be set: the standalone rebuild targets the shared Redis cache")?;

    let started = Instant::now();

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let urls: Arc<dyn UrlRepository> = Arc::new(PgUrlRepository::new(Arc::new(pool)));
    let cache: Arc<dyn HotSetCache> = Arc::new(RedisHotSetCache::connect(&redis_url).await?);

    let rebuilder = Arc::new(HotSetRebuilder::new(
        urls,
        cache,
        config.hot_cache_size,
        Duration::from_secs(config.hot_cache_ttl_seconds),
    ));

    if cli.watch {
        println!(
            "Rebuilding every {}s, Ctrl+C to stop",
            config.hot_cache_rebuild_seconds
        );
        rebuilder
            .run(Duration::from_secs(config.hot_cache_rebuild_seconds))
            .await;
        return Ok(());
    }

    let count = rebuilder.rebuild().await?;

    println!(
        "{} Published {} entries in {:.3}s",
        "✓".green(),
        count,
        started.elapsed().as_secs_f64()
    );

    Ok(())
}
