//! PostgreSQL implementation of the URL store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewShortUrl, ShortUrl};
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;

const SELECT_COLUMNS: &str = "identifier, target_url, max_uses, current_uses, password_hash, \
     valid_from, valid_to, created_at, updated_at";

/// PostgreSQL repository for shortened URL storage.
///
/// Uses runtime-bound prepared statements. The conditional insert relies on
/// `ON CONFLICT DO NOTHING` so the allocation commit point is a single atomic
/// statement, and the usage increment is a store-side `current_uses + 1`.
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
}

impl PgUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

/// Row shape shared by every query returning full records.
#[derive(sqlx::FromRow)]
struct UrlRow {
    identifier: String,
    target_url: String,
    max_uses: i64,
    current_uses: i64,
    password_hash: Option<String>,
    valid_from: Option<DateTime<Utc>>,
    valid_to: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UrlRow> for ShortUrl {
    fn from(row: UrlRow) -> Self {
        ShortUrl {
            identifier: row.identifier,
            target_url: row.target_url,
            max_uses: row.max_uses,
            current_uses: row.current_uses,
            password_hash: row.password_hash,
            valid_from: row.valid_from,
            valid_to: row.valid_to,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn create(&self, new_url: NewShortUrl) -> Result<ShortUrl, AppError> {
        let sql = format!(
            "INSERT INTO short_urls \
                 (identifier, target_url, max_uses, password_hash, valid_from, valid_to) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (identifier) DO NOTHING \
             RETURNING {SELECT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, UrlRow>(&sql)
            .bind(&new_url.identifier)
            .bind(&new_url.target_url)
            .bind(new_url.max_uses)
            .bind(&new_url.password_hash)
            .bind(new_url.valid_from)
            .bind(new_url.valid_to)
            .fetch_optional(self.pool.as_ref())
            .await?;

        // No returned row means another writer won the identifier.
        row.map(ShortUrl::from).ok_or_else(|| {
            AppError::alias_taken(
                "Identifier already exists",
                json!({ "identifier": new_url.identifier }),
            )
        })
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<ShortUrl>, AppError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM short_urls WHERE identifier = $1");

        let row = sqlx::query_as::<_, UrlRow>(&sql)
            .bind(identifier)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(ShortUrl::from))
    }

    async fn increment_uses(&self, identifier: &str) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE short_urls \
             SET current_uses = current_uses + 1, updated_at = now() \
             WHERE identifier = $1",
        )
        .bind(identifier)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn top_used(&self, limit: i64, offset: i64) -> Result<Vec<ShortUrl>, AppError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM short_urls \
             ORDER BY current_uses DESC, identifier \
             LIMIT $1 OFFSET $2"
        );

        let rows = sqlx::query_as::<_, UrlRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(ShortUrl::from).collect())
    }
}
