//! In-memory implementation of the URL store.
//!
//! Backs the integration tests and cache-less local development. Mirrors the
//! PostgreSQL implementation's contract: the identifier check and insert run
//! under one write lock, so racing writers observe the same conflict the
//! `ON CONFLICT` statement produces.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::entities::{NewShortUrl, ShortUrl};
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;

/// In-memory URL store keyed by identifier.
#[derive(Default)]
pub struct MemoryUrlRepository {
    records: RwLock<HashMap<String, ShortUrl>>,
}

impl MemoryUrlRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl UrlRepository for MemoryUrlRepository {
    async fn create(&self, new_url: NewShortUrl) -> Result<ShortUrl, AppError> {
        let mut records = self.records.write().await;

        if records.contains_key(&new_url.identifier) {
            return Err(AppError::alias_taken(
                "Identifier already exists",
                json!({ "identifier": new_url.identifier }),
            ));
        }

        let now = Utc::now();
        let record = ShortUrl {
            identifier: new_url.identifier.clone(),
            target_url: new_url.target_url,
            max_uses: new_url.max_uses,
            current_uses: 0,
            password_hash: new_url.password_hash,
            valid_from: new_url.valid_from,
            valid_to: new_url.valid_to,
            created_at: now,
            updated_at: now,
        };

        records.insert(new_url.identifier, record.clone());
        Ok(record)
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<ShortUrl>, AppError> {
        Ok(self.records.read().await.get(identifier).cloned())
    }

    async fn increment_uses(&self, identifier: &str) -> Result<(), AppError> {
        if let Some(record) = self.records.write().await.get_mut(identifier) {
            record.current_uses += 1;
            record.updated_at = Utc::now();
        }

        Ok(())
    }

    async fn top_used(&self, limit: i64, offset: i64) -> Result<Vec<ShortUrl>, AppError> {
        let records = self.records.read().await;

        let mut all: Vec<ShortUrl> = records.values().cloned().collect();
        all.sort_by(|a, b| {
            b.current_uses
                .cmp(&a.current_uses)
                .then_with(|| a.identifier.cmp(&b.identifier))
        });

        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}
