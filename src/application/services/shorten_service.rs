//! Shortened URL creation service.
//!
//! Owns identifier allocation: user aliases are claimed after an existence
//! check, random identifiers come from a 128-bit seed pushed through the
//! base62 codec. Either way the store's conditional insert is the commit
//! point, so a lost race is always observed as a write conflict rather than
//! an overwrite.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::entities::{NewShortUrl, ShortUrl};
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;
use crate::utils::base62;
use crate::utils::password::HmacPasswordVerifier;
use crate::utils::seed::random_seed;

/// Cap on random-identifier allocation attempts before giving up.
const MAX_ATTEMPTS: usize = 10;

/// Creation input after boundary validation and millisecond conversion.
#[derive(Debug, Clone)]
pub struct CreateShortUrl {
    pub target_url: String,
    pub alias: Option<String>,
    pub max_uses: i64,
    pub password: Option<String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
}

/// Result of a successful creation.
#[derive(Debug, Clone)]
pub struct CreatedShortUrl {
    pub identifier: String,
    pub short_url: String,
}

/// Service for creating shortened URLs.
pub struct ShortenService {
    urls: Arc<dyn UrlRepository>,
    passwords: Arc<HmacPasswordVerifier>,
    base_url: String,
}

impl ShortenService {
    /// Creates a new shorten service.
    ///
    /// `base_url` is the public origin short URLs are built from, e.g.
    /// `https://s.example.com`.
    pub fn new(
        urls: Arc<dyn UrlRepository>,
        passwords: Arc<HmacPasswordVerifier>,
        base_url: String,
    ) -> Self {
        Self {
            urls,
            passwords,
            base_url,
        }
    }

    /// Creates a new shortened URL record.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] - target URL or validity window is invalid
    /// - [`AppError::AliasTaken`] - the requested alias already exists, or a
    ///   concurrent writer claimed it between check and insert
    /// - [`AppError::AllocationExhausted`] - random allocation collided on
    ///   every attempt
    /// - [`AppError::Internal`] - store errors
    pub async fn create_short_url(
        &self,
        request: CreateShortUrl,
    ) -> Result<CreatedShortUrl, AppError> {
        validate_target_url(&request.target_url)?;
        validate_window(request.valid_from, request.valid_to)?;

        let password_hash = request
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| self.passwords.hash(p));

        let record = if let Some(alias) = request.alias.clone() {
            self.create_with_alias(alias, &request, password_hash).await?
        } else {
            self.create_with_random_identifier(&request, password_hash)
                .await?
        };

        Ok(CreatedShortUrl {
            short_url: self.short_url(&record.identifier),
            identifier: record.identifier,
        })
    }

    /// Constructs the fully-qualified short URL for an identifier.
    pub fn short_url(&self, identifier: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), identifier)
    }

    /// Claims a user-chosen alias.
    ///
    /// The existence check gives the common case a friendly error before the
    /// insert; the conditional insert still catches the narrow window where a
    /// concurrent writer claims the alias after the check.
    async fn create_with_alias(
        &self,
        alias: String,
        request: &CreateShortUrl,
        password_hash: Option<String>,
    ) -> Result<ShortUrl, AppError> {
        if self.urls.find_by_identifier(&alias).await?.is_some() {
            return Err(AppError::alias_taken(
                "Alias is not available.",
                json!({ "alias": alias }),
            ));
        }

        self.urls
            .create(new_record(alias, request, password_hash))
            .await
    }

    /// Allocates a random identifier, retrying on collision.
    async fn create_with_random_identifier(
        &self,
        request: &CreateShortUrl,
        password_hash: Option<String>,
    ) -> Result<ShortUrl, AppError> {
        for _ in 0..MAX_ATTEMPTS {
            let seed = random_seed();
            if seed == 0 {
                // encode(0) is empty; burn the attempt and draw again.
                continue;
            }

            let candidate = base62::encode(seed);

            if self.urls.find_by_identifier(&candidate).await?.is_some() {
                continue;
            }

            match self
                .urls
                .create(new_record(candidate, request, password_hash.clone()))
                .await
            {
                Ok(record) => return Ok(record),
                // Lost the race on this candidate; try a fresh one.
                Err(AppError::AliasTaken { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(AppError::allocation_exhausted(
            "Failed to allocate a unique identifier",
            json!({ "attempts": MAX_ATTEMPTS }),
        ))
    }
}

fn new_record(
    identifier: String,
    request: &CreateShortUrl,
    password_hash: Option<String>,
) -> NewShortUrl {
    NewShortUrl {
        identifier,
        target_url: request.target_url.clone(),
        max_uses: request.max_uses,
        password_hash,
        valid_from: request.valid_from,
        valid_to: request.valid_to,
    }
}

fn validate_target_url(target_url: &str) -> Result<(), AppError> {
    let parsed = url::Url::parse(target_url).map_err(|e| {
        AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
    })?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::bad_request(
            "URL scheme must be http or https",
            json!({ "scheme": parsed.scheme() }),
        ));
    }

    Ok(())
}

fn validate_window(
    valid_from: Option<DateTime<Utc>>,
    valid_to: Option<DateTime<Utc>>,
) -> Result<(), AppError> {
    if let (Some(from), Some(to)) = (valid_from, valid_to) {
        if from > to {
            return Err(AppError::bad_request(
                "validFrom must not be later than validTo",
                json!({ "valid_from": from.to_rfc3339(), "valid_to": to.to_rfc3339() }),
            ));
        }
    }

    Ok(())
}
