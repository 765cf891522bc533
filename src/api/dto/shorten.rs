//! DTOs for the shorten endpoint.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_with::{TimestampMilliSeconds, serde_as};
use std::sync::LazyLock;
use validator::Validate;

use crate::application::services::CreateShortUrl;

/// Alias charset: alphanumeric plus `.`, `_`, `-`.
static ALIAS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._-]+$").unwrap());

/// Request to shorten a URL.
///
/// The validity window is expressed as millisecond epoch timestamps; absent
/// fields leave that side of the window open. `maxUses` of zero (the default)
/// means unlimited.
#[serde_as]
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    /// The target URL to shorten (must be valid HTTP/HTTPS).
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,

    /// Optional user-chosen alias used as the identifier.
    #[validate(length(min = 3, max = 50))]
    #[validate(regex(path = "*ALIAS_REGEX"))]
    pub alias: Option<String>,

    /// Maximum redemptions; omit or pass 0 for unlimited. `-1` is accepted
    /// as an explicit unlimited sentinel.
    #[validate(range(min = -1))]
    pub max_uses: Option<i64>,

    /// Optional password gating redemption.
    #[validate(length(min = 1, max = 128))]
    pub password: Option<String>,

    /// Window open, unix-epoch milliseconds.
    #[serde_as(as = "Option<TimestampMilliSeconds<i64>>")]
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,

    /// Window close, unix-epoch milliseconds.
    #[serde_as(as = "Option<TimestampMilliSeconds<i64>>")]
    #[serde(default)]
    pub valid_to: Option<DateTime<Utc>>,
}

impl ShortenRequest {
    /// Converts the validated request into the service input.
    pub fn into_create(self) -> CreateShortUrl {
        CreateShortUrl {
            target_url: self.url,
            alias: self.alias,
            max_uses: self.max_uses.unwrap_or(0),
            password: self.password,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
        }
    }
}

/// Response for a created short URL.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub identifier: String,
    pub short_url: String,
}
