//! Shortened URL entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shortened URL record.
///
/// The identifier is either a random base62 token or a user-chosen alias and
/// never changes once assigned. After creation the only mutable field is
/// `current_uses`, incremented by the usage worker; expiry and usage caps are
/// enforced at redemption time rather than by deleting rows.
///
/// Serde derives exist because hot-set cache entries are JSON snapshots of
/// this type taken at rebuild time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortUrl {
    pub identifier: String,
    pub target_url: String,
    /// Maximum redemptions; `<= 0` means unlimited.
    pub max_uses: i64,
    /// Monotonically increasing redemption count.
    pub current_uses: i64,
    /// Opaque password hash; `None` means the link is open.
    pub password_hash: Option<String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShortUrl {
    /// Returns true if the record has no usage cap.
    pub fn is_unlimited(&self) -> bool {
        self.max_uses <= 0
    }

    /// Returns true if a finite usage cap has been reached.
    ///
    /// Once true this never becomes false again: the counter only grows.
    pub fn usage_exhausted(&self) -> bool {
        !self.is_unlimited() && self.current_uses >= self.max_uses
    }

    /// Returns true if the validity window has not opened at `now`.
    pub fn not_yet_active(&self, now: DateTime<Utc>) -> bool {
        self.valid_from.is_some_and(|from| now < from)
    }

    /// Returns true if the validity window has closed at `now`.
    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_to.is_some_and(|to| now > to)
    }

    /// Returns true if the link requires a password.
    pub fn requires_password(&self) -> bool {
        self.password_hash.as_deref().is_some_and(|h| !h.is_empty())
    }
}

/// Input data for creating a new record.
#[derive(Debug, Clone)]
pub struct NewShortUrl {
    pub identifier: String,
    pub target_url: String,
    pub max_uses: i64,
    pub password_hash: Option<String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
}
