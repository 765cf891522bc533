//! Redemption-time validation.
//!
//! A pure decision function over a stored record and the redemption-time
//! inputs. Checks run in a fixed order and the first failure wins: temporal
//! window, then usage cap, then password. Callers re-run this on every
//! redemption, including cache hits: the hot-set cache only skips the store
//! read, never the correctness check.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::entities::ShortUrl;
use crate::utils::password::PasswordVerifier;

/// Reasons a redemption is denied.
///
/// Terminal for the request; retrying without different input cannot succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("This URL is not active yet.")]
    NotYetActive,
    #[error("This URL has expired.")]
    Expired,
    #[error("This URL has reached its usage limit.")]
    UsageLimitReached,
    #[error("This URL requires a password.")]
    PasswordRequired,
    #[error("The provided password is incorrect.")]
    PasswordIncorrect,
}

impl Denial {
    /// Stable machine-readable code for the boundary layer.
    pub fn code(&self) -> &'static str {
        match self {
            Denial::NotYetActive => "not_yet_active",
            Denial::Expired => "expired",
            Denial::UsageLimitReached => "usage_limit_reached",
            Denial::PasswordRequired => "password_required",
            Denial::PasswordIncorrect => "password_incorrect",
        }
    }
}

/// Decides whether `record` may be redeemed at `now` with `supplied_password`.
///
/// Total over every reachable record state and deterministic for a given
/// `(record, now, password)` triple. No side effects; the usage counter is
/// incremented elsewhere, after this returns `Ok`.
pub fn check_redeemable(
    record: &ShortUrl,
    now: DateTime<Utc>,
    supplied_password: Option<&str>,
    passwords: &dyn PasswordVerifier,
) -> Result<(), Denial> {
    if record.not_yet_active(now) {
        return Err(Denial::NotYetActive);
    }

    if record.expired(now) {
        return Err(Denial::Expired);
    }

    if record.usage_exhausted() {
        return Err(Denial::UsageLimitReached);
    }

    if record.requires_password() {
        let hash = record.password_hash.as_deref().unwrap_or_default();

        let Some(supplied) = supplied_password.filter(|p| !p.is_empty()) else {
            return Err(Denial::PasswordRequired);
        };

        if !passwords.verify(supplied, hash) {
            return Err(Denial::PasswordIncorrect);
        }
    }

    Ok(())
}
