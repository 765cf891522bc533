//! Daily creation quota policy.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::json;

use crate::domain::entities::Actor;
use crate::domain::repositories::RateLimitStore;
use crate::error::AppError;

/// Counter keys expire after one UTC day.
const DAY_SECONDS: u64 = 86_400;

/// Per-actor, per-day creation quota.
///
/// Keys combine the actor identity with the UTC calendar date, so counters
/// reset at the day boundary without a sweeper. The limit is compared against
/// the pre-increment value of the single atomic consume, which makes the Nth
/// request (0-indexed against the limit) the last one admitted even under
/// concurrent creations.
pub struct QuotaService {
    store: Arc<dyn RateLimitStore>,
    anonymous_limit: u64,
    authenticated_limit: u64,
}

impl QuotaService {
    /// Creates a new quota service with per-population limits.
    pub fn new(store: Arc<dyn RateLimitStore>, anonymous_limit: u64, authenticated_limit: u64) -> Self {
        Self {
            store,
            anonymous_limit,
            authenticated_limit,
        }
    }

    /// The counter key for an actor on a given day.
    pub fn daily_key(actor: &Actor, date: NaiveDate) -> String {
        format!("ratelimit:{actor}:{date}")
    }

    /// Admits or rejects a creation for `actor` today.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::RateLimitReached`] when the actor's daily limit is
    /// reached, [`AppError::Internal`] when the counter backend fails.
    pub async fn check_and_consume(&self, actor: &Actor) -> Result<(), AppError> {
        self.check_and_consume_on(actor, Utc::now().date_naive())
            .await
    }

    /// Date-injectable variant backing [`Self::check_and_consume`].
    pub async fn check_and_consume_on(
        &self,
        actor: &Actor,
        date: NaiveDate,
    ) -> Result<(), AppError> {
        let limit = self.limit_for(actor);
        let key = Self::daily_key(actor, date);

        let count = self.store.consume(&key, DAY_SECONDS).await?;
        let before = count.saturating_sub(1);

        if before >= limit {
            metrics::counter!("creations_rate_limited_total").increment(1);
            return Err(AppError::rate_limited(
                "Daily limit reached.",
                json!({ "limit": limit }),
            ));
        }

        Ok(())
    }

    fn limit_for(&self, actor: &Actor) -> u64 {
        if actor.is_authenticated() {
            self.authenticated_limit
        } else {
            self.anonymous_limit
        }
    }
}
