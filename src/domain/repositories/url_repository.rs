//! Repository trait for shortened URL data access.

use crate::domain::entities::{NewShortUrl, ShortUrl};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for the persistent URL store.
///
/// The store is the single source of truth. Two operations carry real
/// atomicity requirements: [`create`](UrlRepository::create) is a conditional
/// write (insert-if-absent) forming the allocation commit point, and
/// [`increment_uses`](UrlRepository::increment_uses) is a store-side atomic
/// add. Everything else may read eventually-consistent state.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUrlRepository`] - PostgreSQL
/// - [`crate::infrastructure::persistence::MemoryUrlRepository`] - in-memory,
///   for tests and cache-less development
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Creates a new record if and only if the identifier is absent.
    ///
    /// This is the allocation commit point: a second writer racing on the
    /// same identifier must observe a write conflict here, not silently
    /// overwrite.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AliasTaken`] when the identifier already exists,
    /// [`AppError::Internal`] on database errors.
    async fn create(&self, new_url: NewShortUrl) -> Result<ShortUrl, AppError>;

    /// Finds a record by its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<ShortUrl>, AppError>;

    /// Atomically increments the usage counter by one.
    ///
    /// Store-side add, never a read-modify-write from a caller snapshot, so
    /// concurrent redemptions of the same identifier cannot lose updates.
    /// Incrementing an unknown identifier is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn increment_uses(&self, identifier: &str) -> Result<(), AppError>;

    /// Lists records ordered by `current_uses` descending.
    ///
    /// Pages through the popularity index; used exclusively by the hot-set
    /// cache rebuild.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn top_used(&self, limit: i64, offset: i64) -> Result<Vec<ShortUrl>, AppError>;
}
