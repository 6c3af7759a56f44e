//! Repository trait for short code storage.

use crate::domain::entities::ShortUrlRecord;
use async_trait::async_trait;

/// Errors surfaced by a [`CodeStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The code is already taken. Recovered by the allocator, never shown to clients.
    #[error("short code '{code}' already exists")]
    DuplicateKey { code: String },

    #[error("storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    #[error("schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Durable table of `code -> url` mappings.
///
/// The uniqueness constraint on `code` is the only authority for global
/// uniqueness of assigned codes.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgCodeStore`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryCodeStore`] - process-local map
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Creates the backing table if it does not exist.
    ///
    /// Safe to call repeatedly and from several processes at once.
    async fn initialize_schema(&self) -> Result<(), StoreError>;

    /// Inserts a new mapping.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if `code` is already present.
    async fn insert(&self, code: &str, long_url: &str) -> Result<(), StoreError>;

    /// Resolves a code, bumping `access_count` and `last_accessed` on a hit.
    ///
    /// `Ok(None)` means the code is unknown.
    async fn lookup(&self, code: &str) -> Result<Option<String>, StoreError>;

    /// Returns a snapshot of every stored record.
    async fn scan_all(&self) -> Result<Vec<ShortUrlRecord>, StoreError>;

    /// Rewrites the long URL of a record. Returns `false` if the code is unknown.
    async fn update(&self, code: &str, long_url: &str) -> Result<bool, StoreError>;

    /// Removes a record. Returns `true` iff a row was removed.
    async fn delete(&self, code: &str) -> Result<bool, StoreError>;

    /// Counts stored records.
    async fn count(&self) -> Result<i64, StoreError>;
}
