//! PostgreSQL implementation of the code store.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::ShortUrlRecord;
use crate::domain::repositories::{CodeStore, StoreError};
use crate::utils::db_error::is_unique_violation_on_code;

/// PostgreSQL-backed [`CodeStore`] over the `short_urls` table.
///
/// Each call checks a connection out of the shared pool, so concurrent
/// callers never share a transaction.
pub struct PgCodeStore {
    pool: Arc<PgPool>,
}

impl PgCodeStore {
    /// Creates a new store with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Returns up to `limit` records ordered by access count, most used first.
    pub async fn top_accessed(&self, limit: i64) -> Result<Vec<ShortUrlRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ShortUrlRecord>(
            r#"
            SELECT code, long_url, access_count, created, last_accessed
            FROM short_urls
            ORDER BY access_count DESC, code
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl CodeStore for PgCodeStore {
    async fn initialize_schema(&self) -> Result<(), StoreError> {
        // The migrator serializes concurrent runs with an advisory lock.
        sqlx::migrate!("./migrations").run(self.pool.as_ref()).await?;
        Ok(())
    }

    async fn insert(&self, code: &str, long_url: &str) -> Result<(), StoreError> {
        let result = sqlx::query("INSERT INTO short_urls (code, long_url) VALUES ($1, $2)")
            .bind(code)
            .bind(long_url)
            .execute(self.pool.as_ref())
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation_on_code(&e) => Err(StoreError::DuplicateKey {
                code: code.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn lookup(&self, code: &str) -> Result<Option<String>, StoreError> {
        let long_url = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE short_urls
            SET access_count = access_count + 1,
                last_accessed = NOW()
            WHERE code = $1
            RETURNING long_url
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(long_url)
    }

    async fn scan_all(&self) -> Result<Vec<ShortUrlRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ShortUrlRecord>(
            r#"
            SELECT code, long_url, access_count, created, last_accessed
            FROM short_urls
            ORDER BY created
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn update(&self, code: &str, long_url: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE short_urls SET long_url = $2 WHERE code = $1")
            .bind(code)
            .bind(long_url)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, code: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM short_urls WHERE code = $1")
            .bind(code)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM short_urls")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }
}
