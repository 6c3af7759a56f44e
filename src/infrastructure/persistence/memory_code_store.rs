//! Process-local implementation of the code store.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::entities::ShortUrlRecord;
use crate::domain::repositories::{CodeStore, StoreError};

/// [`CodeStore`] kept in a `HashMap` behind an async lock.
///
/// Offers the same uniqueness guarantee as the database table within one
/// process. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryCodeStore {
    records: RwLock<HashMap<String, ShortUrlRecord>>,
}

impl InMemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a complete record as-is, replacing any record with the same code.
    ///
    /// Allows seeding records with arbitrary timestamps and counters.
    pub async fn put_record(&self, record: ShortUrlRecord) {
        self.records
            .write()
            .await
            .insert(record.code.clone(), record);
    }

    /// Returns a copy of the record for `code` without touching its counters.
    pub async fn get(&self, code: &str) -> Option<ShortUrlRecord> {
        self.records.read().await.get(code).cloned()
    }
}

#[async_trait]
impl CodeStore for InMemoryCodeStore {
    async fn initialize_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert(&self, code: &str, long_url: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().await;

        if records.contains_key(code) {
            return Err(StoreError::DuplicateKey {
                code: code.to_string(),
            });
        }

        records.insert(
            code.to_string(),
            ShortUrlRecord::new(code.to_string(), long_url.to_string()),
        );
        Ok(())
    }

    async fn lookup(&self, code: &str) -> Result<Option<String>, StoreError> {
        let mut records = self.records.write().await;

        Ok(records.get_mut(code).map(|record| {
            record.access_count = record.access_count.saturating_add(1);
            record.last_accessed = Utc::now();
            record.long_url.clone()
        }))
    }

    async fn scan_all(&self) -> Result<Vec<ShortUrlRecord>, StoreError> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.code.cmp(&b.code)));
        Ok(records)
    }

    async fn update(&self, code: &str, long_url: &str) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;

        Ok(match records.get_mut(code) {
            Some(record) => {
                record.long_url = long_url.to_string();
                true
            }
            None => false,
        })
    }

    async fn delete(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(code).is_some())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.records.read().await.len() as i64)
    }
}
