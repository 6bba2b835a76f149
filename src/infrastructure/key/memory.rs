//! In-memory key store implementation

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::key::{ApiKeyRecord, KeyChanges, KeyStatus, KeyStore};
use crate::domain::DomainError;

/// In-memory implementation of [`KeyStore`].
///
/// Enforces the same uniqueness rule as the Postgres backend: one
/// record per key string.
#[derive(Debug, Default)]
pub struct InMemoryKeyStore {
    records: RwLock<HashMap<String, ApiKeyRecord>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyStore for InMemoryKeyStore {
    async fn list(&self) -> Result<Vec<ApiKeyRecord>, DomainError> {
        let records = self.records.read().await;
        let mut all: Vec<ApiKeyRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(a.id()))
        });
        Ok(all)
    }

    async fn get(&self, id: &str) -> Result<Option<ApiKeyRecord>, DomainError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<ApiKeyRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records.values().find(|r| r.key() == key).cloned())
    }

    async fn create(&self, record: ApiKeyRecord) -> Result<ApiKeyRecord, DomainError> {
        let mut records = self.records.write().await;

        if records.contains_key(record.id()) {
            return Err(DomainError::conflict(format!(
                "API key with ID '{}' already exists",
                record.id()
            )));
        }

        if records.values().any(|r| r.key() == record.key()) {
            return Err(DomainError::conflict(
                "An API key with this key string already exists",
            ));
        }

        records.insert(record.id().to_string(), record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, changes: KeyChanges) -> Result<ApiKeyRecord, DomainError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found(format!("API key '{}' not found", id)))?;
        changes.apply(record);
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        Ok(self.records.write().await.remove(id).is_some())
    }

    async fn toggle_status(
        &self,
        id: &str,
        current: KeyStatus,
    ) -> Result<KeyStatus, DomainError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found(format!("API key '{}' not found", id)))?;
        let new_status = current.toggled();
        record.set_status(new_status);
        Ok(new_status)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.records.read().await.len())
    }
}
