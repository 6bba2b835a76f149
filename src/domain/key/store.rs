//! Persistence contract for API key records

use std::fmt::Debug;

use async_trait::async_trait;

use super::entity::{ApiKeyRecord, KeyChanges, KeyStatus};
use crate::domain::DomainError;

/// Storage contract for API key records.
///
/// `list` orders newest `created_at` first. `delete` is idempotent:
/// removing an absent id succeeds and reports `false`. Duplicate key
/// strings and backend failures surface as `DomainError::Conflict` /
/// `DomainError::Storage`.
#[async_trait]
pub trait KeyStore: Send + Sync + Debug {
    /// All records, newest first
    async fn list(&self) -> Result<Vec<ApiKeyRecord>, DomainError>;

    async fn get(&self, id: &str) -> Result<Option<ApiKeyRecord>, DomainError>;

    /// Exact byte-equality lookup on the full key string
    async fn find_by_key(&self, key: &str) -> Result<Option<ApiKeyRecord>, DomainError>;

    /// Inserts exactly the given record
    async fn create(&self, record: ApiKeyRecord) -> Result<ApiKeyRecord, DomainError>;

    /// Applies a partial update to the mutable fields of the record.
    /// Absent ids are `DomainError::NotFound`.
    async fn update(&self, id: &str, changes: KeyChanges) -> Result<ApiKeyRecord, DomainError>;

    /// Removes the record; returns whether one existed
    async fn delete(&self, id: &str) -> Result<bool, DomainError>;

    /// Flips the status from the caller-observed one and returns the
    /// new status. Absent ids are `DomainError::NotFound`.
    async fn toggle_status(&self, id: &str, current: KeyStatus)
        -> Result<KeyStatus, DomainError>;

    async fn count(&self) -> Result<usize, DomainError>;
}
