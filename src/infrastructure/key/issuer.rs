//! API key issuance

use std::sync::Arc;

use rand::Rng;
use tracing::info;

use crate::domain::key::{ApiKeyRecord, KeyClass, KeyStore, KEY_PREFIX};
use crate::domain::DomainError;

/// Length of the generated random tail
pub const TAIL_LEN: usize = 28;

const TAIL_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Issues new API keys and inserts their records into the store.
///
/// Tails are drawn from the OS-seeded CSPRNG, one uniform draw per
/// character so no alphabet position is favored.
#[derive(Debug)]
pub struct KeyIssuer {
    store: Arc<dyn KeyStore>,
    tail_len: usize,
}

impl KeyIssuer {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self {
            store,
            tail_len: TAIL_LEN,
        }
    }

    /// Issues a key of the given class and persists its record.
    ///
    /// An empty name (after trimming) is rejected before any store
    /// write. A store rejection propagates and nothing is returned.
    pub async fn issue(&self, name: &str, class: KeyClass) -> Result<ApiKeyRecord, DomainError> {
        self.issue_with_limit(name, class, None).await
    }

    /// Same as [`issue`](Self::issue) with an optional usage limit on
    /// the new record.
    pub async fn issue_with_limit(
        &self,
        name: &str,
        class: KeyClass,
        usage_limit: Option<u64>,
    ) -> Result<ApiKeyRecord, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("Key name must not be empty"));
        }

        let key = self.generate_key(class);
        let mut record = ApiKeyRecord::new(name, key, class);
        if let Some(limit) = usage_limit {
            record = record.with_usage_limit(limit);
        }

        let created = self.store.create(record).await?;
        info!(id = %created.id(), class = %class, "API key issued");
        Ok(created)
    }

    fn generate_key(&self, class: KeyClass) -> String {
        let mut rng = rand::thread_rng();
        let tail: String = (0..self.tail_len)
            .map(|_| {
                let idx = rng.gen_range(0..TAIL_ALPHABET.len());
                TAIL_ALPHABET[idx] as char
            })
            .collect();
        format!("{}{}_{}", KEY_PREFIX, class.tag(), tail)
    }
}

/// Builds a key string with a fixed tail. Deterministic keys for tests
/// and seed data; the tail must still satisfy the format rule.
pub fn key_with_tail(class: KeyClass, tail: &str) -> String {
    format!("{}{}_{}", KEY_PREFIX, class.tag(), tail)
}
