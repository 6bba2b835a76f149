//! Usage accounting for authorized requests
//!
//! Runs strictly after the authorization gate. The gate never reads or
//! writes usage counters; this recorder owns that concern.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::key::{ApiKeyRecord, KeyChanges, KeyStore};

/// Outcome of recording one authorized request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageDecision {
    /// Usage was counted; carries the new count
    Recorded { usage: u64 },
    /// The key is at or over its limit and enforcement is on
    LimitExceeded { usage: u64, limit: u64 },
}

/// Increments per-key usage counters, optionally enforcing limits.
///
/// With enforcement off the recorder only counts, matching the
/// dashboard counter semantics. With enforcement on, a key at or over
/// its limit is refused before the counter moves.
#[derive(Debug)]
pub struct UsageRecorder {
    store: Arc<dyn KeyStore>,
    enforce_limits: bool,
    default_limit: Option<u64>,
}

impl UsageRecorder {
    pub fn new(store: Arc<dyn KeyStore>, enforce_limits: bool, default_limit: Option<u64>) -> Self {
        Self {
            store,
            enforce_limits,
            default_limit,
        }
    }

    /// Records one request against the key.
    ///
    /// A store failure during the increment is logged and tolerated;
    /// the request proceeds with the counter unchanged.
    // TODO: push the increment into the stores as an atomic
    // read-modify-write instead of update-with-computed-value.
    pub async fn record(&self, record: &ApiKeyRecord) -> UsageDecision {
        let current = record.usage();

        if self.enforce_limits {
            if let Some(limit) = record.usage_limit().or(self.default_limit) {
                if current >= limit {
                    debug!(id = %record.id(), usage = current, limit, "Usage limit reached");
                    return UsageDecision::LimitExceeded {
                        usage: current,
                        limit,
                    };
                }
            }
        }

        let next = current + 1;
        let changes = KeyChanges::new().with_usage(next);
        if let Err(e) = self.store.update(record.id(), changes).await {
            warn!(id = %record.id(), error = %e, "Failed to record key usage");
        }

        UsageDecision::Recorded { usage: next }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::key::{ApiKeyRecord, KeyClass, MockKeyStore};

    async fn store_with_key(limit: Option<u64>) -> (Arc<MockKeyStore>, ApiKeyRecord) {
        let store = Arc::new(MockKeyStore::new());
        let mut record = ApiKeyRecord::new("counted", "keymzanzidev_tail", KeyClass::Dev);
        if let Some(l) = limit {
            record = record.with_usage_limit(l);
        }
        let record = store.create(record).await.unwrap();
        (store, record)
    }

    #[tokio::test]
    async fn test_record_increments_usage() {
        let (store, record) = store_with_key(None).await;
        let recorder = UsageRecorder::new(store.clone(), false, None);

        let decision = recorder.record(&record).await;
        assert_eq!(decision, UsageDecision::Recorded { usage: 1 });

        let stored = store.get(record.id()).await.unwrap().unwrap();
        assert_eq!(stored.usage(), 1);
    }

    #[tokio::test]
    async fn test_no_enforcement_counts_past_limit() {
        let (store, record) = store_with_key(Some(1)).await;
        let recorder = UsageRecorder::new(store.clone(), false, None);

        recorder.record(&record).await;
        let stored = store.get(record.id()).await.unwrap().unwrap();
        let decision = recorder.record(&stored).await;

        assert_eq!(decision, UsageDecision::Recorded { usage: 2 });
    }

    #[tokio::test]
    async fn test_enforcement_refuses_at_limit() {
        let (store, record) = store_with_key(Some(1)).await;
        let recorder = UsageRecorder::new(store.clone(), true, None);

        assert_eq!(
            recorder.record(&record).await,
            UsageDecision::Recorded { usage: 1 }
        );

        let stored = store.get(record.id()).await.unwrap().unwrap();
        assert_eq!(
            recorder.record(&stored).await,
            UsageDecision::LimitExceeded { usage: 1, limit: 1 }
        );

        // counter did not move on the refused request
        let after = store.get(record.id()).await.unwrap().unwrap();
        assert_eq!(after.usage(), 1);
    }

    #[tokio::test]
    async fn test_default_limit_applies_when_record_has_none() {
        let (store, record) = store_with_key(None).await;
        let recorder = UsageRecorder::new(store.clone(), true, Some(1));

        recorder.record(&record).await;
        let stored = store.get(record.id()).await.unwrap().unwrap();

        assert!(matches!(
            recorder.record(&stored).await,
            UsageDecision::LimitExceeded { limit: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_store_failure_is_tolerated() {
        let (store, record) = store_with_key(None).await;
        let recorder = UsageRecorder::new(store.clone(), false, None);
        store.set_should_fail(true).await;

        let decision = recorder.record(&record).await;
        assert_eq!(decision, UsageDecision::Recorded { usage: 1 });
    }
}
