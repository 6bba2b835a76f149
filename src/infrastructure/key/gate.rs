//! Authorization gate for API key protected endpoints
//!
//! Runs a fixed sequence of checks against the raw `Authorization`
//! header: extract, format check, active-key lookup. Each step can only
//! deny or hand off to the next; nothing here mutates the store.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::key::{classify, ApiKeyRecord, KeyClass, KeyStore};
use crate::infrastructure::observability::record_gate_decision;

/// Positive authorization outcome.
///
/// The record is the authority for everything downstream; in particular
/// the key class is read from it, not re-derived from the string.
#[derive(Debug, Clone)]
pub struct AllowedKey {
    record: ApiKeyRecord,
}

impl AllowedKey {
    pub fn record(&self) -> &ApiKeyRecord {
        &self.record
    }

    pub fn class(&self) -> KeyClass {
        self.record.key_type()
    }
}

/// Why a request was denied.
///
/// The distinction exists for logs and metrics only; all reasons map to
/// one identical response shape at the API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No Authorization header on the request
    MissingHeader,
    /// Credential does not match the canonical key shape
    InvalidFormat,
    /// No active record stores this exact key string
    InvalidOrInactiveKey,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_header",
            Self::InvalidFormat => "invalid_format",
            Self::InvalidOrInactiveKey => "invalid_or_inactive_key",
        }
    }
}

#[derive(Debug)]
pub struct AuthorizationGate {
    store: Arc<dyn KeyStore>,
}

impl AuthorizationGate {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    /// Authorizes a request from its raw `Authorization` header value.
    /// `None` means the header was absent.
    ///
    /// Fail-closed: a store error during lookup denies, it never allows.
    pub async fn authorize(&self, header: Option<&str>) -> Result<AllowedKey, DenyReason> {
        let raw = match header {
            Some(value) => value,
            None => return Err(self.deny(DenyReason::MissingHeader)),
        };

        let candidate = strip_bearer(raw);

        if classify(candidate).is_none() {
            return Err(self.deny(DenyReason::InvalidFormat));
        }

        let found = match self.store.find_by_key(candidate).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Key lookup failed, denying request");
                return Err(self.deny(DenyReason::InvalidOrInactiveKey));
            }
        };

        match found {
            Some(record)
                if record.is_active()
                    && constant_time_compare(candidate, record.key()) =>
            {
                debug!(id = %record.id(), class = %record.key_type(), "Request authorized");
                record_gate_decision("allow", record.key_type().tag());
                Ok(AllowedKey { record })
            }
            _ => Err(self.deny(DenyReason::InvalidOrInactiveKey)),
        }
    }

    fn deny(&self, reason: DenyReason) -> DenyReason {
        debug!(reason = reason.as_str(), "Request denied");
        record_gate_decision("deny", reason.as_str());
        reason
    }
}

/// Strips a single leading `Bearer ` scheme tag. The tag is optional;
/// a bare key is accepted as-is.
fn strip_bearer(value: &str) -> &str {
    match value.strip_prefix("Bearer ") {
        Some(rest) => rest.trim(),
        None => value.trim(),
    }
}

/// Compares two key strings without short-circuiting on the first
/// differing byte.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::key::{ApiKeyRecord, KeyStatus, MockKeyStore};

    const ACTIVE_DEV_KEY: &str = "keymzanzidev_bbbbbbbbbbbbbbbbbbbb";
    const INACTIVE_PROD_KEY: &str = "keymzanziprod_aaaaaaaaaaaaaaaaaaaaaa";

    async fn gate_with_keys() -> (AuthorizationGate, Arc<MockKeyStore>) {
        let store = Arc::new(MockKeyStore::new());

        store
            .create(ApiKeyRecord::new("dev", ACTIVE_DEV_KEY, KeyClass::Dev))
            .await
            .unwrap();
        store
            .create(
                ApiKeyRecord::new("prod", INACTIVE_PROD_KEY, KeyClass::Prod)
                    .with_status(KeyStatus::Inactive),
            )
            .await
            .unwrap();

        (AuthorizationGate::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_missing_header_denies_even_with_keys_stored() {
        let (gate, _) = gate_with_keys().await;

        let err = gate.authorize(None).await.unwrap_err();
        assert_eq!(err, DenyReason::MissingHeader);
    }

    #[tokio::test]
    async fn test_malformed_candidates_deny_without_store_lookup() {
        let (gate, store) = gate_with_keys().await;

        for candidate in ["abc", "keymzanziprod_short", ""] {
            let err = gate.authorize(Some(candidate)).await.unwrap_err();
            assert_eq!(err, DenyReason::InvalidFormat, "candidate: {:?}", candidate);
        }

        assert_eq!(store.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_active_dev_key_allowed_with_class_from_record() {
        let (gate, _) = gate_with_keys().await;

        let allowed = gate.authorize(Some(ACTIVE_DEV_KEY)).await.unwrap();
        assert_eq!(allowed.class(), KeyClass::Dev);
        assert_eq!(allowed.record().key(), ACTIVE_DEV_KEY);
    }

    #[tokio::test]
    async fn test_bearer_prefix_is_stripped() {
        let (gate, _) = gate_with_keys().await;

        let header = format!("Bearer {}", ACTIVE_DEV_KEY);
        let allowed = gate.authorize(Some(&header)).await.unwrap();
        assert_eq!(allowed.class(), KeyClass::Dev);
    }

    #[tokio::test]
    async fn test_inactive_key_denied() {
        let (gate, _) = gate_with_keys().await;

        let err = gate.authorize(Some(INACTIVE_PROD_KEY)).await.unwrap_err();
        assert_eq!(err, DenyReason::InvalidOrInactiveKey);
    }

    #[tokio::test]
    async fn test_unknown_well_formed_key_denied() {
        let (gate, store) = gate_with_keys().await;

        let unknown = "keymzanzidev_cccccccccccccccccccc";
        let err = gate.authorize(Some(unknown)).await.unwrap_err();
        assert_eq!(err, DenyReason::InvalidOrInactiveKey);
        // this one did reach the lookup step
        assert_eq!(store.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_denies_not_allows() {
        let (gate, store) = gate_with_keys().await;
        store.set_should_fail(true).await;

        let err = gate.authorize(Some(ACTIVE_DEV_KEY)).await.unwrap_err();
        assert_eq!(err, DenyReason::InvalidOrInactiveKey);
    }

    #[tokio::test]
    async fn test_allow_after_toggle_back() {
        let (gate, store) = gate_with_keys().await;

        let record = store.find_by_key(ACTIVE_DEV_KEY).await.unwrap().unwrap();
        store
            .toggle_status(record.id(), KeyStatus::Active)
            .await
            .unwrap();
        assert!(gate.authorize(Some(ACTIVE_DEV_KEY)).await.is_err());

        store
            .toggle_status(record.id(), KeyStatus::Inactive)
            .await
            .unwrap();
        assert!(gate.authorize(Some(ACTIVE_DEV_KEY)).await.is_ok());
    }

    #[test]
    fn test_strip_bearer() {
        assert_eq!(strip_bearer("Bearer abc"), "abc");
        assert_eq!(strip_bearer("Bearer  abc "), "abc");
        assert_eq!(strip_bearer("abc"), "abc");
        assert_eq!(strip_bearer(" abc "), "abc");
        // lowercase scheme is not a recognized tag
        assert_eq!(strip_bearer("bearer abc"), "bearer abc");
        // only the first tag is stripped
        assert_eq!(strip_bearer("Bearer Bearer abc"), "Bearer abc");
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("same", "same"));
        assert!(!constant_time_compare("same", "different"));
        assert!(!constant_time_compare("same", "sama"));
        assert!(!constant_time_compare("", "x"));
        assert!(constant_time_compare("", ""));
    }
}
