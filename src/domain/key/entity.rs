//! Stored API key records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::format::KeyClass;

/// Lifecycle status of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyStatus {
    #[default]
    Active,
    Inactive,
}

impl KeyStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// The opposite status
    pub fn toggled(&self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// A stored API key record.
///
/// `id`, `key`, `key_type` and `created_at` are fixed at creation.
/// `name`, `usage`, `usage_limit` and `status` may change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    id: String,
    name: String,
    key: String,
    key_type: KeyClass,
    usage: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage_limit: Option<u64>,
    status: KeyStatus,
    created_at: DateTime<Utc>,
}

impl ApiKeyRecord {
    /// Creates a record for a freshly issued key: zero usage, active,
    /// created now, with a generated id.
    pub fn new(name: impl Into<String>, key: impl Into<String>, key_type: KeyClass) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            key: key.into(),
            key_type,
            usage: 0,
            usage_limit: None,
            status: KeyStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn with_usage_limit(mut self, limit: u64) -> Self {
        self.usage_limit = Some(limit);
        self
    }

    pub fn with_status(mut self, status: KeyStatus) -> Self {
        self.status = status;
        self
    }

    /// Overrides the creation timestamp. Only meaningful before the
    /// record is persisted.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Rebuilds a record from its stored parts
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: String,
        name: String,
        key: String,
        key_type: KeyClass,
        usage: u64,
        usage_limit: Option<u64>,
        status: KeyStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            key,
            key_type,
            usage,
            usage_limit,
            status,
            created_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn key_type(&self) -> KeyClass {
        self.key_type
    }

    pub fn usage(&self) -> u64 {
        self.usage
    }

    pub fn usage_limit(&self) -> Option<u64> {
        self.usage_limit
    }

    pub fn status(&self) -> KeyStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_usage(&mut self, usage: u64) {
        self.usage = usage;
    }

    pub fn set_usage_limit(&mut self, limit: Option<u64>) {
        self.usage_limit = limit;
    }

    pub fn set_status(&mut self, status: KeyStatus) {
        self.status = status;
    }
}

/// Partial update for the mutable fields of a record.
///
/// `None` fields are left unchanged. The immutable fields (`id`, `key`,
/// `key_type`, `created_at`) have no counterpart here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyChanges {
    pub name: Option<String>,
    pub usage: Option<u64>,
    pub usage_limit: Option<u64>,
    pub status: Option<KeyStatus>,
}

impl KeyChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_usage(mut self, usage: u64) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn with_usage_limit(mut self, limit: u64) -> Self {
        self.usage_limit = Some(limit);
        self
    }

    pub fn with_status(mut self, status: KeyStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.usage.is_none()
            && self.usage_limit.is_none()
            && self.status.is_none()
    }

    /// Applies the changes to a record in place
    pub fn apply(&self, record: &mut ApiKeyRecord) {
        if let Some(name) = &self.name {
            record.set_name(name.clone());
        }
        if let Some(usage) = self.usage {
            record.set_usage(usage);
        }
        if let Some(limit) = self.usage_limit {
            record.set_usage_limit(Some(limit));
        }
        if let Some(status) = self.status {
            record.set_status(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_record_defaults() {
        let record = ApiKeyRecord::new("CI pipeline", "keymzanzidev_aaa", KeyClass::Dev);

        assert!(!record.id().is_empty());
        assert_eq!(record.name(), "CI pipeline");
        assert_eq!(record.key(), "keymzanzidev_aaa");
        assert_eq!(record.key_type(), KeyClass::Dev);
        assert_eq!(record.usage(), 0);
        assert_eq!(record.usage_limit(), None);
        assert_eq!(record.status(), KeyStatus::Active);
        assert!(record.is_active());
    }

    #[test]
    fn test_records_get_distinct_ids() {
        let a = ApiKeyRecord::new("a", "k1", KeyClass::Dev);
        let b = ApiKeyRecord::new("b", "k2", KeyClass::Dev);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_with_usage_limit() {
        let record =
            ApiKeyRecord::new("limited", "k", KeyClass::Prod).with_usage_limit(1000);
        assert_eq!(record.usage_limit(), Some(1000));
    }

    #[test]
    fn test_status_toggled() {
        assert_eq!(KeyStatus::Active.toggled(), KeyStatus::Inactive);
        assert_eq!(KeyStatus::Inactive.toggled(), KeyStatus::Active);
    }

    #[test]
    fn test_status_parse_round_trip() {
        assert_eq!(KeyStatus::parse("active"), Some(KeyStatus::Active));
        assert_eq!(KeyStatus::parse("inactive"), Some(KeyStatus::Inactive));
        assert_eq!(KeyStatus::parse("revoked"), None);
        assert_eq!(KeyStatus::parse(KeyStatus::Active.as_str()), Some(KeyStatus::Active));
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&KeyStatus::Active).unwrap(),
            "\"active\""
        );
        assert_eq!(
            serde_json::to_string(&KeyStatus::Inactive).unwrap(),
            "\"inactive\""
        );
    }

    #[test]
    fn test_mutators() {
        let mut record = ApiKeyRecord::new("old", "k", KeyClass::Dev);
        record.set_name("new");
        record.set_usage(5);
        record.set_status(KeyStatus::Inactive);
        record.set_usage_limit(Some(10));

        assert_eq!(record.name(), "new");
        assert_eq!(record.usage(), 5);
        assert_eq!(record.status(), KeyStatus::Inactive);
        assert_eq!(record.usage_limit(), Some(10));
    }

    #[test]
    fn test_changes_apply_only_set_fields() {
        let mut record = ApiKeyRecord::new("name", "k", KeyClass::Prod).with_usage_limit(3);
        let created = record.created_at();

        let changes = KeyChanges::new().rename("renamed").with_usage(7);
        changes.apply(&mut record);

        assert_eq!(record.name(), "renamed");
        assert_eq!(record.usage(), 7);
        assert_eq!(record.usage_limit(), Some(3));
        assert_eq!(record.status(), KeyStatus::Active);
        assert_eq!(record.created_at(), created);
    }

    #[test]
    fn test_changes_is_empty() {
        assert!(KeyChanges::new().is_empty());
        assert!(!KeyChanges::new().rename("x").is_empty());
        assert!(!KeyChanges::new().with_status(KeyStatus::Inactive).is_empty());
    }

    #[test]
    fn test_with_created_at() {
        let ts = Utc::now() - Duration::days(2);
        let record = ApiKeyRecord::new("n", "k", KeyClass::Dev).with_created_at(ts);
        assert_eq!(record.created_at(), ts);
    }

    #[test]
    fn test_record_serde_shape() {
        let record = ApiKeyRecord::new("serde", "keymzanzidev_x", KeyClass::Dev);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["name"], "serde");
        assert_eq!(json["key_type"], "dev");
        assert_eq!(json["status"], "active");
        assert_eq!(json["usage"], 0);
        // absent limit is omitted entirely
        assert!(json.get("usage_limit").is_none());
    }
}
