//! Signed-in account records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verified identity attributes returned by the sign-in provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityProfile {
    /// Provider-scoped stable subject identifier
    pub subject: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl IdentityProfile {
    pub fn new(
        subject: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            email: email.into(),
            name: name.into(),
            picture: None,
        }
    }

    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }
}

/// An account that has signed in at least once.
///
/// Keyed by the provider subject. Identity bookkeeping only; API keys
/// are not scoped to accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    subject: String,
    email: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    picture: Option<String>,
    created_at: DateTime<Utc>,
    last_signin_at: DateTime<Utc>,
}

impl Account {
    /// Creates an account from a first sign-in
    pub fn from_profile(profile: &IdentityProfile) -> Self {
        let now = Utc::now();
        Self {
            subject: profile.subject.clone(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            picture: profile.picture.clone(),
            created_at: now,
            last_signin_at: now,
        }
    }

    /// Rebuilds an account from its stored parts
    pub(crate) fn from_parts(
        subject: String,
        email: String,
        name: String,
        picture: Option<String>,
        created_at: DateTime<Utc>,
        last_signin_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject,
            email,
            name,
            picture,
            created_at,
            last_signin_at,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn picture(&self) -> Option<&str> {
        self.picture.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_signin_at(&self) -> DateTime<Utc> {
        self.last_signin_at
    }

    /// Refreshes the profile fields on a repeat sign-in; `created_at`
    /// is preserved.
    pub fn refresh(&mut self, profile: &IdentityProfile) {
        self.email = profile.email.clone();
        self.name = profile.name.clone();
        self.picture = profile.picture.clone();
        self.last_signin_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> IdentityProfile {
        IdentityProfile::new("sub-123", "dev@example.com", "Dev One")
            .with_picture("https://example.com/p.png")
    }

    #[test]
    fn test_from_profile() {
        let account = Account::from_profile(&profile());

        assert_eq!(account.subject(), "sub-123");
        assert_eq!(account.email(), "dev@example.com");
        assert_eq!(account.name(), "Dev One");
        assert_eq!(account.picture(), Some("https://example.com/p.png"));
        assert_eq!(account.created_at(), account.last_signin_at());
    }

    #[test]
    fn test_refresh_preserves_created_at() {
        let mut account = Account::from_profile(&profile());
        let created = account.created_at();

        let updated = IdentityProfile::new("sub-123", "new@example.com", "Renamed");
        account.refresh(&updated);

        assert_eq!(account.email(), "new@example.com");
        assert_eq!(account.name(), "Renamed");
        assert_eq!(account.picture(), None);
        assert_eq!(account.created_at(), created);
        assert!(account.last_signin_at() >= created);
    }
}
