//! Sign-in identity verification
//!
//! The dashboard signs in with a provider-issued ID token. The token
//! is verified server-side before a session is created.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{DomainError, IdentityProfile};
use crate::infrastructure::http_client::HttpClientTrait;

pub const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Verifies a provider-issued ID token and extracts the profile
#[async_trait]
pub trait IdentityProvider: Send + Sync + Debug {
    async fn verify(&self, id_token: &str) -> Result<IdentityProfile, DomainError>;
}

/// Google tokeninfo-backed verifier
#[derive(Debug)]
pub struct GoogleIdentityProvider<C: HttpClientTrait> {
    client: C,
    tokeninfo_url: String,
    client_id: Option<String>,
}

impl<C: HttpClientTrait> GoogleIdentityProvider<C> {
    pub fn new(client: C, client_id: Option<String>) -> Self {
        Self::with_tokeninfo_url(client, client_id, DEFAULT_TOKENINFO_URL)
    }

    pub fn with_tokeninfo_url(
        client: C,
        client_id: Option<String>,
        tokeninfo_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            tokeninfo_url: tokeninfo_url.into().trim_end_matches('/').to_string(),
            client_id,
        }
    }
}

#[async_trait]
impl<C: HttpClientTrait> IdentityProvider for GoogleIdentityProvider<C> {
    async fn verify(&self, id_token: &str) -> Result<IdentityProfile, DomainError> {
        // ID tokens are base64url, safe to pass as a query value.
        let url = format!("{}?id_token={}", self.tokeninfo_url, id_token);

        let json = self
            .client
            .get_json(&url, vec![])
            .await
            .map_err(|e| DomainError::credential(format!("ID token verification failed: {}", e)))?;

        let info: TokenInfo = serde_json::from_value(json).map_err(|e| {
            DomainError::credential(format!("Malformed tokeninfo response: {}", e))
        })?;

        if let Some(expected) = &self.client_id {
            if info.aud != *expected {
                return Err(DomainError::credential("ID token audience mismatch"));
            }
        }

        if info.email_verified.as_deref() == Some("false") {
            return Err(DomainError::credential("Email address is not verified"));
        }

        let email = info
            .email
            .ok_or_else(|| DomainError::credential("ID token is missing the email claim"))?;
        let name = info.name.unwrap_or_else(|| email.clone());

        debug!(subject = %info.sub, "ID token verified");

        let mut profile = IdentityProfile::new(info.sub, email, name);
        if let Some(picture) = info.picture {
            profile = profile.with_picture(picture);
        }
        Ok(profile)
    }
}

// Google tokeninfo response. `email_verified` is a string in this API.

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
    email_verified: Option<String>,
}

#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use super::*;

    /// Maps known ID tokens to canned profiles
    #[derive(Debug)]
    pub struct MockIdentityProvider {
        profiles: RwLock<HashMap<String, IdentityProfile>>,
    }

    impl MockIdentityProvider {
        pub fn new() -> Self {
            Self {
                profiles: RwLock::new(HashMap::new()),
            }
        }

        pub fn with_profile(self, id_token: impl Into<String>, profile: IdentityProfile) -> Self {
            self.profiles.write().unwrap().insert(id_token.into(), profile);
            self
        }
    }

    impl Default for MockIdentityProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl IdentityProvider for MockIdentityProvider {
        async fn verify(&self, id_token: &str) -> Result<IdentityProfile, DomainError> {
            self.profiles
                .read()
                .unwrap()
                .get(id_token)
                .cloned()
                .ok_or_else(|| DomainError::credential("Unknown ID token"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::mock::MockHttpClient;

    fn tokeninfo_url(token: &str) -> String {
        format!("{}?id_token={}", DEFAULT_TOKENINFO_URL, token)
    }

    #[tokio::test]
    async fn test_verify_extracts_profile() {
        let response = serde_json::json!({
            "aud": "client-123",
            "sub": "sub-1",
            "email": "dev@example.com",
            "email_verified": "true",
            "name": "Dev One",
            "picture": "https://example.com/p.png"
        });
        let client = MockHttpClient::new().with_response(tokeninfo_url("tok-1"), response);
        let provider = GoogleIdentityProvider::new(client, Some("client-123".to_string()));

        let profile = provider.verify("tok-1").await.unwrap();
        assert_eq!(profile.subject, "sub-1");
        assert_eq!(profile.email, "dev@example.com");
        assert_eq!(profile.name, "Dev One");
        assert_eq!(profile.picture.as_deref(), Some("https://example.com/p.png"));
    }

    #[tokio::test]
    async fn test_verify_rejects_audience_mismatch() {
        let response = serde_json::json!({
            "aud": "someone-else",
            "sub": "sub-1",
            "email": "dev@example.com"
        });
        let client = MockHttpClient::new().with_response(tokeninfo_url("tok-1"), response);
        let provider = GoogleIdentityProvider::new(client, Some("client-123".to_string()));

        let err = provider.verify("tok-1").await.unwrap_err();
        assert!(matches!(err, DomainError::Credential { .. }));
        assert!(err.to_string().contains("audience"));
    }

    #[tokio::test]
    async fn test_verify_skips_audience_check_without_client_id() {
        let response = serde_json::json!({
            "aud": "anything",
            "sub": "sub-1",
            "email": "dev@example.com"
        });
        let client = MockHttpClient::new().with_response(tokeninfo_url("tok-1"), response);
        let provider = GoogleIdentityProvider::new(client, None);

        assert!(provider.verify("tok-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_rejects_unverified_email() {
        let response = serde_json::json!({
            "aud": "client-123",
            "sub": "sub-1",
            "email": "dev@example.com",
            "email_verified": "false"
        });
        let client = MockHttpClient::new().with_response(tokeninfo_url("tok-1"), response);
        let provider = GoogleIdentityProvider::new(client, None);

        let err = provider.verify("tok-1").await.unwrap_err();
        assert!(err.to_string().contains("not verified"));
    }

    #[tokio::test]
    async fn test_verify_requires_email_claim() {
        let response = serde_json::json!({ "aud": "client-123", "sub": "sub-1" });
        let client = MockHttpClient::new().with_response(tokeninfo_url("tok-1"), response);
        let provider = GoogleIdentityProvider::new(client, None);

        let err = provider.verify("tok-1").await.unwrap_err();
        assert!(err.to_string().contains("email claim"));
    }

    #[tokio::test]
    async fn test_verify_name_falls_back_to_email() {
        let response = serde_json::json!({
            "aud": "client-123",
            "sub": "sub-1",
            "email": "dev@example.com"
        });
        let client = MockHttpClient::new().with_response(tokeninfo_url("tok-1"), response);
        let provider = GoogleIdentityProvider::new(client, None);

        let profile = provider.verify("tok-1").await.unwrap();
        assert_eq!(profile.name, "dev@example.com");
    }

    #[tokio::test]
    async fn test_verify_maps_upstream_failure_to_credential_error() {
        let client =
            MockHttpClient::new().with_error(tokeninfo_url("bad-token"), "HTTP 400: invalid_token");
        let provider = GoogleIdentityProvider::new(client, None);

        let err = provider.verify("bad-token").await.unwrap_err();
        assert!(matches!(err, DomainError::Credential { .. }));
    }

    #[tokio::test]
    async fn test_mock_provider_round_trip() {
        let provider = mock::MockIdentityProvider::new()
            .with_profile("tok-1", IdentityProfile::new("sub-1", "a@b.c", "A"));

        assert!(provider.verify("tok-1").await.is_ok());
        assert!(provider.verify("tok-2").await.is_err());
    }
}
