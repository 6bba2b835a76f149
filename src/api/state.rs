//! Application state for shared services

use std::sync::Arc;

use crate::domain::account::AccountStore;
use crate::domain::key::KeyStore;
use crate::infrastructure::auth::{IdentityProvider, JwtService};
use crate::infrastructure::github::GithubReadme;
use crate::infrastructure::key::{AuthorizationGate, KeyIssuer, RateLimiter, UsageRecorder};
use crate::infrastructure::summarizer::Summarizer;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub key_store: Arc<dyn KeyStore>,
    pub account_store: Arc<dyn AccountStore>,
    pub issuer: Arc<KeyIssuer>,
    pub gate: Arc<AuthorizationGate>,
    pub usage: Arc<UsageRecorder>,
    /// Present only when rate limiting is enabled
    pub rate_limiter: Option<Arc<RateLimiter>>,
    pub github: Arc<dyn GithubReadme>,
    pub summarizer: Arc<dyn Summarizer>,
    pub identity: Arc<dyn IdentityProvider>,
    pub jwt: Arc<JwtService>,
}

impl AppState {
    /// Create new application state with provided services
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        key_store: Arc<dyn KeyStore>,
        account_store: Arc<dyn AccountStore>,
        issuer: Arc<KeyIssuer>,
        gate: Arc<AuthorizationGate>,
        usage: Arc<UsageRecorder>,
        rate_limiter: Option<Arc<RateLimiter>>,
        github: Arc<dyn GithubReadme>,
        summarizer: Arc<dyn Summarizer>,
        identity: Arc<dyn IdentityProvider>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            key_store,
            account_store,
            issuer,
            gate,
            usage,
            rate_limiter,
            github,
            summarizer,
            identity,
            jwt,
        }
    }
}
