//! keymzanzi gateway
//!
//! API key issuance, validation, and authorization for the GitHub
//! summarizer endpoint:
//! - Structured, validatable key format with dev and prod classes
//! - Pluggable key and account storage (in-memory or PostgreSQL)
//! - Fail-closed authorization gate on the protected endpoint
//! - Session-protected dashboard API for managing keys

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use rand::{distributions::Alphanumeric, Rng};
use tracing::{info, warn};

use api::state::AppState;
use infrastructure::auth::{GoogleIdentityProvider, JwtConfig, JwtService};
use infrastructure::github::GithubClient;
use infrastructure::http_client::HttpClient;
use infrastructure::key::{
    AuthorizationGate, ClassBudgets, KeyIssuer, RateLimiter, UsageRecorder,
};
use infrastructure::storage::{
    connect_pool, create_account_store, create_key_store, StorageBackend,
};
use infrastructure::summarizer::ChatCompletionSummarizer;

/// Create the application state with all services initialized
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let backend = StorageBackend::from_str(&config.storage.backend).ok_or_else(|| {
        anyhow::anyhow!("Unknown storage backend: {}", config.storage.backend)
    })?;
    info!("Storage backend: {}", backend.as_str());

    let pool = match backend {
        StorageBackend::Postgres => {
            let url = config
                .storage
                .url
                .clone()
                .or_else(|| std::env::var("DATABASE_URL").ok())
                .ok_or_else(|| {
                    anyhow::anyhow!("DATABASE_URL is required for the postgres backend")
                })?;
            Some(connect_pool(&url).await?)
        }
        StorageBackend::Memory => None,
    };

    let key_store = create_key_store(backend, pool.as_ref()).await?;
    let account_store = create_account_store(backend, pool.as_ref()).await?;

    let issuer = Arc::new(KeyIssuer::new(key_store.clone()));
    let gate = Arc::new(AuthorizationGate::new(key_store.clone()));
    let usage = Arc::new(UsageRecorder::new(
        key_store.clone(),
        config.usage.enforce_limits,
        config.usage.default_limit,
    ));

    let rate_limiter = config.rate_limit.enabled.then(|| {
        info!(
            dev_rpm = config.rate_limit.dev_rpm,
            prod_rpm = config.rate_limit.prod_rpm,
            "Rate limiting enabled"
        );
        Arc::new(RateLimiter::with_budgets(ClassBudgets {
            dev_rpm: config.rate_limit.dev_rpm,
            prod_rpm: config.rate_limit.prod_rpm,
        }))
    });

    let github_token = config
        .github
        .token
        .clone()
        .or_else(|| std::env::var("GITHUB_TOKEN").ok());
    if github_token.is_none() {
        info!("No GitHub token configured; README fetches use unauthenticated API limits");
    }
    let github = Arc::new(GithubClient::with_base_url(
        HttpClient::new(),
        github_token,
        &config.github.base_url,
    ));

    let summarizer_key = config
        .summarizer
        .api_key
        .clone()
        .or_else(|| std::env::var("SUMMARIZER_API_KEY").ok())
        .unwrap_or_else(|| {
            warn!("SUMMARIZER_API_KEY is not set; summarize calls will fail upstream");
            String::new()
        });
    let summarizer = Arc::new(ChatCompletionSummarizer::with_base_url(
        HttpClient::new(),
        summarizer_key,
        &config.summarizer.model,
        &config.summarizer.base_url,
    ));

    let identity = Arc::new(GoogleIdentityProvider::new(
        HttpClient::new(),
        config.auth.google_client_id.clone(),
    ));

    let jwt_secret = config
        .auth
        .jwt_secret
        .clone()
        .or_else(|| std::env::var("JWT_SECRET").ok())
        .unwrap_or_else(|| {
            warn!("JWT_SECRET is not set; sessions will not survive a restart");
            generated_secret()
        });
    let jwt = Arc::new(JwtService::new(JwtConfig::new(
        jwt_secret,
        config.auth.session_ttl_hours,
    )));

    Ok(AppState::new(
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
    ))
}

fn generated_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_app_state_with_memory_backend() {
        let config = AppConfig::default();
        let state = create_app_state_with_config(&config).await.unwrap();

        assert_eq!(state.key_store.count().await.unwrap(), 0);
        assert!(state.rate_limiter.is_none());
    }

    #[tokio::test]
    async fn test_rate_limiter_present_when_enabled() {
        let mut config = AppConfig::default();
        config.rate_limit.enabled = true;

        let state = create_app_state_with_config(&config).await.unwrap();
        assert!(state.rate_limiter.is_some());
    }

    #[tokio::test]
    async fn test_unknown_backend_is_rejected() {
        let mut config = AppConfig::default();
        config.storage.backend = "sqlite".to_string();

        assert!(create_app_state_with_config(&config).await.is_err());
    }

    #[test]
    fn test_generated_secret_length_and_charset() {
        let secret = generated_secret();
        assert_eq!(secret.len(), 48);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
