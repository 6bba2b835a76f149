use serde::Deserialize;

use crate::infrastructure::observability::ObservabilityConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub usage: UsageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Record storage selection
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// `memory` or `postgres`
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    /// Connection URL for the postgres backend. Falls back to the
    /// `DATABASE_URL` environment variable when unset.
    #[serde(default)]
    pub url: Option<String>,
}

/// Session token settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret. Falls back to the `JWT_SECRET` environment
    /// variable, then to an ephemeral generated secret.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u64,
    /// Expected `aud` claim of provider ID tokens. Unset skips the
    /// audience check.
    #[serde(default)]
    pub google_client_id: Option<String>,
}

/// GitHub API access
#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_github_base_url")]
    pub base_url: String,
    /// Optional token for higher API limits. Falls back to the
    /// `GITHUB_TOKEN` environment variable.
    #[serde(default)]
    pub token: Option<String>,
}

/// Summarization upstream (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default = "default_summarizer_base_url")]
    pub base_url: String,
    /// Falls back to the `SUMMARIZER_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_summarizer_model")]
    pub model: String,
}

/// Per-class rate limiting, applied after authorization
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_dev_rpm")]
    pub dev_rpm: u32,
    #[serde(default = "default_prod_rpm")]
    pub prod_rpm: u32,
}

/// Usage counting and optional limit enforcement
#[derive(Debug, Clone, Deserialize)]
pub struct UsageConfig {
    /// When on, keys at or over their usage limit are refused
    #[serde(default)]
    pub enforce_limits: bool,
    /// Limit applied to keys without one of their own (only consulted
    /// when enforcement is on)
    #[serde(default)]
    pub default_limit: Option<u64>,
}

fn default_storage_backend() -> String {
    "memory".to_string()
}

fn default_session_ttl_hours() -> u64 {
    24
}

fn default_github_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_summarizer_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_summarizer_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_dev_rpm() -> u32 {
    100
}

fn default_prod_rpm() -> u32 {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            url: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            session_ttl_hours: default_session_ttl_hours(),
            google_client_id: None,
        }
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            base_url: default_github_base_url(),
            token: None,
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            base_url: default_summarizer_base_url(),
            api_key: None,
            model: default_summarizer_model(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dev_rpm: default_dev_rpm(),
            prod_rpm: default_prod_rpm(),
        }
    }
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            enforce_limits: false,
            default_limit: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
