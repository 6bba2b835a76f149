//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, GithubConfig, LogFormat, LoggingConfig, RateLimitConfig, ServerConfig,
    StorageConfig, SummarizerConfig, UsageConfig,
};
