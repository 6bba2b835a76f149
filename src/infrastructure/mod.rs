//! Infrastructure layer - External service implementations

pub mod account;
pub mod auth;
pub mod github;
pub mod http_client;
pub mod key;
pub mod logging;
pub mod observability;
pub mod storage;
pub mod summarizer;
