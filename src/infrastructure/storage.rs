//! Storage backend selection

use std::sync::Arc;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::domain::account::AccountStore;
use crate::domain::key::KeyStore;
use crate::domain::DomainError;
use crate::infrastructure::account::{InMemoryAccountStore, PostgresAccountStore};
use crate::infrastructure::key::{InMemoryKeyStore, PostgresKeyStore};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-memory storage (for testing/development)
    Memory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageBackend {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::Memory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres => "postgres",
        }
    }
}

/// Connects a connection pool for the postgres backend
pub async fn connect_pool(url: &str) -> Result<PgPool, DomainError> {
    let pool = PgPoolOptions::new()
        .max_connections(DEFAULT_MAX_CONNECTIONS)
        .connect(url)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

    info!("Connected to PostgreSQL");
    Ok(pool)
}

/// Creates the key store for the selected backend. The postgres
/// variant also prepares its table.
pub async fn create_key_store(
    backend: StorageBackend,
    pool: Option<&PgPool>,
) -> Result<Arc<dyn KeyStore>, DomainError> {
    match backend {
        StorageBackend::Memory => Ok(Arc::new(InMemoryKeyStore::new())),
        StorageBackend::Postgres => {
            let pool = require_pool(pool)?;
            let store = PostgresKeyStore::new(pool.clone());
            store.ensure_table().await?;
            Ok(Arc::new(store))
        }
    }
}

/// Creates the account store for the selected backend
pub async fn create_account_store(
    backend: StorageBackend,
    pool: Option<&PgPool>,
) -> Result<Arc<dyn AccountStore>, DomainError> {
    match backend {
        StorageBackend::Memory => Ok(Arc::new(InMemoryAccountStore::new())),
        StorageBackend::Postgres => {
            let pool = require_pool(pool)?;
            let store = PostgresAccountStore::new(pool.clone());
            store.ensure_table().await?;
            Ok(Arc::new(store))
        }
    }
}

fn require_pool(pool: Option<&PgPool>) -> Result<&PgPool, DomainError> {
    pool.ok_or_else(|| {
        DomainError::configuration("A PostgreSQL pool is required for the postgres backend")
    })
}
