//! PostgreSQL key store implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::domain::key::{ApiKeyRecord, KeyChanges, KeyClass, KeyStatus, KeyStore};
use crate::domain::DomainError;

const DEFAULT_TABLE: &str = "api_keys";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const SELECT_COLUMNS: &str =
    "id, name, key, key_type, usage, usage_limit, status, created_at";

/// PostgreSQL implementation of [`KeyStore`].
///
/// Owns its schema: the backing table carries a UNIQUE constraint on
/// the key column, so duplicate key strings are rejected by the
/// database itself.
#[derive(Debug, Clone)]
pub struct PostgresKeyStore {
    pool: PgPool,
    table: String,
}

impl PostgresKeyStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_table(pool, DEFAULT_TABLE)
    }

    pub fn with_table(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    /// Connects a fresh pool to the given database URL
    pub async fn connect(url: &str) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect(url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        info!("Connected to PostgreSQL key store");
        Ok(Self::new(pool))
    }

    /// Creates the backing table when it does not exist yet
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                key TEXT NOT NULL UNIQUE,
                key_type TEXT NOT NULL,
                usage BIGINT NOT NULL DEFAULT 0,
                usage_limit BIGINT,
                status TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
            self.table
        );

        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        debug!(table = %self.table, "Key table ready");
        Ok(())
    }

    fn record_from_row(row: &PgRow) -> Result<ApiKeyRecord, DomainError> {
        let id: String = Self::column(row, "id")?;
        let name: String = Self::column(row, "name")?;
        let key: String = Self::column(row, "key")?;
        let key_type_tag: String = Self::column(row, "key_type")?;
        let usage: i64 = Self::column(row, "usage")?;
        let usage_limit: Option<i64> = Self::column(row, "usage_limit")?;
        let status_tag: String = Self::column(row, "status")?;
        let created_at: DateTime<Utc> = Self::column(row, "created_at")?;

        let key_type = KeyClass::from_tag(&key_type_tag).ok_or_else(|| {
            DomainError::storage(format!("Unknown key_type '{}' in row", key_type_tag))
        })?;
        let status = KeyStatus::parse(&status_tag).ok_or_else(|| {
            DomainError::storage(format!("Unknown status '{}' in row", status_tag))
        })?;

        Ok(ApiKeyRecord::from_parts(
            id,
            name,
            key,
            key_type,
            usage.max(0) as u64,
            usage_limit.map(|l| l.max(0) as u64),
            status,
            created_at,
        ))
    }

    fn column<'r, T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>>(
        row: &'r PgRow,
        name: &str,
    ) -> Result<T, DomainError> {
        row.try_get(name)
            .map_err(|e| DomainError::storage(format!("Failed to read column '{}': {}", name, e)))
    }

    fn map_insert_error(e: sqlx::Error) -> DomainError {
        let message = e.to_string();
        if message.contains("duplicate key") {
            DomainError::conflict("An API key with this key string already exists")
        } else {
            DomainError::storage(format!("Failed to insert API key: {}", message))
        }
    }
}

#[async_trait]
impl KeyStore for PostgresKeyStore {
    async fn list(&self) -> Result<Vec<ApiKeyRecord>, DomainError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY created_at DESC, id DESC",
            SELECT_COLUMNS, self.table
        );

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list API keys: {}", e)))?;

        rows.iter().map(Self::record_from_row).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<ApiKeyRecord>, DomainError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            SELECT_COLUMNS, self.table
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get API key: {}", e)))?;

        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<ApiKeyRecord>, DomainError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE key = $1",
            SELECT_COLUMNS, self.table
        );

        let row = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to look up API key: {}", e)))?;

        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn create(&self, record: ApiKeyRecord) -> Result<ApiKeyRecord, DomainError> {
        let sql = format!(
            "INSERT INTO {} (id, name, key, key_type, usage, usage_limit, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            self.table
        );

        sqlx::query(&sql)
            .bind(record.id())
            .bind(record.name())
            .bind(record.key())
            .bind(record.key_type().tag())
            .bind(record.usage() as i64)
            .bind(record.usage_limit().map(|l| l as i64))
            .bind(record.status().as_str())
            .bind(record.created_at())
            .execute(&self.pool)
            .await
            .map_err(Self::map_insert_error)?;

        Ok(record)
    }

    async fn update(&self, id: &str, changes: KeyChanges) -> Result<ApiKeyRecord, DomainError> {
        let sql = format!(
            "UPDATE {} SET \
                name = COALESCE($2, name), \
                usage = COALESCE($3, usage), \
                usage_limit = COALESCE($4, usage_limit), \
                status = COALESCE($5, status) \
             WHERE id = $1 \
             RETURNING {}",
            self.table, SELECT_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .bind(changes.name.as_deref())
            .bind(changes.usage.map(|u| u as i64))
            .bind(changes.usage_limit.map(|l| l as i64))
            .bind(changes.status.map(|s| s.as_str()))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to update API key: {}", e)))?;

        match row {
            Some(row) => Self::record_from_row(&row),
            None => Err(DomainError::not_found(format!(
                "API key '{}' not found",
                id
            ))),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);

        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete API key: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn toggle_status(
        &self,
        id: &str,
        current: KeyStatus,
    ) -> Result<KeyStatus, DomainError> {
        let new_status = current.toggled();
        let sql = format!("UPDATE {} SET status = $2 WHERE id = $1", self.table);

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(new_status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to toggle API key status: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "API key '{}' not found",
                id
            )));
        }

        Ok(new_status)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);

        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count API keys: {}", e)))?;

        Ok(count.max(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_name() {
        assert_eq!(DEFAULT_TABLE, "api_keys");
    }

    fn insert_error(message: &str) -> DomainError {
        PostgresKeyStore::map_insert_error(sqlx::Error::Protocol(message.to_string()))
    }

    #[test]
    fn test_insert_error_mapping() {
        let conflict = insert_error("duplicate key value violates unique constraint");
        assert!(matches!(conflict, DomainError::Conflict { .. }));

        let storage = insert_error("connection refused");
        assert!(matches!(storage, DomainError::Storage { .. }));
    }
}
