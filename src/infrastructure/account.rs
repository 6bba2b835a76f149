//! Account store implementations

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::account::{Account, AccountStore, IdentityProfile};
use crate::domain::DomainError;

const DEFAULT_TABLE: &str = "accounts";

/// In-memory implementation of [`AccountStore`]
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get(&self, subject: &str) -> Result<Option<Account>, DomainError> {
        Ok(self.accounts.read().await.get(subject).cloned())
    }

    async fn upsert(&self, profile: &IdentityProfile) -> Result<Account, DomainError> {
        let mut accounts = self.accounts.write().await;
        let account = match accounts.get_mut(&profile.subject) {
            Some(existing) => {
                existing.refresh(profile);
                existing.clone()
            }
            None => {
                let account = Account::from_profile(profile);
                accounts.insert(profile.subject.clone(), account.clone());
                account
            }
        };
        Ok(account)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.accounts.read().await.len())
    }
}

/// PostgreSQL implementation of [`AccountStore`]
#[derive(Debug, Clone)]
pub struct PostgresAccountStore {
    pool: PgPool,
    table: String,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            table: DEFAULT_TABLE.to_string(),
        }
    }

    /// Creates the backing table when it does not exist yet
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                subject TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                name TEXT NOT NULL,
                picture TEXT,
                created_at TIMESTAMPTZ NOT NULL,
                last_signin_at TIMESTAMPTZ NOT NULL
            )
            "#,
            self.table
        );

        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        debug!(table = %self.table, "Account table ready");
        Ok(())
    }

    fn account_from_row(row: &PgRow) -> Result<Account, DomainError> {
        let read =
            |e: sqlx::Error| DomainError::storage(format!("Failed to read account row: {}", e));

        let subject: String = row.try_get("subject").map_err(read)?;
        let email: String = row.try_get("email").map_err(read)?;
        let name: String = row.try_get("name").map_err(read)?;
        let picture: Option<String> = row.try_get("picture").map_err(read)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(read)?;
        let last_signin_at: DateTime<Utc> = row.try_get("last_signin_at").map_err(read)?;

        Ok(Account::from_parts(
            subject,
            email,
            name,
            picture,
            created_at,
            last_signin_at,
        ))
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    async fn get(&self, subject: &str) -> Result<Option<Account>, DomainError> {
        let sql = format!(
            "SELECT subject, email, name, picture, created_at, last_signin_at \
             FROM {} WHERE subject = $1",
            self.table
        );

        let row = sqlx::query(&sql)
            .bind(subject)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get account: {}", e)))?;

        row.as_ref().map(Self::account_from_row).transpose()
    }

    async fn upsert(&self, profile: &IdentityProfile) -> Result<Account, DomainError> {
        let sql = format!(
            "INSERT INTO {} (subject, email, name, picture, created_at, last_signin_at) \
             VALUES ($1, $2, $3, $4, $5, $5) \
             ON CONFLICT (subject) DO UPDATE SET \
                email = EXCLUDED.email, \
                name = EXCLUDED.name, \
                picture = EXCLUDED.picture, \
                last_signin_at = EXCLUDED.last_signin_at \
             RETURNING subject, email, name, picture, created_at, last_signin_at",
            self.table
        );

        let row = sqlx::query(&sql)
            .bind(&profile.subject)
            .bind(&profile.email)
            .bind(&profile.name)
            .bind(profile.picture.as_deref())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to upsert account: {}", e)))?;

        Self::account_from_row(&row)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);

        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count accounts: {}", e)))?;

        Ok(count.max(0) as usize)
    }
}
