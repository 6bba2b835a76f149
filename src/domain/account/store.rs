//! Persistence contract for accounts

use std::fmt::Debug;

use async_trait::async_trait;

use super::entity::{Account, IdentityProfile};
use crate::domain::DomainError;

/// Storage contract for signed-in accounts
#[async_trait]
pub trait AccountStore: Send + Sync + Debug {
    async fn get(&self, subject: &str) -> Result<Option<Account>, DomainError>;

    /// Creates the account on first sign-in, refreshes the profile
    /// fields on later ones.
    async fn upsert(&self, profile: &IdentityProfile) -> Result<Account, DomainError>;

    async fn count(&self) -> Result<usize, DomainError>;
}
