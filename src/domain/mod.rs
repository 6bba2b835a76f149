//! Domain layer - Core business logic and entities

pub mod account;
pub mod error;
pub mod key;

pub use account::{Account, AccountStore, IdentityProfile};
pub use error::DomainError;
pub use key::{
    classify, is_well_formed, ApiKeyRecord, KeyChanges, KeyClass, KeyStatus, KeyStore,
};
