//! API key domain
//!
//! The canonical key format, the stored record shape, and the
//! persistence contract stores implement.

mod entity;
pub mod format;
mod store;

pub use entity::{ApiKeyRecord, KeyChanges, KeyStatus};
pub use format::{classify, is_well_formed, KeyClass, KEY_PREFIX, MIN_TAIL_LEN};
pub use store::KeyStore;

#[cfg(test)]
pub use store::mock::MockKeyStore;
