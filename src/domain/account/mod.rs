//! Account domain
//!
//! Identity bookkeeping for dashboard sign-ins.

mod entity;
mod store;

pub use entity::{Account, IdentityProfile};
pub use store::AccountStore;

#[cfg(test)]
pub use store::mock::MockAccountStore;
