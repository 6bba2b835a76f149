//! Authentication infrastructure module
//!
//! ID token verification for sign-in and session token management.

mod identity;
mod jwt;

pub use identity::{GoogleIdentityProvider, IdentityProvider, DEFAULT_TOKENINFO_URL};
pub use jwt::{JwtConfig, JwtService, SessionClaims};

#[cfg(test)]
pub use identity::mock::MockIdentityProvider;
