mod gate;
mod issuer;
mod memory;
mod postgres;
mod rate_limiter;
mod usage;

pub use gate::{AllowedKey, AuthorizationGate, DenyReason};
pub use issuer::{key_with_tail, KeyIssuer, TAIL_LEN};
pub use memory::InMemoryKeyStore;
pub use postgres::PostgresKeyStore;
pub use rate_limiter::{ClassBudgets, RateLimitResult, RateLimiter};
pub use usage::{UsageDecision, UsageRecorder};
