//! API layer - HTTP endpoints and middleware

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod middleware;
pub mod router;
pub mod state;
pub mod summarize;
pub mod types;

pub use middleware::RequireSession;
pub use router::{create_api_router, create_router, create_router_with_state};
pub use state::AppState;
