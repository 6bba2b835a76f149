//! Dashboard API endpoints for managing API keys
//!
//! Every route here sits in the session zone: a valid session JWT is
//! required, and browsers without one are redirected to sign-in.

pub mod keys;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use super::state::AppState;

/// Create the dashboard router
pub fn create_dashboard_router() -> Router<AppState> {
    Router::new()
        // Key management
        .route("/keys", get(keys::list_keys))
        .route("/keys", post(keys::create_key))
        .route("/keys/{key_id}", get(keys::get_key))
        .route("/keys/{key_id}", patch(keys::update_key))
        .route("/keys/{key_id}", delete(keys::delete_key))
        .route("/keys/{key_id}/toggle", post(keys::toggle_key_status))
        // Key playground
        .route("/validate", post(keys::validate_key))
}
