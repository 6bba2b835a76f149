use axum::{middleware, routing::get, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use super::auth;
use super::dashboard;
use super::health;
use super::middleware::{logging_middleware, metrics_middleware, security_headers_middleware};
use super::state::AppState;
use super::summarize;
use super::types::Json;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Create a minimal router without state (for testing/backward compatibility)
/// Note: /ready endpoint is not available without state
pub fn create_router() -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .layer(TraceLayer::new_for_http())
}

/// Create the full router with application state.
///
/// Three zones: the public surface (landing, sign-in, health), the
/// API-key zone (`/api`, gated inside the handler), and the session
/// zone (`/dashboard`, gated by the session extractor).
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        // Public landing descriptor
        .route("/", get(landing))
        // Health endpoints (no auth)
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Sign-in endpoints (public)
        .nest("/auth", auth::create_auth_router())
        // API-key zone; the gate runs inside the handler
        .nest("/api", summarize::create_summarize_router())
        // Session zone
        .nest("/dashboard", dashboard::create_dashboard_router())
        // Add state and middleware
        .with_state(state)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Full router plus the Prometheus endpoint when metrics are enabled
pub fn create_api_router(state: AppState, metrics: Option<PrometheusMetrics>) -> Router {
    let mut router = create_router_with_state(state);

    if let Some(m) = metrics {
        router = router.merge(create_metrics_router(m));
    }

    router
}

/// Service descriptor for the landing route
#[derive(Serialize)]
struct LandingResponse {
    service: &'static str,
    version: &'static str,
    signin: &'static str,
    summarizer: &'static str,
    dashboard: &'static str,
}

/// GET /
async fn landing() -> Json<LandingResponse> {
    Json(LandingResponse {
        service: "keymzanzi-gateway",
        version: env!("CARGO_PKG_VERSION"),
        signin: "/auth/signin",
        summarizer: "/api/github-summarizer",
        dashboard: "/dashboard/keys",
    })
}
