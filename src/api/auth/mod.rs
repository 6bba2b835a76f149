//! Sign-in API endpoints
//!
//! Verifies provider ID tokens, maintains account records, and issues
//! session JWTs for the dashboard zone.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::middleware::session_auth::SESSION_COOKIE;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::Account;

/// Create the sign-in router
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/signin", get(signin_descriptor).post(signin))
        .route("/signout", post(signout))
        .route("/error", get(auth_error))
}

/// Sign-in request carrying a provider ID token
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub id_token: String,
}

/// Sign-in response
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub success: bool,
    pub token: String,
    pub account: AccountResponse,
}

/// Account payload (safe to expose)
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub subject: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub created_at: String,
    pub last_signin_at: String,
}

impl AccountResponse {
    fn from_account(account: &Account) -> Self {
        Self {
            subject: account.subject().to_string(),
            email: account.email().to_string(),
            name: account.name().to_string(),
            picture: account.picture().map(|p| p.to_string()),
            created_at: account.created_at().to_rfc3339(),
            last_signin_at: account.last_signin_at().to_rfc3339(),
        }
    }
}

/// Sign in with a provider ID token
///
/// POST /auth/signin
///
/// Verifies the token, upserts the account record, and returns a
/// session JWT. The same token is also set as a session cookie for
/// browser clients.
pub async fn signin(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.identity.verify(&request.id_token).await?;

    // Account bookkeeping must not block sign-in. A broken store is
    // logged and the verified profile is used directly.
    let account = match state.account_store.upsert(&profile).await {
        Ok(account) => account,
        Err(e) => {
            warn!(error = %e, subject = %profile.subject, "Account upsert failed, continuing sign-in");
            Account::from_profile(&profile)
        }
    };

    let token = state.jwt.generate(&account)?;

    info!(subject = %account.subject(), "Account signed in");

    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        token,
        state.jwt.ttl_hours() * 3600
    );

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(SignInResponse {
            success: true,
            token,
            account: AccountResponse::from_account(&account),
        }),
    ))
}

/// Sign out
///
/// POST /auth/signout
///
/// Sessions are stateless JWTs, so signing out is a matter of
/// discarding the token. This endpoint clears the session cookie.
pub async fn signout() -> impl IntoResponse {
    let cookie = format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    );

    ([(header::SET_COOKIE, cookie)], Json(SignOutResponse { success: true }))
}

/// Sign-out response
#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    pub success: bool,
}

/// Describes the sign-in flow
#[derive(Debug, Serialize)]
pub struct SignInDescriptor {
    pub provider: String,
    pub method: String,
    pub url: String,
    pub body: SignInBodyShape,
}

/// Expected sign-in request body
#[derive(Debug, Serialize)]
pub struct SignInBodyShape {
    pub id_token: String,
}

/// Describe how to sign in
///
/// GET /auth/signin
///
/// There is no server-rendered sign-in page; clients obtain an ID token
/// from the provider and POST it here.
pub async fn signin_descriptor() -> Json<SignInDescriptor> {
    Json(SignInDescriptor {
        provider: "google".to_string(),
        method: "POST".to_string(),
        url: "/auth/signin".to_string(),
        body: SignInBodyShape {
            id_token: "<provider ID token>".to_string(),
        },
    })
}

/// Query parameters for the error endpoint
#[derive(Debug, Deserialize)]
pub struct AuthErrorParams {
    #[serde(default)]
    pub error: Option<String>,
}

/// Sign-in error response
#[derive(Debug, Serialize)]
pub struct AuthErrorResponse {
    pub error: String,
    pub message: String,
}

/// Explain a sign-in error code
///
/// GET /auth/error?error=<code>
///
/// Maps provider error codes to human-readable messages.
pub async fn auth_error(Query(params): Query<AuthErrorParams>) -> Json<AuthErrorResponse> {
    let code = params.error.unwrap_or_else(|| "Default".to_string());
    let message = match code.as_str() {
        "Configuration" => "There is a problem with the server configuration.",
        "AccessDenied" => "Access was denied. You do not have permission to sign in.",
        "Verification" => "The sign-in token has expired or has already been used.",
        _ => "An unexpected error occurred during sign-in.",
    };

    Json(AuthErrorResponse {
        error: code,
        message: message.to_string(),
    })
}
