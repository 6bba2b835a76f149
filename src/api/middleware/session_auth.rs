//! Session authentication for dashboard routes

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;

pub const SESSION_COOKIE: &str = "session";

/// Identity attached to an authenticated dashboard request
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub subject: String,
    pub email: String,
    pub name: String,
}

/// Extractor that requires a valid session.
///
/// The token comes from the `Authorization: Bearer` header or, failing
/// that, the session cookie. Browsers without a session are redirected
/// to sign-in; API clients get a 401.
#[derive(Debug, Clone)]
pub struct RequireSession(pub SessionUser);

/// Rejection for session-gated routes
#[derive(Debug)]
pub enum SessionRejection {
    Unauthorized(ApiError),
    RedirectToSignIn,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized(err) => err.into_response(),
            // 303 so the browser lands on sign-in with a GET.
            Self::RedirectToSignIn => Redirect::to("/auth/signin").into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = SessionRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_session_token(&parts.headers) else {
            return Err(reject(
                &parts.headers,
                ApiError::unauthorized("Sign-in required"),
            ));
        };

        let claims = match state.jwt.validate(&token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Session token rejected");
                return Err(reject(
                    &parts.headers,
                    ApiError::unauthorized("Invalid or expired session"),
                ));
            }
        };

        Ok(RequireSession(SessionUser {
            subject: claims.sub,
            email: claims.email,
            name: claims.name,
        }))
    }
}

/// Extract the session token. The Authorization header wins over the
/// cookie when both are present.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    bearer.or_else(|| session_cookie(headers))
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;

    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

fn reject(headers: &HeaderMap, error: ApiError) -> SessionRejection {
    if wants_json(headers) {
        SessionRejection::Unauthorized(error)
    } else {
        SessionRejection::RedirectToSignIn
    }
}

/// Requests that identify as API clients get JSON errors; everything
/// else is treated as a browser.
fn wants_json(headers: &HeaderMap) -> bool {
    if headers.contains_key(header::AUTHORIZATION) {
        return true;
    }

    if let Some(requested_with) = headers.get("x-requested-with").and_then(|v| v.to_str().ok()) {
        if requested_with.eq_ignore_ascii_case("xmlhttprequest") {
            return true;
        }
    }

    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("application/json"))
        .unwrap_or(false)
}
