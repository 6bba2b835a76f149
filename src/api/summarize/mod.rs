//! GitHub summarizer endpoint
//!
//! The one API-key protected route. The authorization gate runs inside
//! the handler, so the handler owns the 401 shape end to end.

use std::time::Instant;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, JsonRejection};
use crate::domain::key::KeyClass;
use crate::infrastructure::github::RepoRef;
use crate::infrastructure::key::{RateLimitResult, UsageDecision};
use crate::infrastructure::observability::record_summarize_request;

/// Create the summarizer router
pub fn create_summarize_router() -> Router<AppState> {
    Router::new().route("/github-summarizer", post(summarize))
}

/// Summarize request
#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    #[serde(rename = "repoUrl")]
    pub repo_url: String,
}

/// Summarize response
#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub success: bool,
    pub repository: String,
    pub summary: String,
    pub cool_facts: Vec<String>,
    pub tech_stack: Vec<String>,
    pub target_audience: String,
    pub content_length: usize,
    pub key_type: String,
    pub timestamp: String,
}

/// Summarize a GitHub repository from its README
///
/// POST /api/github-summarizer
///
/// Requires an API key in the `Authorization` header. The gate runs
/// before anything else; unauthorized callers learn nothing about the
/// request contract, not even whether the body parsed.
pub async fn summarize(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let allowed = state
        .gate
        .authorize(auth_header)
        .await
        .map_err(|_| ApiError::invalid_api_key())?;

    let record = allowed.record();
    let class = allowed.class();
    let start = Instant::now();

    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            record_summarize_request("bad_request", class.tag(), start.elapsed());
            return Ok(rejection.into_response());
        }
    };

    let repo_url = request.repo_url.trim();
    if repo_url.is_empty() {
        record_summarize_request("bad_request", class.tag(), start.elapsed());
        return Err(ApiError::bad_request("repoUrl must not be empty").with_param("repoUrl"));
    }

    let repo = match RepoRef::parse(repo_url) {
        Ok(repo) => repo,
        Err(e) => {
            record_summarize_request("bad_request", class.tag(), start.elapsed());
            return Err(ApiError::from(e).with_param("repoUrl"));
        }
    };

    // Post-authorization extensions: rate limit, then usage accounting.
    if let Some(limiter) = &state.rate_limiter {
        let result = limiter.check_and_record(record.key(), class).await;
        if !result.allowed {
            record_summarize_request("rate_limited", class.tag(), start.elapsed());
            return Ok(rate_limited_response(class, &result));
        }
    }

    if let UsageDecision::LimitExceeded { limit, .. } = state.usage.record(record).await {
        record_summarize_request("usage_limited", class.tag(), start.elapsed());
        return Err(
            ApiError::forbidden(format!("Usage limit of {} requests exceeded", limit))
                .with_code("usage_limit_exceeded"),
        );
    }

    let readme = match state.github.fetch_readme(&repo).await {
        Ok(readme) => readme,
        Err(e) => {
            record_summarize_request("github_error", class.tag(), start.elapsed());
            return Err(e.into());
        }
    };
    let content_length = readme.len();

    let summary = match state.summarizer.summarize(&repo, &readme).await {
        Ok(summary) => summary,
        Err(e) => {
            record_summarize_request("summarizer_error", class.tag(), start.elapsed());
            return Err(e.into());
        }
    };

    record_summarize_request("success", class.tag(), start.elapsed());
    info!(
        repository = %repo,
        class = %class,
        content_length,
        "Repository summarized"
    );

    Ok(Json(SummarizeResponse {
        success: true,
        repository: repo.to_string(),
        summary: summary.summary,
        cool_facts: summary.cool_facts,
        tech_stack: summary.tech_stack,
        target_audience: summary.target_audience,
        content_length,
        key_type: class.wire_name().to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
    .into_response())
}

fn rate_limited_response(class: KeyClass, result: &RateLimitResult) -> Response {
    let mut response = ApiError::rate_limited(format!(
        "Rate limit of {} requests per minute exceeded for {} keys",
        result.limit,
        class.wire_name()
    ))
    .into_response();

    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", result.limit.into());
    headers.insert("x-ratelimit-remaining", result.remaining.into());
    headers.insert("x-ratelimit-reset", result.reset_in_seconds.into());

    response
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{Request, StatusCode};

    use super::*;
    use crate::api::state::test_support::test_state;
    use crate::domain::key::{ApiKeyRecord, KeyStatus, KeyStore, MockKeyStore};
    use crate::infrastructure::github::mock::MockGithubReadme;
    use crate::infrastructure::key::{
        key_with_tail, AuthorizationGate, ClassBudgets, RateLimiter, UsageRecorder,
    };
    use crate::infrastructure::summarizer::mock::MockSummarizer;

    const REPO_URL: &str = "https://github.com/rust-lang/rust";
    const TEST_README: &str = "# Test\n\nA test readme.";

    async fn call(state: &AppState, auth: Option<&str>, repo_url: &str) -> Response {
        let mut headers = HeaderMap::new();
        if let Some(auth) = auth {
            headers.insert(header::AUTHORIZATION, auth.parse().unwrap());
        }

        summarize(
            State(state.clone()),
            headers,
            Ok(Json(SummarizeRequest {
                repo_url: repo_url.to_string(),
            })),
        )
        .await
        .unwrap_or_else(|e| e.into_response())
    }

    async fn issue_dev_key(state: &AppState) -> String {
        let record = state.issuer.issue("test key", KeyClass::Dev).await.unwrap();
        record.key().to_string()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_issued_key_summarizes_repository() {
        let state = test_state();
        let key = issue_dev_key(&state).await;

        let response = call(&state, Some(&key), REPO_URL).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["repository"], "rust-lang/rust");
        assert_eq!(body["summary"], "A test repository.");
        assert_eq!(body["key_type"], "development");
        assert_eq!(body["content_length"], TEST_README.len() as u64);

        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_bearer_prefix_accepted() {
        let state = test_state();
        let key = issue_dev_key(&state).await;

        let response = call(&state, Some(&format!("Bearer {}", key)), REPO_URL).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_prod_key_reports_production() {
        let state = test_state();
        let record = state.issuer.issue("prod", KeyClass::Prod).await.unwrap();

        let response = call(&state, Some(record.key()), REPO_URL).await;
        let body = body_json(response).await;
        assert_eq!(body["key_type"], "production");
    }

    #[tokio::test]
    async fn test_missing_header_denied_even_with_keys_stored() {
        let state = test_state();
        issue_dev_key(&state).await;

        let response = call(&state, None, REPO_URL).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_deny_reasons_share_one_response_body() {
        let state = test_state();
        issue_dev_key(&state).await;

        let missing = call(&state, None, REPO_URL).await;
        let malformed = call(&state, Some("abc"), REPO_URL).await;
        let unknown = call(
            &state,
            Some(&key_with_tail(KeyClass::Dev, &"c".repeat(20))),
            REPO_URL,
        )
        .await;

        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(malformed.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);

        let first = body_bytes(missing).await;
        let second = body_bytes(malformed).await;
        let third = body_bytes(unknown).await;
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[tokio::test]
    async fn test_toggled_off_key_is_denied() {
        let state = test_state();
        let record = state.issuer.issue("flipped", KeyClass::Dev).await.unwrap();

        let response = call(&state, Some(record.key()), REPO_URL).await;
        assert_eq!(response.status(), StatusCode::OK);

        state
            .key_store
            .toggle_status(record.id(), KeyStatus::Active)
            .await
            .unwrap();

        let response = call(&state, Some(record.key()), REPO_URL).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_store_failure_denies_not_allows() {
        let mock = Arc::new(MockKeyStore::new());
        let key = key_with_tail(KeyClass::Dev, &"b".repeat(20));
        mock.create(ApiKeyRecord::new("doomed", &key, KeyClass::Dev))
            .await
            .unwrap();
        mock.set_should_fail(true).await;

        let mut state = test_state();
        state.gate = Arc::new(AuthorizationGate::new(mock));

        let response = call(&state, Some(&key), REPO_URL).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_empty_repo_url_is_rejected() {
        let state = test_state();
        let key = issue_dev_key(&state).await;

        let response = call(&state, Some(&key), "   ").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["param"], "repoUrl");
    }

    #[tokio::test]
    async fn test_non_github_url_is_rejected() {
        let state = test_state();
        let key = issue_dev_key(&state).await;

        let response = call(&state, Some(&key), "https://gitlab.com/a/b").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected_after_gate() {
        let state = test_state();
        let key = issue_dev_key(&state).await;

        let request = Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let rejection = Json::<SummarizeRequest>::from_request(request, &())
            .await
            .err()
            .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, key.parse().unwrap());

        let response = summarize(State(state.clone()), headers, Err(rejection))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "json_parse_error");
    }

    #[tokio::test]
    async fn test_malformed_json_without_key_is_401() {
        let state = test_state();

        let request = Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let rejection = Json::<SummarizeRequest>::from_request(request, &())
            .await
            .err()
            .unwrap();

        let err = summarize(State(state), HeaderMap::new(), Err(rejection))
            .await
            .err()
            .unwrap();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_rate_limit_returns_429_with_headers() {
        let mut state = test_state();
        state.rate_limiter = Some(Arc::new(RateLimiter::with_budgets(ClassBudgets {
            dev_rpm: 1,
            prod_rpm: 1,
        })));
        let key = issue_dev_key(&state).await;

        let first = call(&state, Some(&key), REPO_URL).await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = call(&state, Some(&key), REPO_URL).await;
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(second.headers().get("x-ratelimit-limit").unwrap(), "1");
        assert_eq!(second.headers().get("x-ratelimit-remaining").unwrap(), "0");
        assert!(second.headers().contains_key("x-ratelimit-reset"));
    }

    #[tokio::test]
    async fn test_usage_limit_returns_403_when_enforced() {
        let mut state = test_state();
        state.usage = Arc::new(UsageRecorder::new(state.key_store.clone(), true, None));

        let record = state
            .issuer
            .issue_with_limit("limited", KeyClass::Dev, Some(1))
            .await
            .unwrap();

        let first = call(&state, Some(record.key()), REPO_URL).await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = call(&state, Some(record.key()), REPO_URL).await;
        assert_eq!(second.status(), StatusCode::FORBIDDEN);

        let body = body_json(second).await;
        assert_eq!(body["error"]["code"], "usage_limit_exceeded");
    }

    #[tokio::test]
    async fn test_usage_counts_without_enforcement() {
        let state = test_state();
        let record = state.issuer.issue("counted", KeyClass::Dev).await.unwrap();

        call(&state, Some(record.key()), REPO_URL).await;
        call(&state, Some(record.key()), REPO_URL).await;

        let stored = state.key_store.get(record.id()).await.unwrap().unwrap();
        assert_eq!(stored.usage(), 2);
    }

    #[tokio::test]
    async fn test_github_failure_is_500_with_upstream_message() {
        let mut state = test_state();
        let github = Arc::new(MockGithubReadme::new(TEST_README));
        github.set_should_fail(true);
        state.github = github;

        let key = issue_dev_key(&state).await;
        let response = call(&state, Some(&key), REPO_URL).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.contains("github"));
        assert!(message.contains("Mock README failure"));
    }

    #[tokio::test]
    async fn test_summarizer_failure_is_500() {
        let mut state = test_state();
        let summarizer = Arc::new(MockSummarizer::new());
        summarizer.set_should_fail(true);
        state.summarizer = summarizer;

        let key = issue_dev_key(&state).await;
        let response = call(&state, Some(&key), REPO_URL).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
