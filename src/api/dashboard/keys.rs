//! API key management endpoints for the dashboard

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::RequireSession;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::key::{ApiKeyRecord, KeyChanges, KeyClass, KeyStatus};

/// Request to create a new API key
#[derive(Debug, Clone, Deserialize)]
pub struct CreateKeyRequest {
    pub name: String,
    pub key_type: KeyClass,
    #[serde(default)]
    pub usage_limit: Option<u64>,
}

/// Request to update an API key
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateKeyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub usage_limit: Option<u64>,
}

/// Request to toggle a key's status.
///
/// Carries the status the caller last observed; the flip is computed
/// from it, so two racing toggles converge instead of double-flipping.
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleStatusRequest {
    pub current_status: KeyStatus,
}

/// Request to validate a candidate key string
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateKeyRequest {
    pub key: String,
}

/// API key response. The key string is masked except in the create
/// response, which is the only place the full key is ever returned.
#[derive(Debug, Clone, Serialize)]
pub struct KeyResponse {
    pub id: String,
    pub name: String,
    pub key: String,
    pub key_type: KeyClass,
    pub usage: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u64>,
    pub status: KeyStatus,
    pub created_at: String,
}

impl KeyResponse {
    fn masked(record: &ApiKeyRecord) -> Self {
        Self::build(record, mask_key(record.key()))
    }

    fn revealed(record: &ApiKeyRecord) -> Self {
        Self::build(record, record.key().to_string())
    }

    fn build(record: &ApiKeyRecord, key: String) -> Self {
        Self {
            id: record.id().to_string(),
            name: record.name().to_string(),
            key,
            key_type: record.key_type(),
            usage: record.usage(),
            usage_limit: record.usage_limit(),
            status: record.status(),
            created_at: record.created_at().to_rfc3339(),
        }
    }
}

/// List keys response
#[derive(Debug, Clone, Serialize)]
pub struct ListKeysResponse {
    pub keys: Vec<KeyResponse>,
    pub total: usize,
}

/// Toggle status response
#[derive(Debug, Clone, Serialize)]
pub struct ToggleStatusResponse {
    pub id: String,
    pub status: KeyStatus,
}

/// Validate key response
#[derive(Debug, Clone, Serialize)]
pub struct ValidateKeyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<KeyClass>,
}

/// Masks a key to its prefix and last four characters
fn mask_key(key: &str) -> String {
    let prefix_end = key.find('_').map(|i| i + 1).unwrap_or(0);
    let tail_start = key.len().saturating_sub(4);
    if tail_start <= prefix_end {
        return format!("{}...", &key[..prefix_end]);
    }
    format!("{}...{}", &key[..prefix_end], &key[tail_start..])
}

/// GET /dashboard/keys
pub async fn list_keys(
    State(state): State<AppState>,
    RequireSession(_): RequireSession,
) -> Result<Json<ListKeysResponse>, ApiError> {
    debug!("Listing API keys");

    let records = state.key_store.list().await.map_err(ApiError::from)?;

    let keys: Vec<KeyResponse> = records.iter().map(KeyResponse::masked).collect();
    let total = keys.len();

    Ok(Json(ListKeysResponse { keys, total }))
}

/// POST /dashboard/keys
pub async fn create_key(
    State(state): State<AppState>,
    RequireSession(_): RequireSession,
    Json(request): Json<CreateKeyRequest>,
) -> Result<(StatusCode, Json<KeyResponse>), ApiError> {
    debug!(name = %request.name, class = %request.key_type, "Creating API key");

    let record = state
        .issuer
        .issue_with_limit(&request.name, request.key_type, request.usage_limit)
        .await
        .map_err(ApiError::from)?;

    Ok((StatusCode::CREATED, Json(KeyResponse::revealed(&record))))
}

/// GET /dashboard/keys/{key_id}
pub async fn get_key(
    State(state): State<AppState>,
    RequireSession(_): RequireSession,
    Path(key_id): Path<String>,
) -> Result<Json<KeyResponse>, ApiError> {
    let record = state
        .key_store
        .get(&key_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("API key '{}' not found", key_id)))?;

    Ok(Json(KeyResponse::masked(&record)))
}

/// PATCH /dashboard/keys/{key_id}
pub async fn update_key(
    State(state): State<AppState>,
    RequireSession(_): RequireSession,
    Path(key_id): Path<String>,
    Json(request): Json<UpdateKeyRequest>,
) -> Result<Json<KeyResponse>, ApiError> {
    debug!(key_id = %key_id, "Updating API key");

    let mut changes = KeyChanges::new();
    if let Some(name) = &request.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::bad_request("Key name must not be empty").with_param("name"));
        }
        changes = changes.rename(name);
    }
    if let Some(limit) = request.usage_limit {
        changes = changes.with_usage_limit(limit);
    }

    let record = state
        .key_store
        .update(&key_id, changes)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(KeyResponse::masked(&record)))
}

/// DELETE /dashboard/keys/{key_id}
///
/// Deletion is idempotent; removing an absent key is still a 204.
pub async fn delete_key(
    State(state): State<AppState>,
    RequireSession(_): RequireSession,
    Path(key_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let existed = state
        .key_store
        .delete(&key_id)
        .await
        .map_err(ApiError::from)?;

    debug!(key_id = %key_id, existed, "Deleted API key");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /dashboard/keys/{key_id}/toggle
pub async fn toggle_key_status(
    State(state): State<AppState>,
    RequireSession(_): RequireSession,
    Path(key_id): Path<String>,
    Json(request): Json<ToggleStatusRequest>,
) -> Result<Json<ToggleStatusResponse>, ApiError> {
    let status = state
        .key_store
        .toggle_status(&key_id, request.current_status)
        .await
        .map_err(ApiError::from)?;

    debug!(key_id = %key_id, status = status.as_str(), "Toggled API key status");

    Ok(Json(ToggleStatusResponse { id: key_id, status }))
}

/// POST /dashboard/validate
///
/// Playground check for a candidate key. Runs the same authorization
/// gate as the summarizer endpoint, so an invalid key gets the same
/// 401 it would get in production.
pub async fn validate_key(
    State(state): State<AppState>,
    RequireSession(_): RequireSession,
    Json(request): Json<ValidateKeyRequest>,
) -> Result<Json<ValidateKeyResponse>, ApiError> {
    let allowed = state
        .gate
        .authorize(Some(&request.key))
        .await
        .map_err(|_| ApiError::invalid_api_key())?;

    Ok(Json(ValidateKeyResponse {
        valid: true,
        class: Some(allowed.class()),
    }))
}
