//! Settings API endpoints
//!
//! GET/POST /api/settings/tmdb-api-key

use crate::config::KeySource;
use crate::{ApiError, ApiResult, AppState};
use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Request payload for setting the TMDB API key
#[derive(Debug, Deserialize)]
pub struct SetApiKeyRequest {
    pub api_key: String,
}

/// Response payload for API key configuration
#[derive(Debug, Serialize)]
pub struct SetApiKeyResponse {
    pub success: bool,
    pub message: String,
}

/// Where (if anywhere) the TMDB API key currently comes from
///
/// The key itself is never echoed back.
#[derive(Debug, Serialize)]
pub struct ApiKeyStatusResponse {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<KeySource>,
}

/// GET /api/settings/tmdb-api-key
pub async fn get_tmdb_api_key_status(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiKeyStatusResponse>> {
    let resolved = crate::config::resolve_tmdb_api_key(&state.db, &state.settings.toml).await?;

    Ok(Json(ApiKeyStatusResponse {
        configured: resolved.is_some(),
        source: resolved.map(|(_, source)| source),
    }))
}

/// POST /api/settings/tmdb-api-key
///
/// **Request:** `{"api_key": "your-tmdb-key"}`
///
/// The database is the highest priority key source, so the new key is used
/// by the next import run without a restart.
///
/// **Errors:**
/// - 400 Bad Request: Empty or whitespace-only key
/// - 500 Internal Server Error: Database write failure
pub async fn set_tmdb_api_key(
    State(state): State<AppState>,
    Json(payload): Json<SetApiKeyRequest>,
) -> ApiResult<Json<SetApiKeyResponse>> {
    if !crate::config::is_valid_key(&payload.api_key) {
        return Err(ApiError::BadRequest(
            "API key cannot be empty or whitespace-only".to_string(),
        ));
    }

    crate::db::settings::set_tmdb_api_key(&state.db, payload.api_key.trim().to_string())
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to save API key to database: {}", e)))?;

    info!("TMDB API key configured via settings API");

    Ok(Json(SetApiKeyResponse {
        success: true,
        message: "TMDB API key configured successfully".to_string(),
    }))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new().route(
        "/api/settings/tmdb-api-key",
        get(get_tmdb_api_key_status).post(set_tmdb_api_key),
    )
}
