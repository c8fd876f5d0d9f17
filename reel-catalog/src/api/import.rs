//! Import API handlers
//!
//! POST /import/start, GET /import/status, GET /import/events

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    models::ImportStatus,
    AppState,
};

/// Entries imported when the request names no limit
pub const DEFAULT_IMPORT_LIMIT: u32 = 1000;

/// POST /import/start request
#[derive(Debug, Default, Deserialize)]
pub struct StartImportRequest {
    #[serde(default)]
    pub limit: Option<u32>,
}

/// POST /import/start response
#[derive(Debug, Serialize)]
pub struct StartImportResponse {
    pub started: bool,
    pub status: ImportStatus,
}

/// POST /import/start
///
/// Launches a background import and returns immediately with 202 Accepted.
/// A second start while a job is alive is rejected with 409 and leaves the
/// running job untouched.
pub async fn start_import(
    State(state): State<AppState>,
    request: Option<Json<StartImportRequest>>,
) -> ApiResult<(StatusCode, Json<StartImportResponse>)> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let limit = request.limit.unwrap_or(DEFAULT_IMPORT_LIMIT);

    if limit == 0 {
        return Err(ApiError::BadRequest("limit must be positive".to_string()));
    }

    if !state.supervisor.start(limit) {
        return Err(ApiError::Conflict("Import already running".to_string()));
    }

    tracing::info!(limit, "Import start accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(StartImportResponse {
            started: true,
            status: state.supervisor.status(),
        }),
    ))
}

/// GET /import/status
///
/// Never waits on the running job.
pub async fn get_import_status(State(state): State<AppState>) -> Json<ImportStatus> {
    Json(state.supervisor.status())
}

/// Build import routes
pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/import/start", post(start_import))
        .route("/import/status", get(get_import_status))
        .route("/import/events", get(super::import_event_stream))
}
