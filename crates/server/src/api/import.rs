//! Bulk import API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use gamedex_core::{ImportManager, ImportStatus};
use serde::Deserialize;

use super::{api_error, sync_error, ApiError, SuccessResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StartImportRequest {
    /// Number of new games to add.
    pub count: u32,
}

fn import_manager(state: &AppState) -> Result<&ImportManager, ApiError> {
    state.imports().ok_or_else(|| {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Remote catalog not configured",
        )
    })
}

/// POST /api/v1/games/import
///
/// Start a background import. Only one import runs at a time.
pub async fn start_import(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartImportRequest>,
) -> Result<(StatusCode, Json<ImportStatus>), ApiError> {
    let imports = import_manager(&state)?;
    let status = imports.start(request.count).await.map_err(sync_error)?;
    Ok((StatusCode::ACCEPTED, Json(status)))
}

/// GET /api/v1/games/import
pub async fn get_import_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ImportStatus>, ApiError> {
    let imports = import_manager(&state)?;
    Ok(Json(imports.status().await))
}

/// DELETE /api/v1/games/import
///
/// Ask the running import to stop after its current page.
pub async fn cancel_import(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let imports = import_manager(&state)?;
    if imports.cancel().await {
        Ok(Json(SuccessResponse {
            message: "Import cancellation requested".to_string(),
        }))
    } else {
        Err(api_error(StatusCode::NOT_FOUND, "No import is running"))
    }
}
