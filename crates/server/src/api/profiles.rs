//! Profile watchlist API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use gamedex_core::{Game, SyncError};
use serde::Deserialize;

use super::{api_error, sync_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddToWatchlistRequest {
    /// Internal id or numeric external id of a stored game.
    pub game_id: Option<String>,
}

/// GET /api/v1/profiles/{id}/watchlist
pub async fn get_watchlist(
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<String>,
) -> Result<Json<Vec<Game>>, ApiError> {
    let games = state
        .watchlists()
        .watchlist(&profile_id)
        .map_err(|e| sync_error(SyncError::from(e)))?;
    Ok(Json(games))
}

/// POST /api/v1/profiles/{id}/watchlist
///
/// Returns 201 when the game was added and 200 when it was already listed.
pub async fn add_to_watchlist(
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<String>,
    Json(request): Json<AddToWatchlistRequest>,
) -> Result<(StatusCode, Json<Game>), ApiError> {
    let game_id = request
        .game_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "game_id is required"))?;

    let outcome = state
        .watchlists()
        .add_to_watchlist(&profile_id, &game_id)
        .map_err(|e| sync_error(SyncError::from(e)))?;

    let status = if outcome.added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome.game)))
}

/// DELETE /api/v1/profiles/{id}/watchlist/{game_id}
///
/// Returns the remaining watchlist.
pub async fn remove_from_watchlist(
    State(state): State<Arc<AppState>>,
    Path((profile_id, game_id)): Path<(String, String)>,
) -> Result<Json<Vec<Game>>, ApiError> {
    let watchlists = state.watchlists();
    let removed = watchlists
        .remove_from_watchlist(&profile_id, &game_id)
        .map_err(|e| sync_error(SyncError::from(e)))?;
    if !removed {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Game {} is not on the watchlist", game_id),
        ));
    }

    let games = watchlists
        .watchlist(&profile_id)
        .map_err(|e| sync_error(SyncError::from(e)))?;
    Ok(Json(games))
}
