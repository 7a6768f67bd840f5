//! Game catalog API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use gamedex_core::{
    remote::RAWG_MAX_PAGE_SIZE, AgeRating, CatalogEntry, CatalogStats, Game, GameFilter,
    GameOrdering, GameUpdate, NewGame, PageRequest, Paged,
};
use serde::Deserialize;

use super::{api_error, sync_error, ApiError, SuccessResponse};
use crate::state::AppState;

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl PageParams {
    /// Page request capped at what the remote catalog accepts.
    fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.page_size
                .unwrap_or(PageRequest::DEFAULT_PAGE_SIZE)
                .min(RAWG_MAX_PAGE_SIZE),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    /// Short code (E, E10+, T, M, AO).
    #[serde(default)]
    pub age_rating: Option<String>,
    #[serde(default)]
    pub ordering: Option<GameOrdering>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl FilterParams {
    fn page(&self) -> PageParams {
        PageParams {
            page: self.page,
            page_size: self.page_size,
        }
    }

    fn criteria(&self) -> Result<GameFilter, ApiError> {
        let age_rating = match self.age_rating.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => Some(
                raw.parse::<AgeRating>()
                    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?,
            ),
            None => None,
        };

        Ok(GameFilter {
            search: non_empty(&self.search),
            genre: non_empty(&self.genre),
            platform: non_empty(&self.platform),
            age_rating,
            ordering: self.ordering,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Cache-aside queries
// ============================================================================

/// GET /api/v1/games/search
///
/// Search games by name, filling the local store from RAWG when needed.
pub async fn search_games(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Paged<CatalogEntry>>, ApiError> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "query is required"));
    }

    let page = PageParams {
        page: params.page,
        page_size: params.page_size,
    }
    .page_request();

    state
        .resolver()
        .resolve_search(query, page)
        .await
        .map(Json)
        .map_err(sync_error)
}

/// GET /api/v1/games/filter
pub async fn filter_games(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Result<Json<Paged<CatalogEntry>>, ApiError> {
    let criteria = params.criteria()?;
    let page = params.page().page_request();

    state
        .resolver()
        .resolve_filter(criteria, page)
        .await
        .map(Json)
        .map_err(sync_error)
}

/// GET /api/v1/games/popular
pub async fn popular_games(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paged<CatalogEntry>>, ApiError> {
    state
        .resolver()
        .resolve_popular(params.page_request())
        .await
        .map(Json)
        .map_err(sync_error)
}

/// GET /api/v1/games/new-releases
pub async fn new_releases(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paged<CatalogEntry>>, ApiError> {
    state
        .resolver()
        .resolve_new_releases(params.page_request())
        .await
        .map(Json)
        .map_err(sync_error)
}

/// GET /api/v1/games/{id}
///
/// Look up by internal id, or by RAWG id for numeric ids.
pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CatalogEntry>, ApiError> {
    state
        .resolver()
        .find_game(&id)
        .await
        .map(Json)
        .map_err(sync_error)
}

// ============================================================================
// Local catalog
// ============================================================================

/// GET /api/v1/games/public
///
/// Stored games only, newest first. Never calls RAWG.
pub async fn list_local_games(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Result<Json<Paged<Game>>, ApiError> {
    let criteria = params.criteria()?;
    let page = params.page().page_request();

    state
        .resolver()
        .list_local(criteria, page)
        .map(Json)
        .map_err(sync_error)
}

/// GET /api/v1/games/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<CatalogStats>, ApiError> {
    state.resolver().stats().map(Json).map_err(sync_error)
}

/// POST /api/v1/games
pub async fn create_game(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewGame>,
) -> Result<(StatusCode, Json<Game>), ApiError> {
    let game = state.resolver().create_game(request).map_err(sync_error)?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// PUT /api/v1/games/{id}
pub async fn update_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<GameUpdate>,
) -> Result<Json<Game>, ApiError> {
    state
        .resolver()
        .update_game(&id, request)
        .map(Json)
        .map_err(sync_error)
}

/// DELETE /api/v1/games/{id}
pub async fn delete_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.resolver().delete_game(&id).map_err(sync_error)?;
    Ok(Json(SuccessResponse {
        message: format!("Deleted game {}", id),
    }))
}
