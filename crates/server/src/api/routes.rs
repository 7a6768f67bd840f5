use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{games, handlers, import, middleware::metrics_middleware, profiles};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Cache-aside queries
        .route("/games/search", get(games::search_games))
        .route("/games/filter", get(games::filter_games))
        .route("/games/popular", get(games::popular_games))
        .route("/games/new-releases", get(games::new_releases))
        // Local catalog
        .route("/games/public", get(games::list_local_games))
        .route("/games/stats", get(games::get_stats))
        // Bulk import
        .route(
            "/games/import",
            post(import::start_import)
                .get(import::get_import_status)
                .delete(import::cancel_import),
        )
        // Single games
        .route("/games", post(games::create_game))
        .route(
            "/games/{id}",
            get(games::get_game)
                .put(games::update_game)
                .delete(games::delete_game),
        )
        // Profile watchlists
        .route(
            "/profiles/{id}/watchlist",
            get(profiles::get_watchlist).post(profiles::add_to_watchlist),
        )
        .route(
            "/profiles/{id}/watchlist/{game_id}",
            delete(profiles::remove_from_watchlist),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
