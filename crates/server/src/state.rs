use std::sync::Arc;

use gamedex_core::{CacheAsideResolver, Config, ImportManager, SanitizedConfig, WatchlistStore};

/// Shared application state
pub struct AppState {
    config: Config,
    resolver: CacheAsideResolver,
    watchlists: Arc<dyn WatchlistStore>,
    imports: Option<ImportManager>,
}

impl AppState {
    pub fn new(
        config: Config,
        resolver: CacheAsideResolver,
        watchlists: Arc<dyn WatchlistStore>,
        imports: Option<ImportManager>,
    ) -> Self {
        Self {
            config,
            resolver,
            watchlists,
            imports,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn resolver(&self) -> &CacheAsideResolver {
        &self.resolver
    }

    pub fn watchlists(&self) -> &dyn WatchlistStore {
        self.watchlists.as_ref()
    }

    /// Import jobs, available only when a remote catalog is configured.
    pub fn imports(&self) -> Option<&ImportManager> {
        self.imports.as_ref()
    }
}
