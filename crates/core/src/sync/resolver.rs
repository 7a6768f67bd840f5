//! Cache-aside resolution of catalog queries.
//!
//! Every query is answered from the local store first. The remote catalog is
//! only consulted when the local page is short or stale, and whatever it
//! returns is written back through [`merge_and_persist`] before the response
//! is built.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::merge::merge_and_persist;
use super::{bounded, CatalogEntry, CatalogQuery, SyncError, SyncSettings};
use crate::game::{
    CatalogStats, Game, GameFilter, GameOrdering, GameUpdate, NewGame, PageRequest, Paged,
};
use crate::metrics;
use crate::remote::{RemoteCatalog, RemoteCatalogError, RemotePage};
use crate::store::GameStore;

/// Answers catalog queries from the local store, falling back to the remote catalog.
pub struct CacheAsideResolver {
    store: Arc<dyn GameStore>,
    remote: Option<Arc<dyn RemoteCatalog>>,
    settings: SyncSettings,
}

impl CacheAsideResolver {
    /// Create a resolver. Without a remote catalog every query is answered locally.
    pub fn new(
        store: Arc<dyn GameStore>,
        remote: Option<Arc<dyn RemoteCatalog>>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            store,
            remote,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn GameStore> {
        &self.store
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Resolve one page of a catalog query.
    pub async fn resolve(
        &self,
        query: CatalogQuery,
        page: PageRequest,
    ) -> Result<Paged<CatalogEntry>, SyncError> {
        let kind = query.kind();
        let criteria = query.local_filter();

        let local = match self.local_page(&query, &criteria, page) {
            Ok(local) => local,
            Err(e) => {
                warn!(query = kind, error = %e, "Local lookup failed, going to remote");
                Paged::empty()
            }
        };

        if self.is_sufficient(&local, page) {
            debug!(query = kind, count = local.count, "Answered from local store");
            return Ok(self.answer(kind, "local", local));
        }

        let Some(remote) = &self.remote else {
            debug!(query = kind, "No remote catalog configured, answering locally");
            return Ok(self.answer(kind, "local", local));
        };

        match bounded(
            self.settings.remote_timeout,
            fetch_remote(remote.as_ref(), &query, &criteria, page),
        )
        .await
        {
            Ok(remote_page) => {
                info!(
                    query = kind,
                    local = local.results.len(),
                    remote = remote_page.results.len(),
                    "Local page insufficient, merged remote results"
                );
                metrics::RESOLVER_OUTCOMES
                    .with_label_values(&[kind, "remote"])
                    .inc();
                Ok(self.merge_remote(remote_page, &criteria))
            }
            Err(e) if !local.results.is_empty() => {
                warn!(query = kind, error = %e, "Remote fetch failed, serving local page");
                Ok(self.answer(kind, "degraded", local))
            }
            Err(e) => {
                warn!(query = kind, error = %e, "Remote fetch failed with nothing local");
                Err(SyncError::RemoteUnavailable(e.to_string()))
            }
        }
    }

    pub async fn resolve_search(
        &self,
        text: &str,
        page: PageRequest,
    ) -> Result<Paged<CatalogEntry>, SyncError> {
        self.resolve(CatalogQuery::Search(text.to_string()), page)
            .await
    }

    pub async fn resolve_filter(
        &self,
        criteria: GameFilter,
        page: PageRequest,
    ) -> Result<Paged<CatalogEntry>, SyncError> {
        self.resolve(CatalogQuery::Filter(criteria), page).await
    }

    pub async fn resolve_popular(
        &self,
        page: PageRequest,
    ) -> Result<Paged<CatalogEntry>, SyncError> {
        self.resolve(CatalogQuery::Popular, page).await
    }

    pub async fn resolve_new_releases(
        &self,
        page: PageRequest,
    ) -> Result<Paged<CatalogEntry>, SyncError> {
        self.resolve(CatalogQuery::NewReleases, page).await
    }

    /// Look up one game by internal id, then by numeric external id.
    ///
    /// An external id missing locally is fetched from the remote catalog and stored.
    pub async fn find_game(&self, id: &str) -> Result<CatalogEntry, SyncError> {
        if let Some(game) = self.store.find_by_id(id)? {
            return Ok(CatalogEntry::Stored(game));
        }

        let Ok(external_id) = id.parse::<i64>() else {
            return Err(SyncError::NotFound(id.to_string()));
        };

        if let Some(game) = self.store.find_by_external_id(external_id)? {
            return Ok(CatalogEntry::Stored(game));
        }

        let Some(remote) = &self.remote else {
            return Err(SyncError::NotFound(id.to_string()));
        };

        let record = bounded(
            self.settings.remote_timeout,
            remote.get_detail(external_id),
        )
        .await?;
        Ok(merge_and_persist(self.store.as_ref(), record))
    }

    /// Paged listing of stored games only, newest first unless ordered otherwise.
    pub fn list_local(
        &self,
        mut criteria: GameFilter,
        page: PageRequest,
    ) -> Result<Paged<Game>, SyncError> {
        if criteria.ordering.is_none() {
            criteria.ordering = Some(GameOrdering::CreatedDesc);
        }
        Ok(self.store.filter(&criteria, page)?)
    }

    pub fn create_game(&self, game: NewGame) -> Result<Game, SyncError> {
        let game = self.store.create(game)?;
        info!(id = %game.id, name = %game.name, "Created game");
        Ok(game)
    }

    pub fn update_game(&self, id: &str, update: GameUpdate) -> Result<Game, SyncError> {
        let game = self.store.update(id, update)?;
        info!(id = %game.id, "Updated game");
        Ok(game)
    }

    pub fn delete_game(&self, id: &str) -> Result<(), SyncError> {
        self.store.delete(id)?;
        info!(id, "Deleted game");
        Ok(())
    }

    pub fn stats(&self) -> Result<CatalogStats, SyncError> {
        Ok(self.store.stats()?)
    }

    fn local_page(
        &self,
        query: &CatalogQuery,
        criteria: &GameFilter,
        page: PageRequest,
    ) -> Result<Paged<Game>, SyncError> {
        let local = match query {
            CatalogQuery::Search(text) => self.store.search(text.trim(), page)?,
            _ => self.store.filter(criteria, page)?,
        };
        Ok(local)
    }

    /// A local page answers the query when it is full and nothing on it is stale.
    fn is_sufficient(&self, local: &Paged<Game>, page: PageRequest) -> bool {
        if (local.results.len() as u64) < page.limit() {
            return false;
        }
        if self.settings.stale_after.is_zero() {
            return true;
        }

        let now = Utc::now();
        local.results.iter().all(|game| {
            game.external_id.is_none()
                || (now - game.last_synced)
                    .to_std()
                    .map(|age| age < self.settings.stale_after)
                    .unwrap_or(true)
        })
    }

    fn answer(&self, kind: &str, source: &str, local: Paged<Game>) -> Paged<CatalogEntry> {
        metrics::RESOLVER_OUTCOMES
            .with_label_values(&[kind, source])
            .inc();
        Paged::new(
            local.count,
            local.results.into_iter().map(CatalogEntry::Stored).collect(),
        )
    }

    fn merge_remote(&self, remote_page: RemotePage, criteria: &GameFilter) -> Paged<CatalogEntry> {
        let results = remote_page
            .results
            .into_iter()
            .map(|record| merge_and_persist(self.store.as_ref(), record))
            .filter(|entry| matches_age_rating(entry, criteria))
            .collect();
        Paged::new(remote_page.count, results)
    }
}

async fn fetch_remote(
    remote: &dyn RemoteCatalog,
    query: &CatalogQuery,
    criteria: &GameFilter,
    page: PageRequest,
) -> Result<RemotePage, RemoteCatalogError> {
    match query {
        CatalogQuery::Search(text) => remote.search(text.trim(), page).await,
        _ => remote.filter(&criteria.remote_params(), page).await,
    }
}

/// Age rating has no remote filter, so remote results are narrowed here.
fn matches_age_rating(entry: &CatalogEntry, criteria: &GameFilter) -> bool {
    match (criteria.age_rating, entry) {
        (None, _) => true,
        (Some(wanted), CatalogEntry::Stored(game)) => game.age_rating == wanted,
        (Some(wanted), CatalogEntry::Remote(record)) => {
            crate::game::classify(record.esrb_label()) == wanted
        }
    }
}
