//! Local game store.
//!
//! The store is the only shared mutable resource. Synchronized data is written
//! exclusively through [`GameStore::upsert_from_remote`], which is an atomic
//! compare-and-upsert keyed by `external_id`: concurrent callers converge on a
//! single row instead of racing an existence check against an insert.

mod sqlite;
mod watchlist;

pub use sqlite::SqliteGameStore;
pub use watchlist::{WatchlistAdd, WatchlistStore, MAX_PROFILE_ID_LEN};

use std::collections::HashSet;

use thiserror::Error;

use crate::game::{
    CatalogStats, Game, GameFilter, GameUpdate, NewGame, NormalizedGame, PageRequest, Paged,
};

/// Result of [`GameStore::upsert_from_remote`].
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    /// The stored game after the write.
    pub game: Game,
    /// `true` if this call inserted the row, `false` if it updated an existing one.
    pub created: bool,
}

/// Trait for game storage.
pub trait GameStore: Send + Sync {
    /// Get a game by its internal id.
    fn find_by_id(&self, id: &str) -> Result<Option<Game>, StoreError>;

    /// Get a game by its remote catalog id.
    fn find_by_external_id(&self, external_id: i64) -> Result<Option<Game>, StoreError>;

    /// Case-insensitive substring search over game names.
    fn search(&self, text: &str, page: PageRequest) -> Result<Paged<Game>, StoreError>;

    /// List games matching the criteria.
    fn filter(&self, criteria: &GameFilter, page: PageRequest) -> Result<Paged<Game>, StoreError>;

    /// Count games matching the criteria.
    fn count_matching(&self, criteria: &GameFilter) -> Result<u64, StoreError>;

    /// Insert or update a game from the remote catalog, keyed by external id.
    ///
    /// Never fails with [`StoreError::DuplicateIdentity`]: an existing row
    /// with the same external id is updated instead.
    fn upsert_from_remote(&self, game: &NormalizedGame) -> Result<UpsertOutcome, StoreError>;

    /// All external ids currently stored.
    fn external_ids(&self) -> Result<HashSet<i64>, StoreError>;

    /// Create a game by hand.
    fn create(&self, game: NewGame) -> Result<Game, StoreError>;

    /// Apply a partial update to a stored game.
    fn update(&self, id: &str, update: GameUpdate) -> Result<Game, StoreError>;

    /// Delete a game.
    fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Get catalog statistics.
    fn stats(&self) -> Result<CatalogStats, StoreError>;
}

/// Errors for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("A game with external id {0} already exists")]
    DuplicateIdentity(i64),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}
