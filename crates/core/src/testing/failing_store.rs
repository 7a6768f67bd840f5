//! Store wrapper that fails writes on demand.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::game::{
    CatalogStats, Game, GameFilter, GameUpdate, NewGame, NormalizedGame, PageRequest, Paged,
};
use crate::store::{GameStore, SqliteGameStore, StoreError, UpsertOutcome};

/// An in-memory store whose writes (and optionally reads) can be made to fail.
///
/// Writes fail by default so merge fallbacks can be exercised directly.
pub struct FailingStore {
    inner: SqliteGameStore,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FailingStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteGameStore::in_memory().expect("in-memory store"),
            fail_writes: AtomicBool::new(true),
            fail_reads: AtomicBool::new(false),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// The wrapped store, for seeding and inspection.
    pub fn inner(&self) -> &SqliteGameStore {
        &self.inner
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database("injected write failure".to_string()));
        }
        Ok(())
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Database("injected read failure".to_string()));
        }
        Ok(())
    }
}

impl GameStore for FailingStore {
    fn find_by_id(&self, id: &str) -> Result<Option<Game>, StoreError> {
        self.check_read()?;
        self.inner.find_by_id(id)
    }

    fn find_by_external_id(&self, external_id: i64) -> Result<Option<Game>, StoreError> {
        self.check_read()?;
        self.inner.find_by_external_id(external_id)
    }

    fn search(&self, text: &str, page: PageRequest) -> Result<Paged<Game>, StoreError> {
        self.check_read()?;
        self.inner.search(text, page)
    }

    fn filter(&self, criteria: &GameFilter, page: PageRequest) -> Result<Paged<Game>, StoreError> {
        self.check_read()?;
        self.inner.filter(criteria, page)
    }

    fn count_matching(&self, criteria: &GameFilter) -> Result<u64, StoreError> {
        self.check_read()?;
        self.inner.count_matching(criteria)
    }

    fn upsert_from_remote(&self, game: &NormalizedGame) -> Result<UpsertOutcome, StoreError> {
        self.check_write()?;
        self.inner.upsert_from_remote(game)
    }

    fn external_ids(&self) -> Result<HashSet<i64>, StoreError> {
        self.check_read()?;
        self.inner.external_ids()
    }

    fn create(&self, game: NewGame) -> Result<Game, StoreError> {
        self.check_write()?;
        self.inner.create(game)
    }

    fn update(&self, id: &str, update: GameUpdate) -> Result<Game, StoreError> {
        self.check_write()?;
        self.inner.update(id, update)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.check_write()?;
        self.inner.delete(id)
    }

    fn stats(&self) -> Result<CatalogStats, StoreError> {
        self.check_read()?;
        self.inner.stats()
    }
}
