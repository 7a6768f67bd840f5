//! Catalog sync integration tests.
//!
//! These tests drive the resolver and the importer against an on-disk store
//! and a mock remote catalog:
//! query -> local page -> remote fallback -> merge -> store

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::watch;

use gamedex_core::{
    sync::merge::normalize_record,
    testing::{fixtures, FailingStore, MockRemoteCatalog},
    BulkImporter, CacheAsideResolver, CatalogEntry, GameFilter, GameStore, ImportStop,
    PageRequest, RemoteCatalog, SqliteGameStore, SyncError, SyncSettings,
};

/// Test helper owning an on-disk store and a mock remote.
struct TestHarness {
    store: Arc<SqliteGameStore>,
    remote: Arc<MockRemoteCatalog>,
    temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("games.db");
        let store = Arc::new(SqliteGameStore::new(&db_path).expect("Failed to create store"));

        Self {
            store,
            remote: Arc::new(MockRemoteCatalog::new()),
            temp_dir,
        }
    }

    /// A second connection to the same database file.
    fn second_store(&self) -> Arc<SqliteGameStore> {
        let db_path = self.temp_dir.path().join("games.db");
        Arc::new(SqliteGameStore::new(&db_path).expect("Failed to open second store"))
    }

    fn settings() -> SyncSettings {
        SyncSettings {
            stale_after: Duration::from_secs(3600),
            remote_timeout: Duration::from_secs(2),
            import_page_size: 5,
        }
    }

    fn resolver(&self) -> CacheAsideResolver {
        CacheAsideResolver::new(
            Arc::clone(&self.store) as Arc<dyn GameStore>,
            Some(Arc::clone(&self.remote) as Arc<dyn RemoteCatalog>),
            Self::settings(),
        )
    }

    fn importer(&self) -> BulkImporter {
        BulkImporter::new(
            Arc::clone(&self.store) as Arc<dyn GameStore>,
            Arc::clone(&self.remote) as Arc<dyn RemoteCatalog>,
            Self::settings(),
        )
    }

    fn stored_count(&self) -> u64 {
        self.store.count_matching(&GameFilter::new()).unwrap()
    }
}

fn never_cancelled() -> watch::Receiver<bool> {
    watch::channel(false).1
}

#[tokio::test]
async fn test_local_hit_then_remote_fallback() {
    let harness = TestHarness::new();
    fixtures::seed_store(harness.store.as_ref(), 1..=20);
    harness.remote.set_records(fixtures::raw_records(1..=60)).await;
    let resolver = harness.resolver();

    // Page 1 is fully local
    let page1 = resolver.resolve_popular(PageRequest::new(1, 20)).await.unwrap();
    assert_eq!(page1.count, 20);
    assert_eq!(harness.remote.query_count().await, 0);

    // Page 2 is empty locally and comes from the remote
    let page2 = resolver.resolve_popular(PageRequest::new(2, 20)).await.unwrap();
    assert_eq!(page2.count, 60);
    assert_eq!(page2.results.len(), 20);
    assert_eq!(harness.remote.query_count().await, 1);
    assert_eq!(harness.stored_count(), 40);

    // Now both pages are local
    harness.remote.clear_recorded().await;
    resolver.resolve_popular(PageRequest::new(2, 20)).await.unwrap();
    assert_eq!(harness.remote.query_count().await, 0);
}

#[tokio::test]
async fn test_short_search_refetches_and_dedupes() {
    let harness = TestHarness::new();
    fixtures::seed_store(harness.store.as_ref(), 1..=5);
    harness.remote.set_records(fixtures::raw_records(1..=8)).await;
    let resolver = harness.resolver();

    let page = resolver
        .resolve_search("game", PageRequest::new(1, 20))
        .await
        .unwrap();

    assert_eq!(page.count, 8);
    assert_eq!(page.results.len(), 8);
    assert_eq!(harness.stored_count(), 8);

    let ids: HashSet<i64> = page.results.iter().filter_map(CatalogEntry::external_id).collect();
    assert_eq!(ids.len(), 8);
}

#[tokio::test]
async fn test_store_write_failures_return_raw_records() {
    let store = Arc::new(FailingStore::new());
    let remote = Arc::new(MockRemoteCatalog::new());
    remote.set_records(fixtures::raw_records(1..=3)).await;
    let resolver = CacheAsideResolver::new(
        Arc::clone(&store) as Arc<dyn GameStore>,
        Some(Arc::clone(&remote) as Arc<dyn RemoteCatalog>),
        TestHarness::settings(),
    );

    let page = resolver.resolve_popular(PageRequest::default()).await.unwrap();

    assert_eq!(page.results.len(), 3);
    assert!(page
        .results
        .iter()
        .all(|entry| matches!(entry, CatalogEntry::Remote(_))));
}

#[tokio::test]
async fn test_store_read_failure_still_answers_from_remote() {
    let store = Arc::new(FailingStore::new());
    store.set_fail_reads(true);
    store.set_fail_writes(false);
    let remote = Arc::new(MockRemoteCatalog::new());
    remote.set_records(fixtures::raw_records(1..=2)).await;
    let resolver = CacheAsideResolver::new(
        Arc::clone(&store) as Arc<dyn GameStore>,
        Some(Arc::clone(&remote) as Arc<dyn RemoteCatalog>),
        TestHarness::settings(),
    );

    let page = resolver.resolve_popular(PageRequest::default()).await.unwrap();

    assert_eq!(page.results.len(), 2);
    assert!(store.inner().find_by_external_id(2).unwrap().is_some());
}

#[tokio::test]
async fn test_remote_outage_with_empty_store() {
    let harness = TestHarness::new();
    harness.remote.set_delay(Duration::from_secs(5)).await;
    let resolver = CacheAsideResolver::new(
        Arc::clone(&harness.store) as Arc<dyn GameStore>,
        Some(Arc::clone(&harness.remote) as Arc<dyn RemoteCatalog>),
        SyncSettings {
            remote_timeout: Duration::from_millis(50),
            ..TestHarness::settings()
        },
    );

    let result = resolver.resolve_new_releases(PageRequest::default()).await;

    assert!(matches!(result, Err(SyncError::RemoteUnavailable(_))));
}

#[tokio::test]
async fn test_import_quota_against_endless_source() {
    let harness = TestHarness::new();
    harness.remote.set_endless(true).await;

    let report = harness.importer().import_up_to(10, never_cancelled()).await;

    assert_eq!(report.imported, 10);
    assert_eq!(report.stopped, ImportStop::TargetReached);
    assert_eq!(harness.stored_count(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_import_with_concurrent_writer_keeps_ids_unique() {
    let harness = TestHarness::new();
    harness.remote.set_endless(true).await;
    harness.remote.set_delay(Duration::from_millis(2)).await;

    // Another connection writes overlapping ids while the import runs
    let other = harness.second_store();
    let writer = tokio::task::spawn_blocking(move || {
        for record in fixtures::raw_records(1..=30) {
            other.upsert_from_remote(&normalize_record(&record)).unwrap();
            std::thread::sleep(Duration::from_millis(1));
        }
    });

    let report = harness.importer().import_up_to(10, never_cancelled()).await;
    writer.await.unwrap();

    assert_eq!(report.imported, 10);
    let total = harness.stored_count();
    let distinct = harness.store.external_ids().unwrap().len() as u64;
    assert_eq!(total, distinct);
    assert!(total >= 30);
}

#[tokio::test]
async fn test_import_survives_detail_failures_mid_run() {
    let harness = TestHarness::new();
    harness.remote.set_records(fixtures::raw_records(1..=12)).await;
    harness.remote.fail_detail_for(&[3, 4, 7]).await;

    let report = harness.importer().import_up_to(12, never_cancelled()).await;

    assert_eq!(report.imported, 12);
    assert_eq!(report.summary_fallbacks, 3);
    assert_eq!(report.failed, 0);

    // Fallback records still got normalized defaults
    let game = harness.store.find_by_external_id(4).unwrap().unwrap();
    assert_eq!(game.name, "Game 4");
    assert!(!game.description.is_empty());
}

#[tokio::test]
async fn test_second_import_only_counts_new_games() {
    let harness = TestHarness::new();
    harness.remote.set_records(fixtures::raw_records(1..=15)).await;

    let first = harness.importer().import_up_to(10, never_cancelled()).await;
    let second = harness.importer().import_up_to(10, never_cancelled()).await;

    assert_eq!(first.imported, 10);
    assert_eq!(second.imported, 5);
    assert_eq!(second.skipped, 10);
    assert_eq!(second.stopped, ImportStop::Exhausted);
    assert_eq!(harness.stored_count(), 15);
}
