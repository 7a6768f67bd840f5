//! Bulk import of games from the remote catalog.
//!
//! [`BulkImporter`] walks the unfiltered remote feed page by page until it
//! has added the requested number of new games or the feed runs out.
//! [`ImportManager`] runs it as a background task, one job at a time.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};

use super::merge::persist_record;
use super::{bounded, ImportReport, ImportStatus, ImportStop, SyncError, SyncSettings};
use crate::game::PageRequest;
use crate::metrics;
use crate::remote::{RawRecord, RemoteCatalog};
use crate::store::GameStore;

/// Largest target accepted for one run.
pub const MAX_IMPORT_TARGET: u32 = 10_000;

/// Imports net-new games from the remote catalog.
pub struct BulkImporter {
    store: Arc<dyn GameStore>,
    remote: Arc<dyn RemoteCatalog>,
    settings: SyncSettings,
}

impl BulkImporter {
    pub fn new(
        store: Arc<dyn GameStore>,
        remote: Arc<dyn RemoteCatalog>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            store,
            remote,
            settings,
        }
    }

    /// Add up to `target` games that are not in the store yet.
    ///
    /// `cancel` is checked between pages; sending `true` stops the run after
    /// the current page.
    pub async fn import_up_to(&self, target: u32, cancel: watch::Receiver<bool>) -> ImportReport {
        let mut report = ImportReport::new(target);
        let stopped = self.run(&mut report, &cancel).await;
        report.stopped = stopped;

        metrics::IMPORT_RUNS
            .with_label_values(&[stopped.as_str()])
            .inc();
        info!(
            target,
            imported = report.imported,
            skipped = report.skipped,
            already_present = report.already_present,
            failed = report.failed,
            pages = report.pages_fetched,
            stopped = stopped.as_str(),
            "Import finished"
        );

        report
    }

    async fn run(&self, report: &mut ImportReport, cancel: &watch::Receiver<bool>) -> ImportStop {
        if report.target_reached() {
            return ImportStop::TargetReached;
        }

        let mut known = match self.store.external_ids() {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "Could not snapshot stored ids, aborting import");
                report.error = Some(e.to_string());
                return ImportStop::Failed;
            }
        };
        let mut attempted: HashSet<i64> = HashSet::new();
        let feed = BTreeMap::new();
        let page_size = self.settings.import_page_size;
        let mut page_number = 1;

        loop {
            if *cancel.borrow() {
                info!(page = page_number, "Import cancelled");
                return ImportStop::Cancelled;
            }

            let page = match bounded(
                self.settings.remote_timeout,
                self.remote
                    .filter(&feed, PageRequest::new(page_number, page_size)),
            )
            .await
            {
                Ok(page) => page,
                Err(e) => {
                    error!(page = page_number, error = %e, "Import page fetch failed");
                    report.error = Some(e.to_string());
                    return ImportStop::Failed;
                }
            };
            report.pages_fetched += 1;

            if page.results.is_empty() {
                debug!(page = page_number, "Remote feed returned an empty page");
                return ImportStop::Exhausted;
            }

            let has_more = page.has_more();
            for candidate in page.results {
                if report.target_reached() {
                    break;
                }
                self.import_candidate(candidate, &mut known, &mut attempted, report)
                    .await;
            }

            if report.target_reached() {
                return ImportStop::TargetReached;
            }
            if !has_more {
                return ImportStop::Exhausted;
            }
            page_number += 1;
        }
    }

    async fn import_candidate(
        &self,
        candidate: RawRecord,
        known: &mut HashSet<i64>,
        attempted: &mut HashSet<i64>,
        report: &mut ImportReport,
    ) {
        let external_id = candidate.id;
        if known.contains(&external_id) || !attempted.insert(external_id) {
            report.skipped += 1;
            record_outcome("skipped");
            return;
        }

        let record = match bounded(
            self.settings.remote_timeout,
            self.remote.get_detail(external_id),
        )
        .await
        {
            Ok(detail) => detail,
            Err(e) => {
                warn!(external_id, error = %e, "Detail fetch failed, importing listing summary");
                report.summary_fallbacks += 1;
                record_outcome("summary_fallback");
                candidate
            }
        };

        // Another writer may have stored it since the snapshot.
        match self.store.find_by_external_id(external_id) {
            Ok(Some(_)) => {
                known.insert(external_id);
                report.already_present += 1;
                record_outcome("already_present");
                return;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(external_id, error = %e, "Existence check failed");
                report.failed += 1;
                record_outcome("failed");
                return;
            }
        }

        match persist_record(self.store.as_ref(), &record) {
            Ok(outcome) if outcome.created => {
                report.imported += 1;
                record_outcome("imported");
                debug!(external_id, name = %outcome.game.name, "Imported game");
            }
            Ok(_) => {
                known.insert(external_id);
                report.already_present += 1;
                record_outcome("already_present");
            }
            Err(e) => {
                warn!(external_id, error = %e, "Failed to store imported game");
                report.failed += 1;
                record_outcome("failed");
            }
        }
    }
}

fn record_outcome(outcome: &str) {
    metrics::IMPORT_RECORDS.with_label_values(&[outcome]).inc();
}

/// Releases the running flag when the job task ends, including by panic.
struct RunningGuard {
    running: Arc<AtomicBool>,
    status: Arc<RwLock<ImportStatus>>,
    cancel_slot: Arc<RwLock<Option<watch::Sender<bool>>>>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        if let Ok(mut status) = self.status.try_write() {
            if status.running {
                error!("Import task ended without a report");
                status.running = false;
                status.finished_at = Some(Utc::now());
            }
        }
        if let Ok(mut slot) = self.cancel_slot.try_write() {
            *slot = None;
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Runs at most one import at a time in the background and tracks its state.
pub struct ImportManager {
    importer: Arc<BulkImporter>,
    running: Arc<AtomicBool>,
    status: Arc<RwLock<ImportStatus>>,
    cancel_tx: Arc<RwLock<Option<watch::Sender<bool>>>>,
}

impl ImportManager {
    pub fn new(importer: BulkImporter) -> Self {
        Self {
            importer: Arc::new(importer),
            running: Arc::new(AtomicBool::new(false)),
            status: Arc::new(RwLock::new(ImportStatus::default())),
            cancel_tx: Arc::new(RwLock::new(None)),
        }
    }

    /// Start an import job in the background.
    pub async fn start(&self, target: u32) -> Result<ImportStatus, SyncError> {
        if target == 0 || target > MAX_IMPORT_TARGET {
            return Err(SyncError::Validation(format!(
                "count must be between 1 and {}, got {}",
                MAX_IMPORT_TARGET, target
            )));
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(SyncError::ImportInProgress);
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        *self.cancel_tx.write().await = Some(cancel_tx);

        let snapshot = {
            let mut status = self.status.write().await;
            status.running = true;
            status.target = Some(target);
            status.started_at = Some(Utc::now());
            status.finished_at = None;
            status.clone()
        };

        info!(target, "Starting import");

        let importer = Arc::clone(&self.importer);
        let guard = RunningGuard {
            running: Arc::clone(&self.running),
            status: Arc::clone(&self.status),
            cancel_slot: Arc::clone(&self.cancel_tx),
        };
        tokio::spawn(async move {
            let report = importer.import_up_to(target, cancel_rx).await;

            let mut status = guard.status.write().await;
            status.running = false;
            status.finished_at = Some(Utc::now());
            status.last_report = Some(report);
            drop(status);
            *guard.cancel_slot.write().await = None;
            drop(guard);
        });

        Ok(snapshot)
    }

    /// Current job state and the last finished report.
    pub async fn status(&self) -> ImportStatus {
        self.status.read().await.clone()
    }

    /// Ask the running job to stop after its current page. Returns `false` if nothing is running.
    pub async fn cancel(&self) -> bool {
        match self.cancel_tx.read().await.as_ref() {
            Some(tx) => {
                info!("Cancelling import");
                tx.send(true).is_ok()
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
