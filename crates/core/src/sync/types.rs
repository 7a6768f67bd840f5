//! Types for catalog resolution and bulk import.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::{Game, GameFilter, GameOrdering};
use crate::remote::RawRecord;

/// A catalog query the resolver knows how to answer.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogQuery {
    /// Free-text search over names.
    Search(String),
    /// Criteria-based listing.
    Filter(GameFilter),
    /// Highest rated first.
    Popular,
    /// Most recently released first.
    NewReleases,
}

impl CatalogQuery {
    /// Short name used for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogQuery::Search(_) => "search",
            CatalogQuery::Filter(_) => "filter",
            CatalogQuery::Popular => "popular",
            CatalogQuery::NewReleases => "new_releases",
        }
    }

    /// The equivalent local filter.
    pub fn local_filter(&self) -> GameFilter {
        match self {
            CatalogQuery::Search(text) => GameFilter::new().with_search(text.trim()),
            CatalogQuery::Filter(criteria) => criteria.clone(),
            CatalogQuery::Popular => GameFilter::new().with_ordering(GameOrdering::RatingDesc),
            CatalogQuery::NewReleases => {
                GameFilter::new().with_ordering(GameOrdering::ReleasedDesc)
            }
        }
    }
}

/// One slot of a resolved page.
///
/// Remote records that could not be persisted are returned as they came.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CatalogEntry {
    Stored(Game),
    Remote(RawRecord),
}

impl CatalogEntry {
    pub fn external_id(&self) -> Option<i64> {
        match self {
            CatalogEntry::Stored(game) => game.external_id,
            CatalogEntry::Remote(record) => Some(record.id),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CatalogEntry::Stored(game) => &game.name,
            CatalogEntry::Remote(record) => &record.name,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, CatalogEntry::Stored(_))
    }
}

/// Tunables shared by the resolver and the importer.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Synced records older than this make a local page insufficient. Zero disables the check.
    pub stale_after: Duration,
    /// Upper bound for every remote call.
    pub remote_timeout: Duration,
    /// Remote page size used by the importer.
    pub import_page_size: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(168 * 3600),
            remote_timeout: Duration::from_secs(15),
            import_page_size: 40,
        }
    }
}

/// Why an import run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStop {
    /// The requested number of new games was added.
    TargetReached,
    /// The remote feed ran out of pages.
    Exhausted,
    /// The run was cancelled between pages.
    Cancelled,
    /// A page fetch or the initial snapshot failed.
    Failed,
}

impl ImportStop {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStop::TargetReached => "target_reached",
            ImportStop::Exhausted => "exhausted",
            ImportStop::Cancelled => "cancelled",
            ImportStop::Failed => "failed",
        }
    }
}

/// Summary of one import run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Requested number of new games.
    pub target: u32,
    /// Games newly added by this run.
    pub imported: u32,
    /// Candidates skipped because they were already known or seen this run.
    pub skipped: u32,
    /// Candidates that appeared in the store while the run was going.
    pub already_present: u32,
    /// Candidates persisted from the listing summary after a detail fetch failed.
    pub summary_fallbacks: u32,
    /// Candidates that could not be persisted.
    pub failed: u32,
    /// Remote pages fetched.
    pub pages_fetched: u32,
    pub stopped: ImportStop,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportReport {
    pub fn new(target: u32) -> Self {
        Self {
            target,
            imported: 0,
            skipped: 0,
            already_present: 0,
            summary_fallbacks: 0,
            failed: 0,
            pages_fetched: 0,
            stopped: ImportStop::Exhausted,
            error: None,
        }
    }

    pub fn target_reached(&self) -> bool {
        self.imported >= self.target
    }
}

/// Observable state of the import job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportStatus {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_report: Option<ImportReport>,
}
