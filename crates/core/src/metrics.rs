//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Cache-aside resolution (local hits, remote fallbacks, degraded answers)
//! - Store writes from synchronization
//! - Bulk imports
//! - Remote catalog calls

use std::time::Duration;

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Resolver Metrics
// =============================================================================

/// Resolver outcomes by query kind.
pub static RESOLVER_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gamedex_resolver_outcomes_total",
            "Catalog queries by how they were answered",
        ),
        &["query", "source"], // source: "local", "remote", "degraded"
    )
    .unwrap()
});

/// Remote records that could not be persisted and were returned raw.
pub static MERGE_FALLBACKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "gamedex_merge_fallbacks_total",
        "Remote records returned unpersisted after a store failure",
    )
    .unwrap()
});

// =============================================================================
// Store Metrics
// =============================================================================

/// Upserts from the remote catalog by outcome.
pub static UPSERTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gamedex_upserts_total",
            "Games written from the remote catalog",
        ),
        &["outcome"], // "created", "updated"
    )
    .unwrap()
});

// =============================================================================
// Import Metrics
// =============================================================================

/// Import candidates by outcome.
pub static IMPORT_RECORDS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gamedex_import_records_total",
            "Bulk import candidates by outcome",
        ),
        &["outcome"], // "imported", "skipped", "already_present", "summary_fallback", "failed"
    )
    .unwrap()
});

/// Completed import runs by result.
pub static IMPORT_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("gamedex_import_runs_total", "Bulk import runs by result"),
        &["result"], // "target_reached", "exhausted", "cancelled", "failed"
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// Remote catalog request duration.
pub static REMOTE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "gamedex_remote_duration_seconds",
            "Duration of remote catalog calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation"],
    )
    .unwrap()
});

/// Remote catalog requests total.
pub static REMOTE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gamedex_remote_requests_total",
            "Total remote catalog requests",
        ),
        &["operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record one remote catalog call.
pub fn record_remote_call(operation: &str, elapsed: Duration, success: bool) {
    REMOTE_DURATION
        .with_label_values(&[operation])
        .observe(elapsed.as_secs_f64());
    REMOTE_REQUESTS
        .with_label_values(&[operation, if success { "success" } else { "error" }])
        .inc();
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Resolver
        Box::new(RESOLVER_OUTCOMES.clone()),
        Box::new(MERGE_FALLBACKS.clone()),
        // Store
        Box::new(UPSERTS.clone()),
        // Import
        Box::new(IMPORT_RECORDS.clone()),
        Box::new(IMPORT_RUNS.clone()),
        // Remote
        Box::new(REMOTE_DURATION.clone()),
        Box::new(REMOTE_REQUESTS.clone()),
    ]
}
