//! Mock remote catalog for testing.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::game::PageRequest;
use crate::remote::{RawRecord, RemoteCatalog, RemoteCatalogError, RemotePage};

use super::fixtures;

/// A recorded remote query for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRemoteQuery {
    Search {
        query: String,
        page: PageRequest,
    },
    Filter {
        params: BTreeMap<String, String>,
        page: PageRequest,
    },
    GetDetail {
        external_id: i64,
    },
}

/// Mock implementation of the RemoteCatalog trait.
///
/// Provides controllable behavior for testing:
/// - Serve a fixed list of records, paged like the real API
/// - Serve an endless feed of distinct records
/// - Track queries for assertions
/// - Simulate failures and slow responses
///
/// Listing calls ignore search text and filter parameters; every listing is
/// a page of the configured records.
///
/// # Example
///
/// ```rust,ignore
/// use gamedex_core::testing::{MockRemoteCatalog, fixtures};
///
/// let remote = MockRemoteCatalog::new();
/// remote.set_records(fixtures::raw_records(1..=30)).await;
///
/// let page = remote.search("anything", PageRequest::new(1, 20)).await?;
/// assert_eq!(page.results.len(), 20);
/// ```
#[derive(Debug)]
pub struct MockRemoteCatalog {
    /// Records served by listings and detail lookups.
    records: Arc<RwLock<Vec<RawRecord>>>,
    /// Count reported by listings; defaults to the number of records.
    reported_count: Arc<RwLock<Option<u64>>>,
    /// Generate records on demand instead of serving `records`.
    endless: Arc<RwLock<bool>>,
    /// Ids whose detail lookup fails.
    failing_details: Arc<RwLock<HashSet<i64>>>,
    /// Delay applied to every call.
    delay: Arc<RwLock<Option<Duration>>>,
    /// Recorded queries.
    queries: Arc<RwLock<Vec<RecordedRemoteQuery>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<RemoteCatalogError>>>,
}

impl Default for MockRemoteCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRemoteCatalog {
    /// Create a new empty mock remote catalog.
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            reported_count: Arc::new(RwLock::new(None)),
            endless: Arc::new(RwLock::new(false)),
            failing_details: Arc::new(RwLock::new(HashSet::new())),
            delay: Arc::new(RwLock::new(None)),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replace the served records.
    pub async fn set_records(&self, records: Vec<RawRecord>) {
        *self.records.write().await = records;
    }

    /// Add one record.
    pub async fn add_record(&self, record: RawRecord) {
        self.records.write().await.push(record);
    }

    /// Report this total instead of the number of records.
    pub async fn set_reported_count(&self, count: u64) {
        *self.reported_count.write().await = Some(count);
    }

    /// Serve a feed that never runs out. Page `n` holds ids
    /// `(n - 1) * page_size + 1 ..= n * page_size`.
    pub async fn set_endless(&self, endless: bool) {
        *self.endless.write().await = endless;
    }

    /// Make detail lookups for these ids fail.
    pub async fn fail_detail_for(&self, ids: &[i64]) {
        self.failing_details.write().await.extend(ids.iter().copied());
    }

    /// Delay every call by this long.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    // =========================================================================
    // Query Recording
    // =========================================================================

    /// Get all recorded queries.
    pub async fn recorded_queries(&self) -> Vec<RecordedRemoteQuery> {
        self.queries.read().await.clone()
    }

    /// Clear recorded queries.
    pub async fn clear_recorded(&self) {
        self.queries.write().await.clear();
    }

    /// Get the number of queries performed.
    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }

    /// Get the number of listing queries performed.
    pub async fn listing_count(&self) -> usize {
        self.queries
            .read()
            .await
            .iter()
            .filter(|q| !matches!(q, RecordedRemoteQuery::GetDetail { .. }))
            .count()
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: RemoteCatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<RemoteCatalogError> {
        self.next_error.write().await.take()
    }

    async fn record(&self, query: RecordedRemoteQuery) -> Result<(), RemoteCatalogError> {
        self.queries.write().await.push(query);

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.take_error().await {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn listing(&self, page: PageRequest) -> RemotePage {
        if *self.endless.read().await {
            let first = page.offset() as i64 + 1;
            let last = first + page.page_size as i64 - 1;
            return RemotePage {
                count: u64::MAX,
                next: Some(format!("mock://games?page={}", page.page + 1)),
                results: fixtures::raw_records(first..=last),
            };
        }

        let records = self.records.read().await;
        let total = records.len() as u64;
        let results: Vec<RawRecord> = records
            .iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();
        let next = if page.offset() + (results.len() as u64) < total {
            Some(format!("mock://games?page={}", page.page + 1))
        } else {
            None
        };

        RemotePage {
            count: self.reported_count.read().await.unwrap_or(total),
            next,
            results,
        }
    }
}

#[async_trait]
impl RemoteCatalog for MockRemoteCatalog {
    async fn search(
        &self,
        query: &str,
        page: PageRequest,
    ) -> Result<RemotePage, RemoteCatalogError> {
        self.record(RecordedRemoteQuery::Search {
            query: query.to_string(),
            page,
        })
        .await?;
        Ok(self.listing(page).await)
    }

    async fn filter(
        &self,
        params: &BTreeMap<String, String>,
        page: PageRequest,
    ) -> Result<RemotePage, RemoteCatalogError> {
        self.record(RecordedRemoteQuery::Filter {
            params: params.clone(),
            page,
        })
        .await?;
        Ok(self.listing(page).await)
    }

    async fn get_detail(&self, external_id: i64) -> Result<RawRecord, RemoteCatalogError> {
        self.record(RecordedRemoteQuery::GetDetail { external_id })
            .await?;

        if self.failing_details.read().await.contains(&external_id) {
            return Err(RemoteCatalogError::ApiError {
                status: 500,
                message: format!("detail lookup failed for {}", external_id),
            });
        }

        if *self.endless.read().await {
            let mut record = fixtures::raw_record(external_id, &format!("Game {}", external_id));
            record.description_raw = Some(format!("Details for game {}.", external_id));
            return Ok(record);
        }

        self.records
            .read()
            .await
            .iter()
            .find(|r| r.id == external_id)
            .cloned()
            .ok_or_else(|| RemoteCatalogError::NotFound(format!("Game ID {}", external_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pages_through_records() {
        let remote = MockRemoteCatalog::new();
        remote.set_records(fixtures::raw_records(1..=5)).await;

        let first = remote.search("", PageRequest::new(1, 2)).await.unwrap();
        let last = remote.search("", PageRequest::new(3, 2)).await.unwrap();

        assert_eq!(first.count, 5);
        assert!(first.has_more());
        assert_eq!(last.results.len(), 1);
        assert!(!last.has_more());
        assert_eq!(remote.query_count().await, 2);
    }

    #[tokio::test]
    async fn test_endless_feed_has_distinct_ids() {
        let remote = MockRemoteCatalog::new();
        remote.set_endless(true).await;

        let p1 = remote.filter(&BTreeMap::new(), PageRequest::new(1, 3)).await.unwrap();
        let p2 = remote.filter(&BTreeMap::new(), PageRequest::new(2, 3)).await.unwrap();

        let ids: Vec<i64> = p1.results.iter().chain(&p2.results).map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        assert!(p2.has_more());
    }

    #[tokio::test]
    async fn test_error_injection_is_one_shot() {
        let remote = MockRemoteCatalog::new();
        remote
            .set_next_error(RemoteCatalogError::RateLimitExceeded)
            .await;

        assert!(remote.get_detail(1).await.is_err());
        assert!(matches!(
            remote.get_detail(1).await,
            Err(RemoteCatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cleared_error_is_not_raised() {
        let remote = MockRemoteCatalog::new();
        remote.set_records(fixtures::raw_records(1..=2)).await;
        remote
            .set_next_error(RemoteCatalogError::RateLimitExceeded)
            .await;
        remote.clear_next_error().await;

        assert!(remote.search("", PageRequest::new(1, 10)).await.is_ok());
        assert!(remote.get_detail(1).await.is_ok());
        assert_eq!(remote.listing_count().await, 1);
        assert_eq!(remote.query_count().await, 2);
    }

    #[tokio::test]
    async fn test_failing_details() {
        let remote = MockRemoteCatalog::new();
        remote.set_records(fixtures::raw_records(1..=3)).await;
        remote.fail_detail_for(&[2]).await;

        assert!(remote.get_detail(1).await.is_ok());
        assert!(remote.get_detail(2).await.is_err());
    }
}
