//! Remote game catalog integration (RAWG).
//!
//! The [`RemoteCatalog`] trait is the only view the sync layer has of the
//! remote source. Responses are decoded into [`RawRecord`] at the boundary so
//! nothing downstream deals with untyped JSON.

mod rawg;
mod types;

pub use rawg::{RawgClient, RawgConfig, RAWG_MAX_PAGE_SIZE};
pub use types::*;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::game::PageRequest;

/// Errors that can occur when talking to the remote catalog.
#[derive(Debug, Error)]
pub enum RemoteCatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),

    /// The call did not complete in time.
    #[error("Remote call timed out after {0:?}")]
    Timeout(Duration),
}

impl RemoteCatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteCatalogError::NotFound(_))
    }
}

/// Trait for remote catalog clients.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Free-text search. An empty query returns the catalog's default
    /// (most relevant) feed.
    async fn search(
        &self,
        query: &str,
        page: PageRequest,
    ) -> Result<RemotePage, RemoteCatalogError>;

    /// List games matching remote query parameters (ordering, genres, ...).
    async fn filter(
        &self,
        params: &BTreeMap<String, String>,
        page: PageRequest,
    ) -> Result<RemotePage, RemoteCatalogError>;

    /// Fetch the full record for one game.
    async fn get_detail(&self, external_id: i64) -> Result<RawRecord, RemoteCatalogError>;
}
