//! Catalog synchronization.
//!
//! - [`CacheAsideResolver`] answers queries locally and falls back to the remote catalog
//! - [`BulkImporter`] backfills the store with games it does not have yet
//! - [`merge`] is the single path from a remote record to a stored game

mod error;
mod importer;
pub mod merge;
mod resolver;
mod types;

pub use error::SyncError;
pub use importer::{BulkImporter, ImportManager, MAX_IMPORT_TARGET};
pub use resolver::CacheAsideResolver;
pub use types::*;

use std::future::Future;
use std::time::Duration;

use crate::remote::RemoteCatalogError;

/// Run a remote call with an upper bound on its duration.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, RemoteCatalogError>
where
    F: Future<Output = Result<T, RemoteCatalogError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(RemoteCatalogError::Timeout(limit)),
    }
}
