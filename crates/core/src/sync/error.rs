//! Errors surfaced by the sync layer.

use thiserror::Error;

use crate::remote::RemoteCatalogError;
use crate::store::StoreError;

/// Errors from catalog resolution and import.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No game with that identity, locally or remotely.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote catalog failed and there was nothing local to fall back to.
    #[error("remote catalog unavailable: {0}")]
    RemoteUnavailable(String),

    /// The request was rejected.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An import job is already running.
    #[error("an import is already running")]
    ImportInProgress,

    /// Generic store failure.
    #[error("store error: {0}")]
    Store(String),
}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => SyncError::NotFound(id),
            StoreError::Validation(msg) => SyncError::Validation(msg),
            StoreError::DuplicateIdentity(_) => SyncError::Validation(e.to_string()),
            other => SyncError::Store(other.to_string()),
        }
    }
}

impl From<RemoteCatalogError> for SyncError {
    fn from(e: RemoteCatalogError) -> Self {
        match e {
            RemoteCatalogError::NotFound(what) => SyncError::NotFound(what),
            other => SyncError::RemoteUnavailable(other.to_string()),
        }
    }
}
