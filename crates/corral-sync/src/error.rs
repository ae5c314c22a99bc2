//! Reconciliation error types.

use thiserror::Error;

use corral_directory::DirectoryError;
use corral_store::StoreError;

/// Error that aborts a reconciliation request.
///
/// Per-entity problems (invalid names, naming collisions) never surface
/// here; they degrade to the request's [`SyncReport`](crate::SyncReport).
#[derive(Debug, Error)]
pub enum SyncError {
    /// Talking to the directory failed; surfaced to the caller as a
    /// communication error and never retried internally.
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// The identity store rejected an operation.
    #[error("identity store error: {0}")]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Whether a retry at the caller's level could help.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Directory(e) => e.is_transient(),
            SyncError::Store(_) => false,
        }
    }
}

/// Result type for reconciliation operations.
pub type SyncResult<T> = Result<T, SyncError>;
