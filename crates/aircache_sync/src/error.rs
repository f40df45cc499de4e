//! Error types for the sync layer.

use aircache_remote::RemoteError;
use aircache_store::{PassengerId, StoreError};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors returned to callers of the sync layer.
///
/// Remote failures of background writes never appear here; they are
/// reported as [`crate::SyncWarning`] events instead.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The local store rejected the operation.
    #[error("storage error: {0}")]
    Storage(StoreError),

    /// A booking referenced a passenger that does not exist locally.
    #[error("passenger {passenger_id} does not exist")]
    ReferentialViolation {
        /// The missing parent identity.
        passenger_id: PassengerId,
    },

    /// The remote store could not provide a usable snapshot.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Another reconciliation pass is already running.
    #[error("reconciliation already in progress")]
    ReconcileInProgress,

    /// The operation was cancelled.
    #[error("sync cancelled")]
    Cancelled,

    /// A write was attempted outside a Tokio runtime.
    #[error("no Tokio runtime available for remote writes")]
    NoRuntime,
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ReferentialViolation { passenger_id } => {
                SyncError::ReferentialViolation { passenger_id }
            }
            other => SyncError::Storage(other),
        }
    }
}

impl SyncError {
    /// Returns true if repeating the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Remote(e) => e.is_retryable(),
            SyncError::ReconcileInProgress => true,
            _ => false,
        }
    }

    /// Returns true if the error came from the local store.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            SyncError::Storage(_) | SyncError::ReferentialViolation { .. }
        )
    }
}
