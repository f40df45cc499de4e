//! Error types for remote operations.

use thiserror::Error;

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Classified failure of a remote call.
///
/// None of these are fatal to a local write; the sync layer turns them
/// into warnings and defers to the next reconciliation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The service could not be reached or did not answer in time.
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    /// The service answered with a non-success status.
    #[error("server error {status}: {message}")]
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request could not be built from the given record.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl RemoteError {
    /// Creates a server error.
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
        }
    }

    /// Returns true if repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::NetworkUnreachable(_) => true,
            RemoteError::ServerError { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            RemoteError::MalformedResponse(_) | RemoteError::InvalidRequest(_) => false,
        }
    }

    /// Returns the HTTP status for server errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
