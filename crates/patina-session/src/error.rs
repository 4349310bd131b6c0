//! Error types for session handling.

use thiserror::Error;

/// Session-specific errors.
///
/// Every variant is per-request and recoverable: the dispatcher logs the
/// failure and lets the response flow without fresh persistence.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backing store failed or is unavailable.
    #[error("session store error: {0}")]
    Store(String),

    /// A session value could not be encoded or decoded.
    #[error("session value encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
