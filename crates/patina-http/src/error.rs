//! Error types for request/response handling.

use thiserror::Error;

/// HTTP primitive errors.
#[derive(Debug, Error)]
pub enum HttpError {
    /// A required path parameter was not bound.
    #[error("missing path parameter: {0}")]
    MissingParam(String),

    /// A path parameter was bound with a different type than requested.
    #[error("path parameter {name} is not a {expected}")]
    ParamType {
        name: String,
        expected: &'static str,
    },

    /// The request body could not be decoded as JSON.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Result type alias for HTTP primitive operations.
pub type Result<T> = std::result::Result<T, HttpError>;
