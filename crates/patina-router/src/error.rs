//! Error types for routing.

use thiserror::Error;

/// Router-specific errors.
///
/// Every variant except [`RouterError::NotFound`] is a registration-time
/// error: it aborts startup and is never produced on the dispatch path.
#[derive(Debug, Error)]
pub enum RouterError {
    /// No route matched the request.
    #[error("no route matched: {method} {path}")]
    NotFound { method: String, path: String },

    /// A route pattern was structurally empty.
    #[error("empty route pattern")]
    EmptyPattern,

    /// A capture name was not a valid identifier.
    #[error("invalid capture name {name:?} in pattern {pattern:?}")]
    InvalidCapture { pattern: String, name: String },

    /// The same capture name appeared twice in one pattern.
    #[error("duplicate capture name {name:?} in pattern {pattern:?}")]
    DuplicateCapture { pattern: String, name: String },

    /// A typed capture named a converter kind that is not registered.
    #[error("no converter registered for capture kind {kind:?}")]
    UnknownConverter { kind: String },

    /// A converter kind was registered twice.
    #[error("converter already registered for kind {kind:?}")]
    ConverterExists { kind: String },
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;
