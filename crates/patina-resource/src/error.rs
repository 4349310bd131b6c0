//! Error types for resource binding.

use thiserror::Error;

use crate::controller::Action;

/// Resource-binding errors.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The controller does not implement every action required of it.
    ///
    /// Produced only by strict binding; the lenient path reports the gap in
    /// a [`crate::BindReport`] instead.
    #[error("controller for resource {resource:?} is missing actions: {actions:?}")]
    MissingCapabilities {
        resource: String,
        actions: Vec<Action>,
    },

    /// A generated route failed to register.
    #[error(transparent)]
    Router(#[from] patina_router::RouterError),
}

/// Result type alias for resource operations.
pub type Result<T> = std::result::Result<T, ResourceError>;
