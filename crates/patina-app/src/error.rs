//! Error types for application assembly.

use thiserror::Error;

/// Startup-fatal errors surfaced by [`crate::AppBuilder::build`].
///
/// Registration problems are collected while the builder chain runs and
/// reported here, so a misconfigured application never starts serving.
#[derive(Debug, Error)]
pub enum AppError {
    /// A route or converter failed to register.
    #[error(transparent)]
    Router(#[from] patina_router::RouterError),

    /// A resource failed to bind.
    #[error(transparent)]
    Resource(#[from] patina_resource::ResourceError),
}

/// Result type alias for application assembly.
pub type Result<T> = std::result::Result<T, AppError>;
