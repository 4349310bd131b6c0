//! The view-rendering collaborator seam.
//!
//! Template rendering is not part of the dispatch core; the app only knows
//! an opaque service that turns a template name and a JSON context into
//! bytes. Handlers reach it through the request extensions.

use std::sync::Arc;

use patina_router::BoxFuture;
use thiserror::Error;

/// A failed render.
#[derive(Debug, Error)]
#[error("template {template:?} failed to render: {reason}")]
pub struct RenderError {
    /// Template name that failed.
    pub template: String,
    /// Failure reason reported by the render service.
    pub reason: String,
}

impl RenderError {
    /// Creates a render error.
    pub fn new(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            reason: reason.into(),
        }
    }
}

/// An opaque view-rendering service.
pub trait Renderer: Send + Sync {
    /// Renders a named template against a JSON context.
    fn render<'a>(
        &'a self,
        template: &'a str,
        context: &'a serde_json::Value,
    ) -> BoxFuture<'a, std::result::Result<Vec<u8>, RenderError>>;
}

/// Access to the renderer the dispatcher attached to a request.
pub trait RequestRenderExt {
    /// Returns the configured renderer, if the app has one.
    fn renderer(&self) -> Option<Arc<dyn Renderer>>;
}

impl RequestRenderExt for patina_http::Request {
    fn renderer(&self) -> Option<Arc<dyn Renderer>> {
        self.extensions.get::<Arc<dyn Renderer>>().cloned()
    }
}
