//! # patina-app
//!
//! The application builder and request dispatcher of the patina core.
//!
//! Everything the other crates provide meets here: the route table and
//! converter registry, the global and scoped middleware chains, the session
//! manager, and the resource binder. The builder runs the single-threaded
//! registration phase and fails fast on any misconfiguration; the built
//! [`App`] is immutable and dispatches requests concurrently.
//!
//! ## Quick Start
//!
//! ```
//! use patina_app::App;
//! use patina_http::{Request, Response};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let app = App::builder()
//!     .get("/data/{int:id}", |req: Request| async move {
//!         let id = req.params.get_int("id").unwrap_or_default();
//!         Response::json(&serde_json::json!({ "id": id }))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let response = app.dispatch(Request::get("/data/42")).await;
//! assert_eq!(response.status, 200);
//!
//! let response = app.dispatch(Request::get("/data/abc")).await;
//! assert_eq!(response.status, 404);
//! # }
//! ```
//!
//! ## Dispatch pipeline
//!
//! ```text
//! Request
//!   -> session handle attached (lazy; no store access yet)
//!   -> global middleware, pre-phase in registration order
//!   -> route lookup (404 on miss, still observed by entered middleware)
//!   -> scoped middleware pre-phase -> handler -> scoped post-phase
//!   -> global middleware, post-phase in reverse order
//!   -> session persistence (only if the session was touched)
//! Response
//! ```
//!
//! A panicking handler or middleware is contained at this boundary and
//! becomes a 500-class response; only registration-phase errors are fatal.

mod app;
mod dispatch;
mod error;
mod render;

pub use app::{App, AppBuilder, Scope};
pub use error::{AppError, Result};
pub use render::{RenderError, Renderer, RequestRenderExt};
