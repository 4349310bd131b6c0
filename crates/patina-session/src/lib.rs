//! # patina-session
//!
//! Cookie-correlated, per-client session state for the patina dispatch core.
//!
//! This crate provides:
//! - [`Session`] - a lazy, cloneable handle into the session store
//! - [`SessionStore`] - the storage interface, with an in-memory
//!   [`MemoryStore`] implementation
//! - [`SessionManager`] - resolve-on-request / persist-on-response glue and
//!   the session cookie policy
//!
//! ## Lifecycle
//!
//! The manager reads the session-id cookie when a request comes in and hands
//! the request a lazy [`Session`]. The store is only consulted on the
//! handle's first read or write, so requests that never use the session
//! never pay for it. After the handler runs, [`SessionManager::persist`]
//! stores mutated data and refreshes the cookie; an untouched session leaves
//! the response untouched too.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use patina_http::{Request, Response};
//! use patina_session::{MemoryStore, SessionManager};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let manager = SessionManager::new(Arc::new(MemoryStore::new()));
//!
//! let session = manager.resolve(&Request::get("/"));
//! session.insert("user", "alice").await.unwrap();
//!
//! let mut response = Response::ok();
//! manager.persist(&session, &mut response).await.unwrap();
//! assert!(response.get_cookie("sessionid").is_some());
//! # }
//! ```
//!
//! Inside handlers, the dispatcher attaches the handle to the request; read
//! it back with [`RequestSessionExt::session`]:
//!
//! ```ignore
//! use patina_session::RequestSessionExt;
//!
//! async fn handler(req: Request) -> Response {
//!     let visits: u64 = req.session().get("visits").await.ok().flatten().unwrap_or(0);
//!     req.session().insert("visits", visits + 1).await.ok();
//!     Response::text(format!("visit #{}", visits + 1))
//! }
//! ```

mod error;
mod manager;
mod session;
mod store;

pub use error::{Result, SessionError};
pub use manager::{SessionConfig, SessionManager};
pub use session::{RequestSessionExt, Session};
pub use store::{generate_session_id, MemoryStore, SessionData, SessionStore};
