//! # patina-resource
//!
//! Resource controllers and conventional CRUD route binding.
//!
//! A [`Resource`] pairs a name with a [`Controller`] and expands into the
//! five conventional routes at registration time:
//!
//! ```text
//! GET    /users          -> index
//! GET    /users/{id}     -> show
//! POST   /users          -> create
//! PUT    /users/{id}     -> update
//! PATCH  /users/{id}     -> update
//! DELETE /users/{id}     -> delete
//! ```
//!
//! Controllers declare their implemented actions up front; the binder
//! registers what exists and reports what is missing in a [`BindReport`],
//! so a forgotten `delete` shows up at startup instead of as a request-time
//! 404.
//!
//! ## Quick Start
//!
//! ```
//! use patina_http::Request;
//! use patina_resource::{
//!     Action, ActionSet, Controller, ControllerResult, Reply, Resource,
//! };
//! use patina_router::{BoxFuture, RouteTable};
//!
//! struct Users;
//!
//! impl Controller for Users {
//!     fn capabilities(&self) -> ActionSet {
//!         ActionSet::none().with(Action::Index)
//!     }
//!
//!     fn index<'a>(&'a self, _req: &'a Request) -> BoxFuture<'a, ControllerResult> {
//!         Box::pin(async { Reply::json(&serde_json::json!(["alice", "bob"])) })
//!     }
//! }
//!
//! let mut table = RouteTable::new();
//! let report = Resource::new("users", Users).bind(&mut table).unwrap();
//! assert_eq!(report.registered.len(), 1);
//! assert_eq!(report.missing.len(), 4);
//! ```
//!
//! Handlers adapt controller returns for the wire: JSON replies are
//! encoded, [`Response`](patina_http::Response) replies pass through, and a
//! [`ControllerError`] maps to its status class.

mod binder;
mod controller;
mod error;

pub use binder::{BindReport, Binding, Resource};
pub use controller::{
    Action, ActionSet, Controller, ControllerError, ControllerResult, Reply,
};
pub use error::{ResourceError, Result};
