//! # patina-router
//!
//! Typed URL routing with converter-backed captures and middleware support.
//!
//! This crate provides:
//! - A converter registry mapping capture kinds (`int`, `str`, custom) to
//!   typed segment converters
//! - Path pattern compilation with `{name}` / `{kind:name}` captures
//! - A method-partitioned, registration-ordered route table
//! - Middleware with before/after hooks and nested-chain execution
//!
//! ## Quick Start
//!
//! ```
//! use patina_http::{Method, Request, Response};
//! use patina_router::RouteTable;
//!
//! let mut table = RouteTable::new();
//! table
//!     .register(Method::Get, "/data/{int:id}", |req: Request| async move {
//!         let id = req.params.get_int("id").unwrap_or_default();
//!         Response::json(&serde_json::json!({ "id": id }))
//!     })
//!     .unwrap();
//!
//! let matched = table.resolve(Method::Get, "/data/42").unwrap();
//! assert_eq!(matched.params.get_int("id"), Some(42));
//!
//! // A failed conversion is a non-match, not an error.
//! assert!(table.resolve(Method::Get, "/data/abc").is_err());
//! ```
//!
//! ## Typed Captures
//!
//! Captures name a converter kind registered in the [`ConverterRegistry`];
//! `{id}` is shorthand for `{str:id}`. Kinds are validated when the route is
//! registered, so an unregistered kind aborts startup instead of surfacing
//! as a request-time surprise. Conversion failures at match time mark the
//! candidate as a non-match and the scan continues, which lets
//! `/data/{int:id}` and `/data/{name}` coexist.
//!
//! ## Middleware
//!
//! ```ignore
//! use patina_router::{run_chain, AbortSignal, LoggingMiddleware, Middleware};
//!
//! let chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(LoggingMiddleware)];
//! let response = run_chain(&chain, request, &AbortSignal::new(), handler).await;
//! ```
//!
//! `before` hooks run in registration order, `after` hooks in reverse. A
//! short-circuiting `before` skips the rest, but already-entered `after`
//! hooks still run on the short-circuit response.

mod convert;
mod error;
mod middleware;
mod pattern;
mod table;

pub use convert::{ConversionError, Converter, ConverterRegistry, IntConverter, StrConverter};
pub use error::{Result, RouterError};
pub use middleware::{
    run_chain, AbortSignal, BoxFuture, CorsMiddleware, LoggingMiddleware, Middleware,
    MiddlewareResult,
};
pub use pattern::{MatchOutcome, PathPattern, Segment};
pub use table::{Handler, NearMiss, NotFound, Route, RouteMatch, RouteMethod, RouteTable};
