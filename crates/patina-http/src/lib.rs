//! # patina-http
//!
//! HTTP request and response primitives for the patina dispatch core.
//!
//! This crate provides:
//! - [`Request`] and [`Response`] types with builder-style construction
//! - Cookie wire handling ([`SetCookie`], request-cookie parsing)
//! - Typed path parameters ([`ParamValue`], [`PathParams`])
//! - Type-keyed request attachments ([`Extensions`])
//!
//! ## Quick Start
//!
//! ```
//! use patina_http::{Method, Request, Response, SetCookie};
//!
//! let request = Request::get("/users/42?expand=posts")
//!     .header("Cookie", "sessionid=abc123");
//! assert_eq!(request.path, "/users/42");
//! assert_eq!(request.get_cookie("sessionid"), Some("abc123"));
//!
//! let response = Response::json(&serde_json::json!({"id": 42}))
//!     .set_cookie(SetCookie::new("theme", "dark"));
//! assert_eq!(response.status, 200);
//! ```
//!
//! The listener adapter sitting in front of the dispatcher builds a
//! [`Request`] per inbound connection event and renders the returned
//! [`Response`] (one `Set-Cookie` header per [`SetCookie`] entry) back onto
//! the wire.

mod cookie;
mod error;
mod extensions;
mod params;
mod request;
mod response;

pub use cookie::{parse_cookie_header, SameSite, SetCookie};
pub use error::{HttpError, Result};
pub use extensions::Extensions;
pub use params::{ParamValue, PathParams};
pub use request::{Method, Request};
pub use response::Response;
