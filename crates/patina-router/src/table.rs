//! Route storage and resolution.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use patina_http::{Method, PathParams, Request, Response};

use crate::convert::{Converter, ConverterRegistry};
use crate::error::{Result, RouterError};
use crate::middleware::{BoxFuture, Middleware};
use crate::pattern::{MatchOutcome, PathPattern};

/// A boxed async handler function.
pub type Handler = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// The method filter of a registered route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMethod {
    /// Matches a single HTTP method.
    Only(Method),
    /// Matches every HTTP method; scanned after exact-method routes.
    Any,
}

impl RouteMethod {
    /// Returns whether the filter accepts the given method.
    pub fn accepts(&self, method: Method) -> bool {
        match self {
            Self::Only(m) => *m == method,
            Self::Any => true,
        }
    }
}

impl From<Method> for RouteMethod {
    fn from(method: Method) -> Self {
        Self::Only(method)
    }
}

impl std::fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Only(m) => write!(f, "{m}"),
            Self::Any => write!(f, "ANY"),
        }
    }
}

/// A single route definition.
#[derive(Clone)]
pub struct Route {
    /// Optional route name for reverse URL lookup.
    pub name: Option<String>,
    /// Method filter.
    pub method: RouteMethod,
    /// Compiled path pattern.
    pub pattern: PathPattern,
    /// Request handler.
    pub handler: Handler,
    /// Middleware scoped to this route, snapshotted at registration.
    pub middleware: Vec<Arc<dyn Middleware>>,
}

impl Route {
    /// Creates a new route from an async handler function.
    pub fn new<F, Fut>(method: impl Into<RouteMethod>, pattern: PathPattern, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self::from_handler(
            method,
            pattern,
            Arc::new(move |req| Box::pin(handler(req)) as BoxFuture<'static, Response>),
        )
    }

    /// Creates a new route from an already-boxed handler.
    pub fn from_handler(
        method: impl Into<RouteMethod>,
        pattern: PathPattern,
        handler: Handler,
    ) -> Self {
        Self {
            name: None,
            method: method.into(),
            pattern,
            handler,
            middleware: Vec::new(),
        }
    }

    /// Sets the route name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches scoped middleware to this route.
    #[must_use]
    pub fn middleware(mut self, middleware: Vec<Arc<dyn Middleware>>) -> Self {
        self.middleware = middleware;
        self
    }
}

/// A resolved route with its bound parameters.
#[derive(Clone)]
pub struct RouteMatch {
    /// The matched route.
    pub route: Arc<Route>,
    /// Parameters bound by the pattern's converters.
    pub params: PathParams,
}

/// A candidate route that failed only because a capture did not convert.
#[derive(Debug, Clone)]
pub struct NearMiss {
    /// Pattern of the candidate route.
    pub pattern: String,
    /// Capture name that failed to convert.
    pub name: String,
    /// Raw segment value.
    pub value: String,
    /// Converter failure reason.
    pub reason: String,
}

/// The failure value of [`RouteTable::resolve`].
///
/// Carries conversion near-misses for diagnostics; control flow treats every
/// `NotFound` the same (a 404-class response).
#[derive(Debug, Clone)]
pub struct NotFound {
    /// Requested method.
    pub method: Method,
    /// Requested path.
    pub path: String,
    /// Candidates that matched structurally but failed conversion.
    pub near_misses: Vec<NearMiss>,
}

impl From<NotFound> for RouterError {
    fn from(not_found: NotFound) -> Self {
        Self::NotFound {
            method: not_found.method.to_string(),
            path: not_found.path,
        }
    }
}

/// The route table: method-partitioned, registration-ordered route storage.
///
/// Built during the single-threaded registration phase; immutable and freely
/// shareable afterwards. Resolution scans exact-method routes in
/// registration order, then ANY routes, and the first candidate whose
/// literals align and whose captures all convert wins.
pub struct RouteTable {
    registry: ConverterRegistry,
    by_method: HashMap<Method, Vec<Arc<Route>>>,
    any: Vec<Arc<Route>>,
    named: HashMap<String, PathPattern>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    /// Creates an empty table with the built-in converters.
    pub fn new() -> Self {
        Self::with_registry(ConverterRegistry::new())
    }

    /// Creates an empty table with a prepared converter registry.
    pub fn with_registry(registry: ConverterRegistry) -> Self {
        Self {
            registry,
            by_method: HashMap::new(),
            any: Vec::new(),
            named: HashMap::new(),
        }
    }

    /// Returns the converter registry.
    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    /// Registers a converter for a new capture kind.
    pub fn register_converter(
        &mut self,
        kind: impl Into<String>,
        converter: impl Converter + 'static,
    ) -> Result<()> {
        self.registry.register(kind, converter)
    }

    /// Compiles a pattern against this table's registry.
    pub fn compile(&self, pattern: &str) -> Result<PathPattern> {
        PathPattern::parse(pattern, &self.registry)
    }

    /// Registers a route from an async handler function.
    pub fn register<F, Fut>(
        &mut self,
        method: impl Into<RouteMethod>,
        pattern: &str,
        handler: F,
    ) -> Result<()>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let pattern = self.compile(pattern)?;
        self.insert(Route::new(method, pattern, handler));
        Ok(())
    }

    /// Inserts a pre-built route.
    ///
    /// A route with the same method filter and pattern string replaces the
    /// earlier one in place, keeping its position in the scan order: the
    /// last registration wins, deterministically.
    pub fn insert(&mut self, route: Route) {
        if let Some(name) = &route.name {
            self.named.insert(name.clone(), route.pattern.clone());
        }

        let route = Arc::new(route);
        let list = match route.method {
            RouteMethod::Only(method) => self.by_method.entry(method).or_default(),
            RouteMethod::Any => &mut self.any,
        };

        let existing = list
            .iter()
            .position(|r| r.pattern.pattern() == route.pattern.pattern());
        match existing {
            Some(index) => list[index] = route,
            None => list.push(route),
        }
    }

    /// Resolves an incoming method and path to a route and bound parameters.
    pub fn resolve(&self, method: Method, path: &str) -> std::result::Result<RouteMatch, NotFound> {
        let mut near_misses = Vec::new();

        let exact = self.by_method.get(&method).map(Vec::as_slice).unwrap_or(&[]);
        for route in exact.iter().chain(&self.any) {
            match route.pattern.match_outcome(path) {
                MatchOutcome::Matched(params) => {
                    return Ok(RouteMatch {
                        route: route.clone(),
                        params,
                    })
                }
                MatchOutcome::ConversionFailed { name, value, reason } => {
                    near_misses.push(NearMiss {
                        pattern: route.pattern.pattern().to_string(),
                        name,
                        value,
                        reason,
                    });
                }
                MatchOutcome::NotMatched => {}
            }
        }

        Err(NotFound {
            method,
            path: path.to_string(),
            near_misses,
        })
    }

    /// Generates a URL for a named route.
    pub fn url_for(&self, name: &str, params: &HashMap<String, String>) -> Option<String> {
        self.named.get(name).and_then(|p| p.reverse(params))
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        self.by_method.values().map(Vec::len).sum::<usize>() + self.any.len()
    }

    /// Returns whether the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.len())
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ok_handler(_req: Request) -> Response {
        Response::text("ok")
    }

    fn table() -> RouteTable {
        RouteTable::new()
    }

    #[test]
    fn test_register_validates_pattern() {
        let mut table = table();
        assert!(table.register(Method::Get, "/users/{int:id}", ok_handler).is_ok());
        assert!(matches!(
            table.register(Method::Get, "/files/{uuid:id}", ok_handler),
            Err(RouterError::UnknownConverter { .. })
        ));
        assert!(matches!(
            table.register(Method::Get, "", ok_handler),
            Err(RouterError::EmptyPattern)
        ));
    }

    #[test]
    fn test_resolve_binds_typed_params() {
        let mut table = table();
        table.register(Method::Get, "/data/{int:id}", ok_handler).unwrap();

        let matched = table.resolve(Method::Get, "/data/42").unwrap();
        assert_eq!(matched.params.get_int("id"), Some(42));
    }

    #[test]
    fn test_conversion_failure_continues_scan() {
        let mut table = table();
        table.register(Method::Get, "/data/{int:id}", ok_handler).unwrap();
        table.register(Method::Get, "/data/{name}", ok_handler).unwrap();

        // "abc" fails the int route but matches the str route behind it.
        let matched = table.resolve(Method::Get, "/data/abc").unwrap();
        assert_eq!(matched.route.pattern.pattern(), "/data/{name}");
        assert_eq!(matched.params.get_str("name"), Some("abc"));
    }

    #[test]
    fn test_not_found_reports_near_misses() {
        let mut table = table();
        table.register(Method::Get, "/data/{int:id}", ok_handler).unwrap();

        let not_found = table.resolve(Method::Get, "/data/abc").unwrap_err();
        assert_eq!(not_found.near_misses.len(), 1);
        assert_eq!(not_found.near_misses[0].name, "id");
        assert_eq!(not_found.near_misses[0].value, "abc");

        // A structurally different path is a plain miss.
        let not_found = table.resolve(Method::Get, "/other").unwrap_err();
        assert!(not_found.near_misses.is_empty());
    }

    #[test]
    fn test_first_registered_wins() {
        let mut table = table();
        table
            .register(Method::Get, "/users/{id}", |_req| async {
                Response::text("capture")
            })
            .unwrap();
        table
            .register(Method::Get, "/users/me", |_req| async {
                Response::text("literal")
            })
            .unwrap();

        // Both patterns accept "/users/me"; registration order decides.
        let matched = table.resolve(Method::Get, "/users/me").unwrap();
        assert_eq!(matched.route.pattern.pattern(), "/users/{id}");
    }

    #[test]
    fn test_method_partition_and_any_fallback() {
        let mut table = table();
        table
            .register(Method::Get, "/ping", |_req| async { Response::text("get") })
            .unwrap();
        table
            .register(RouteMethod::Any, "/ping", |_req| async {
                Response::text("any")
            })
            .unwrap();

        let get = table.resolve(Method::Get, "/ping").unwrap();
        assert_eq!(get.route.method, RouteMethod::Only(Method::Get));

        let post = table.resolve(Method::Post, "/ping").unwrap();
        assert_eq!(post.route.method, RouteMethod::Any);

        assert!(table.resolve(Method::Post, "/pong").is_err());
    }

    #[test]
    fn test_duplicate_registration_replaces_in_place() {
        let mut table = table();
        table
            .register(Method::Get, "/users", |_req| async { Response::text("old") })
            .unwrap();
        table
            .register(Method::Get, "/users/{id}", ok_handler)
            .unwrap();
        table
            .register(Method::Get, "/users", |_req| async { Response::text("new") })
            .unwrap();

        assert_eq!(table.len(), 2);
        let matched = table.resolve(Method::Get, "/users").unwrap();
        let response = futures::executor::block_on((matched.route.handler)(
            Request::get("/users"),
        ));
        assert_eq!(response.body_string(), Some("new".to_string()));
    }

    #[test]
    fn test_url_for_named_route() {
        let mut table = table();
        let pattern = table.compile("/users/{int:id}").unwrap();
        table.insert(Route::new(Method::Get, pattern, ok_handler).name("user_detail"));

        let params: HashMap<String, String> =
            [("id".to_string(), "42".to_string())].into_iter().collect();
        assert_eq!(
            table.url_for("user_detail", &params),
            Some("/users/42".to_string())
        );
        assert_eq!(table.url_for("missing", &params), None);
    }
}
