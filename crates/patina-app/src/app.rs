//! Application assembly.
//!
//! An [`AppBuilder`] runs the single-threaded registration phase; the
//! [`App`] it builds is immutable, cheap to clone, and dispatches requests
//! concurrently without further locking.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use patina_http::{Method, Request, Response};
use patina_resource::{BindReport, Resource};
use patina_router::{
    AbortSignal, Converter, Handler, Middleware, Route, RouteMethod, RouteTable,
};
use patina_session::SessionManager;

use crate::dispatch;
use crate::error::{AppError, Result};
use crate::render::Renderer;

/// A group of routes sharing a path prefix and scoped middleware.
///
/// Middleware added to a scope applies exactly to the routes registered
/// through it, resolved when the scope is folded into the builder, never
/// per request.
pub struct Scope {
    prefix: String,
    middleware: Vec<Arc<dyn Middleware>>,
    routes: Vec<(RouteMethod, String, Handler)>,
}

impl Scope {
    /// Creates a scope with the given path prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            middleware: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Adds middleware scoped to this group's routes.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Adds a route with any method filter.
    #[must_use]
    pub fn route<F, Fut>(
        mut self,
        method: impl Into<RouteMethod>,
        path: &str,
        handler: F,
    ) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |req| Box::pin(handler(req)));
        self.routes
            .push((method.into(), format!("{}{}", self.prefix, path), handler));
        self
    }

    /// Adds a GET route.
    #[must_use]
    pub fn get<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Get, path, handler)
    }

    /// Adds a POST route.
    #[must_use]
    pub fn post<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Post, path, handler)
    }

    /// Adds a PUT route.
    #[must_use]
    pub fn put<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Put, path, handler)
    }

    /// Adds a PATCH route.
    #[must_use]
    pub fn patch<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Patch, path, handler)
    }

    /// Adds a DELETE route.
    #[must_use]
    pub fn delete<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Delete, path, handler)
    }
}

/// Builder for the registration phase.
///
/// Registration failures are remembered and surfaced by [`AppBuilder::build`],
/// keeping the chain ergonomic while still making startup the single fatal
/// boundary.
pub struct AppBuilder {
    table: RouteTable,
    middleware: Vec<Arc<dyn Middleware>>,
    sessions: SessionManager,
    renderer: Option<Arc<dyn Renderer>>,
    reports: Vec<BindReport>,
    pending_error: Option<AppError>,
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AppBuilder {
    /// Creates a builder with an in-memory session store and the built-in
    /// converters.
    pub fn new() -> Self {
        Self {
            table: RouteTable::new(),
            middleware: Vec::new(),
            sessions: SessionManager::new(Arc::new(patina_session::MemoryStore::new())),
            renderer: None,
            reports: Vec::new(),
            pending_error: None,
        }
    }

    fn record_error(&mut self, error: impl Into<AppError>) {
        if self.pending_error.is_none() {
            self.pending_error = Some(error.into());
        }
    }

    /// Registers a converter for a new capture kind.
    #[must_use]
    pub fn converter(
        mut self,
        kind: impl Into<String>,
        converter: impl Converter + 'static,
    ) -> Self {
        if let Err(err) = self.table.register_converter(kind, converter) {
            self.record_error(err);
        }
        self
    }

    /// Adds a route.
    #[must_use]
    pub fn route<F, Fut>(
        mut self,
        method: impl Into<RouteMethod>,
        pattern: &str,
        handler: F,
    ) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        if let Err(err) = self.table.register(method, pattern, handler) {
            self.record_error(err);
        }
        self
    }

    /// Adds a GET route.
    #[must_use]
    pub fn get<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Get, pattern, handler)
    }

    /// Adds a POST route.
    #[must_use]
    pub fn post<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Post, pattern, handler)
    }

    /// Adds a PUT route.
    #[must_use]
    pub fn put<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Put, pattern, handler)
    }

    /// Adds a PATCH route.
    #[must_use]
    pub fn patch<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Patch, pattern, handler)
    }

    /// Adds a DELETE route.
    #[must_use]
    pub fn delete<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Delete, pattern, handler)
    }

    /// Adds a route matching every method, scanned after exact-method
    /// routes.
    #[must_use]
    pub fn any<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(RouteMethod::Any, pattern, handler)
    }

    /// Adds a named route usable with [`App::url_for`].
    #[must_use]
    pub fn named_route<F, Fut>(
        mut self,
        name: &str,
        method: impl Into<RouteMethod>,
        pattern: &str,
        handler: F,
    ) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        match self.table.compile(pattern) {
            Ok(compiled) => {
                self.table
                    .insert(Route::new(method, compiled, handler).name(name));
            }
            Err(err) => self.record_error(err),
        }
        self
    }

    /// Adds global middleware, applied to every dispatch.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Folds a scope's routes into the table with their scoped middleware.
    #[must_use]
    pub fn scope(mut self, scope: Scope) -> Self {
        for (method, pattern, handler) in scope.routes {
            match self.table.compile(&pattern) {
                Ok(compiled) => {
                    let route = Route::from_handler(method, compiled, handler)
                        .middleware(scope.middleware.clone());
                    self.table.insert(route);
                }
                Err(err) => self.record_error(err),
            }
        }
        self
    }

    /// Binds a resource's CRUD routes.
    ///
    /// Missing controller capabilities are reported in the bind report
    /// (available on the built [`App`]), not treated as fatal.
    #[must_use]
    pub fn resource(mut self, resource: Resource) -> Self {
        match resource.bind(&mut self.table) {
            Ok(report) => self.reports.push(report),
            Err(err) => self.record_error(err),
        }
        self
    }

    /// Replaces the session manager.
    #[must_use]
    pub fn sessions(mut self, sessions: SessionManager) -> Self {
        self.sessions = sessions;
        self
    }

    /// Sets the view-rendering collaborator.
    #[must_use]
    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Finishes the registration phase.
    ///
    /// Returns the first registration error, if any occurred; the
    /// application must not start serving in that case.
    pub fn build(self) -> Result<App> {
        if let Some(error) = self.pending_error {
            return Err(error);
        }
        Ok(App {
            inner: Arc::new(AppInner {
                table: self.table,
                middleware: self.middleware,
                sessions: self.sessions,
                renderer: self.renderer,
                reports: self.reports,
            }),
        })
    }
}

pub(crate) struct AppInner {
    pub(crate) table: RouteTable,
    pub(crate) middleware: Vec<Arc<dyn Middleware>>,
    pub(crate) sessions: SessionManager,
    pub(crate) renderer: Option<Arc<dyn Renderer>>,
    pub(crate) reports: Vec<BindReport>,
}

/// The built application: one inbound request in, one response out.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

impl App {
    /// Starts the registration phase.
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// Dispatches one request to a response.
    pub async fn dispatch(&self, request: Request) -> Response {
        self.dispatch_with_abort(request, AbortSignal::new()).await
    }

    /// Dispatches one request, honouring a transport abort signal.
    ///
    /// When the signal fires mid-dispatch, already-entered middleware still
    /// unwinds and session persistence still runs; the returned response is
    /// the client-closed marker and should be discarded by the caller.
    pub async fn dispatch_with_abort(&self, request: Request, abort: AbortSignal) -> Response {
        dispatch::dispatch(&self.inner, request, abort).await
    }

    /// Generates a URL for a named route.
    pub fn url_for(&self, name: &str, params: &HashMap<String, String>) -> Option<String> {
        self.inner.table.url_for(name, params)
    }

    /// Returns the bind reports collected while resources were registered.
    pub fn bind_reports(&self) -> &[BindReport] {
        &self.inner.reports
    }

    /// Returns the session manager.
    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }

    /// Returns the configured renderer, if any.
    pub fn renderer(&self) -> Option<Arc<dyn Renderer>> {
        self.inner.renderer.clone()
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("table", &self.inner.table)
            .field("middleware", &self.inner.middleware.len())
            .field("resources", &self.inner.reports.len())
            .finish()
    }
}
