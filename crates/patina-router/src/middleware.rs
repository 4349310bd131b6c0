//! Middleware support for request/response processing.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use patina_http::{Method, Request, Response};

/// A boxed future for async middleware operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of middleware processing.
pub enum MiddlewareResult {
    /// Continue to the next middleware/handler.
    Continue(Request),
    /// Stop processing and return this response.
    Response(Response),
}

/// Trait for middleware that processes requests and responses.
///
/// Middleware can:
/// - Modify the request before it reaches the handler
/// - Short-circuit processing and return a response
/// - Modify the response after the handler runs
///
/// The chain runs `before` hooks in registration order and `after` hooks in
/// reverse. On a short-circuit, only the `after` hooks of middleware whose
/// `before` already ran are invoked, mirroring unwind semantics.
///
/// # Example
///
/// ```ignore
/// struct HeaderMiddleware;
///
/// impl Middleware for HeaderMiddleware {
///     fn before<'a>(&'a self, req: &'a Request) -> BoxFuture<'a, MiddlewareResult> {
///         Box::pin(async move { MiddlewareResult::Continue(req.clone()) })
///     }
///
///     fn after<'a>(&'a self, res: Response) -> BoxFuture<'a, Response> {
///         Box::pin(async move { res.header("X-Served-By", "patina") })
///     }
/// }
/// ```
pub trait Middleware: Send + Sync {
    /// Called before the request handler.
    ///
    /// Can modify the request or short-circuit with a response.
    fn before<'a>(&'a self, req: &'a Request) -> BoxFuture<'a, MiddlewareResult>;

    /// Called after the request handler.
    ///
    /// Can modify the response.
    fn after<'a>(&'a self, res: Response) -> BoxFuture<'a, Response>;
}

/// Cooperative abort flag for an in-flight dispatch.
///
/// The transport layer sets it when the client goes away; the chain checks
/// it between phases so entered middleware still unwinds over a
/// [`Response::client_closed`] marker instead of being dropped mid-flight.
#[derive(Clone, Debug, Default)]
pub struct AbortSignal {
    aborted: Arc<AtomicBool>,
}

impl AbortSignal {
    /// Creates a signal in the non-aborted state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the dispatch as aborted.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    /// Returns whether the dispatch was aborted.
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

/// Runs a middleware chain around a core handler.
///
/// Invocation order for chain `[A, B]` is `A.before`, `B.before`, `core`,
/// `B.after`, `A.after`. A short-circuiting `before` skips the rest of the
/// pre-phase and the core, but the `after` hooks of already-entered
/// middleware still run on the short-circuit response. An aborted signal
/// replaces the remaining work with the client-closed marker while keeping
/// the same unwind guarantee.
pub async fn run_chain<F, Fut>(
    chain: &[Arc<dyn Middleware>],
    mut request: Request,
    abort: &AbortSignal,
    core: F,
) -> Response
where
    F: FnOnce(Request) -> Fut,
    Fut: Future<Output = Response>,
{
    let mut entered = 0usize;
    let mut short_circuit: Option<Response> = None;

    for mw in chain {
        if abort.is_aborted() {
            short_circuit = Some(Response::client_closed());
            break;
        }
        entered += 1;
        match mw.before(&request).await {
            MiddlewareResult::Continue(next) => request = next,
            MiddlewareResult::Response(response) => {
                short_circuit = Some(response);
                break;
            }
        }
    }

    let mut response = match short_circuit {
        Some(response) => response,
        None if abort.is_aborted() => Response::client_closed(),
        None => core(request).await,
    };

    for mw in chain[..entered].iter().rev() {
        response = mw.after(response).await;
    }

    response
}

/// Middleware that logs requests and responses.
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn before<'a>(&'a self, req: &'a Request) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            tracing::info!(method = %req.method, path = %req.path, "request received");
            MiddlewareResult::Continue(req.clone())
        })
    }

    fn after<'a>(&'a self, res: Response) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            tracing::info!(status = res.status, "response ready");
            res
        })
    }
}

/// Middleware that adds CORS headers.
pub struct CorsMiddleware {
    /// Allowed origins.
    pub allowed_origins: Vec<String>,
    /// Allowed methods.
    pub allowed_methods: Vec<String>,
    /// Allowed headers.
    pub allowed_headers: Vec<String>,
}

impl CorsMiddleware {
    /// Creates CORS middleware that allows all origins.
    pub fn permissive() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
                "OPTIONS".to_string(),
            ],
            allowed_headers: vec!["*".to_string()],
        }
    }

    /// Creates CORS middleware with specific origins.
    pub fn new(origins: &[&str]) -> Self {
        Self {
            allowed_origins: origins.iter().map(|s| (*s).to_string()).collect(),
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
            ],
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
        }
    }
}

impl Middleware for CorsMiddleware {
    fn before<'a>(&'a self, req: &'a Request) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            // Handle preflight requests
            if req.method == Method::Options {
                let res = Response::ok()
                    .header(
                        "Access-Control-Allow-Origin",
                        self.allowed_origins.join(", "),
                    )
                    .header(
                        "Access-Control-Allow-Methods",
                        self.allowed_methods.join(", "),
                    )
                    .header(
                        "Access-Control-Allow-Headers",
                        self.allowed_headers.join(", "),
                    )
                    .header("Access-Control-Max-Age", "86400");
                return MiddlewareResult::Response(res);
            }
            MiddlewareResult::Continue(req.clone())
        })
    }

    fn after<'a>(&'a self, res: Response) -> BoxFuture<'a, Response> {
        let origins = self.allowed_origins.join(", ");
        Box::pin(async move { res.header("Access-Control-Allow-Origin", origins) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        label: &'static str,
        trace: Arc<Mutex<Vec<String>>>,
        short_circuit: bool,
    }

    impl Middleware for Recorder {
        fn before<'a>(&'a self, req: &'a Request) -> BoxFuture<'a, MiddlewareResult> {
            Box::pin(async move {
                self.trace
                    .lock()
                    .unwrap()
                    .push(format!("{}.before", self.label));
                if self.short_circuit {
                    MiddlewareResult::Response(Response::forbidden())
                } else {
                    MiddlewareResult::Continue(req.clone())
                }
            })
        }

        fn after<'a>(&'a self, res: Response) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                self.trace
                    .lock()
                    .unwrap()
                    .push(format!("{}.after", self.label));
                res
            })
        }
    }

    fn chain(
        trace: &Arc<Mutex<Vec<String>>>,
        short: Option<&'static str>,
    ) -> Vec<Arc<dyn Middleware>> {
        ["A", "B"]
            .into_iter()
            .map(|label| {
                Arc::new(Recorder {
                    label,
                    trace: trace.clone(),
                    short_circuit: short == Some(label),
                }) as Arc<dyn Middleware>
            })
            .collect()
    }

    #[tokio::test]
    async fn test_nested_order() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let mw = chain(&trace, None);
        let handler_trace = trace.clone();

        let response = run_chain(&mw, Request::get("/"), &AbortSignal::new(), |_req| async move {
            handler_trace.lock().unwrap().push("handler".to_string());
            Response::ok()
        })
        .await;

        assert_eq!(response.status, 200);
        assert_eq!(
            *trace.lock().unwrap(),
            vec!["A.before", "B.before", "handler", "B.after", "A.after"]
        );
    }

    #[tokio::test]
    async fn test_short_circuit_unwinds_entered_only() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let mw = chain(&trace, Some("A"));

        let response = run_chain(&mw, Request::get("/"), &AbortSignal::new(), |_req| async {
            panic!("handler must not run");
        })
        .await;

        assert_eq!(response.status, 403);
        assert_eq!(*trace.lock().unwrap(), vec!["A.before", "A.after"]);
    }

    #[tokio::test]
    async fn test_abort_before_handler() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let mw = chain(&trace, None);
        let abort = AbortSignal::new();
        abort.abort();

        let response = run_chain(&mw, Request::get("/"), &abort, |_req| async {
            panic!("handler must not run");
        })
        .await;

        assert_eq!(response.status, 499);
        assert!(trace.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cors_preflight_short_circuits() {
        let mw: Vec<Arc<dyn Middleware>> = vec![Arc::new(CorsMiddleware::permissive())];
        let request = Request::new(Method::Options, "/users");

        let response = run_chain(&mw, request, &AbortSignal::new(), |_req| async {
            panic!("handler must not run");
        })
        .await;

        assert_eq!(response.status, 200);
        assert_eq!(
            response.headers.get("Access-Control-Allow-Origin"),
            Some(&"*".to_string())
        );
    }
}
