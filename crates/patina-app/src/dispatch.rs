//! The dispatch pipeline.
//!
//! One inbound request flows: session attach, global middleware pre-phase,
//! route lookup, scoped middleware pre-phase, handler, post-phases in
//! reverse, session persistence. Handler and middleware failures stop here;
//! nothing on the per-request path may take the process down.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use patina_http::{Request, Response};
use patina_router::{run_chain, AbortSignal, Route};

use crate::app::AppInner;
use crate::render::Renderer;

pub(crate) async fn dispatch(inner: &AppInner, request: Request, abort: AbortSignal) -> Response {
    let method = request.method;
    let path = request.path.clone();

    // Final process-protection boundary: a panicking middleware cannot be
    // unwound through its own chain, so it surfaces as a bare 500 here.
    let result = AssertUnwindSafe(dispatch_inner(inner, request, &abort))
        .catch_unwind()
        .await;

    let response = match result {
        Ok(response) => response,
        Err(_) => {
            tracing::error!(%method, %path, "dispatch panicked; converted to 500");
            Response::internal_server_error()
        }
    };

    tracing::debug!(%method, %path, status = response.status, "dispatch complete");
    response
}

async fn dispatch_inner(inner: &AppInner, mut request: Request, abort: &AbortSignal) -> Response {
    // The session handle is resolved lazily: attaching it costs no store
    // access until a handler or middleware first touches it.
    let session = inner.sessions.resolve(&request);
    request.extensions.insert(session.clone());
    if let Some(renderer) = &inner.renderer {
        let renderer: Arc<dyn Renderer> = renderer.clone();
        request.extensions.insert(renderer);
    }

    let mut response = run_chain(&inner.middleware, request, abort, |req| {
        route_and_handle(inner, req, abort)
    })
    .await;

    if let Err(err) = inner.sessions.persist(&session, &mut response).await {
        tracing::warn!(error = %err, "session persistence failed; response flows without it");
    }

    response
}

async fn route_and_handle(inner: &AppInner, request: Request, abort: &AbortSignal) -> Response {
    match inner.table.resolve(request.method, &request.path) {
        Ok(matched) => {
            let mut request = request;
            request.params = matched.params;
            let route = matched.route;
            let handler_route = route.clone();
            run_chain(&route.middleware, request, abort, move |req| {
                invoke_handler(handler_route, req)
            })
            .await
        }
        Err(not_found) => {
            for miss in &not_found.near_misses {
                tracing::debug!(
                    pattern = %miss.pattern,
                    capture = %miss.name,
                    value = %miss.value,
                    reason = %miss.reason,
                    "route candidate skipped: capture failed to convert"
                );
            }
            tracing::debug!(method = %not_found.method, path = %not_found.path, "no route matched");
            Response::not_found()
        }
    }
}

/// Runs one handler with panic containment.
///
/// A panicking handler becomes a 500 response, and because the containment
/// sits inside the chains, every entered middleware still observes it.
async fn invoke_handler(route: Arc<Route>, request: Request) -> Response {
    let future = (route.handler)(request);
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(response) => response,
        Err(_) => {
            tracing::error!(
                pattern = route.pattern.pattern(),
                "handler panicked; converted to 500"
            );
            Response::internal_server_error()
        }
    }
}
