//! Users CRUD demo.
//!
//! Wires the dispatch core to a real listener: a "users" resource over an
//! in-memory store, a visit-counting session middleware, and a hyper/tokio
//! front end feeding parsed requests into [`App::dispatch`].
//!
//! Run with: cargo run -p patina-app --example users_demo
//! Then try:
//!   curl -i http://localhost:3000/users
//!   curl -i http://localhost:3000/users/1
//!   curl -i -X POST http://localhost:3000/users \
//!        -d '{"name":"carol","email":"carol@example.com"}'
//!   curl -i -c jar.txt -b jar.txt http://localhost:3000/

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request as HyperRequest, Response as HyperResponse, StatusCode};
use hyper_util::rt::TokioIo;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use patina_app::App;
use patina_http::{Method, ParamValue, Request, Response};
use patina_resource::{
    ActionSet, Controller, ControllerError, ControllerResult, Reply, Resource,
};
use patina_router::{BoxFuture, LoggingMiddleware, Middleware, MiddlewareResult};
use patina_session::RequestSessionExt;

/// Demo HTTP service built on the patina dispatch core.
#[derive(Parser)]
#[command(name = "users_demo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Working directory to run in.
    #[arg(short, long)]
    workdir: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

// ============================================================================
// Users resource
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct User {
    id: i64,
    name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct UserInput {
    name: String,
    email: String,
}

/// The storage backend stays behind the controller interface; here it is a
/// plain in-memory map.
struct UserController {
    store: Arc<RwLock<HashMap<i64, User>>>,
}

impl UserController {
    fn with_sample_data() -> Self {
        let users = [
            User {
                id: 1,
                name: "alice".to_string(),
                email: "alice@example.com".to_string(),
            },
            User {
                id: 2,
                name: "bob".to_string(),
                email: "bob@example.com".to_string(),
            },
        ];
        Self {
            store: Arc::new(RwLock::new(
                users.into_iter().map(|u| (u.id, u)).collect(),
            )),
        }
    }

    fn member_id(id: &ParamValue) -> Result<i64, ControllerError> {
        id.as_int()
            .ok_or_else(|| ControllerError::bad_request("user ids are integers"))
    }
}

impl Controller for UserController {
    fn capabilities(&self) -> ActionSet {
        ActionSet::all()
    }

    fn index<'a>(&'a self, _req: &'a Request) -> BoxFuture<'a, ControllerResult> {
        Box::pin(async move {
            let store = self.store.read().await;
            let mut users: Vec<&User> = store.values().collect();
            users.sort_by_key(|u| u.id);
            Reply::json(&users)
        })
    }

    fn show<'a>(
        &'a self,
        _req: &'a Request,
        id: &'a ParamValue,
    ) -> BoxFuture<'a, ControllerResult> {
        Box::pin(async move {
            let id = Self::member_id(id)?;
            let store = self.store.read().await;
            match store.get(&id) {
                Some(user) => Reply::json(user),
                None => Err(ControllerError::not_found(format!("no user {id}"))),
            }
        })
    }

    fn create<'a>(&'a self, req: &'a Request) -> BoxFuture<'a, ControllerResult> {
        Box::pin(async move {
            let input: UserInput = req
                .json()
                .map_err(|err| ControllerError::bad_request(err.to_string()))?;
            let mut store = self.store.write().await;
            let id = store.keys().max().copied().unwrap_or(0) + 1;
            let user = User {
                id,
                name: input.name,
                email: input.email,
            };
            store.insert(id, user.clone());
            Ok(Reply::Response(Response::created(&user)))
        })
    }

    fn update<'a>(
        &'a self,
        req: &'a Request,
        id: &'a ParamValue,
    ) -> BoxFuture<'a, ControllerResult> {
        Box::pin(async move {
            let id = Self::member_id(id)?;
            let input: UserInput = req
                .json()
                .map_err(|err| ControllerError::bad_request(err.to_string()))?;
            let mut store = self.store.write().await;
            match store.get_mut(&id) {
                Some(user) => {
                    user.name = input.name;
                    user.email = input.email;
                    Reply::json(user)
                }
                None => Err(ControllerError::not_found(format!("no user {id}"))),
            }
        })
    }

    fn delete<'a>(
        &'a self,
        _req: &'a Request,
        id: &'a ParamValue,
    ) -> BoxFuture<'a, ControllerResult> {
        Box::pin(async move {
            let id = Self::member_id(id)?;
            let mut store = self.store.write().await;
            match store.remove(&id) {
                Some(_) => Ok(Reply::Response(Response::no_content())),
                None => Err(ControllerError::not_found(format!("no user {id}"))),
            }
        })
    }
}

// ============================================================================
// Session middleware
// ============================================================================

/// Counts visits per client in its session.
struct VisitCounter;

impl Middleware for VisitCounter {
    fn before<'a>(&'a self, req: &'a Request) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            let session = req.session();
            let visits: u64 = session.get("visits").await.ok().flatten().unwrap_or(0);
            if session.insert("visits", visits + 1).await.is_err() {
                tracing::warn!("visit counter could not update the session");
            }
            MiddlewareResult::Continue(req.clone())
        })
    }

    fn after<'a>(&'a self, res: Response) -> BoxFuture<'a, Response> {
        Box::pin(async move { res })
    }
}

fn build_app() -> patina_app::Result<App> {
    App::builder()
        .middleware(LoggingMiddleware)
        .middleware(VisitCounter)
        .get("/", |req: Request| async move {
            let visits: u64 = req.session().get("visits").await.ok().flatten().unwrap_or(0);
            Response::json(&serde_json::json!({
                "service": "users_demo",
                "visits": visits,
            }))
        })
        .resource(Resource::new("users", UserController::with_sample_data()).id_kind("int"))
        .build()
}

// ============================================================================
// Listener adapter
// ============================================================================

async fn handle_request(
    req: HyperRequest<hyper::body::Incoming>,
    app: App,
) -> Result<HyperResponse<Full<Bytes>>, Infallible> {
    use http_body_util::BodyExt;

    // Convert the hyper request into a patina Request
    let method = Method::from_str(req.method().as_str()).unwrap_or(Method::Get);
    let uri = req.uri();
    let mut request = Request::new(method, uri.path());

    if let Some(query) = uri.query() {
        request.query = Request::parse_query_string(query);
    }

    // Copy headers; the Cookie header is parsed into the cookie map.
    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .filter_map(|(key, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (key.to_string(), v.to_string()))
        })
        .collect();
    for (key, value) in headers {
        request = request.header(key, value);
    }

    let body_bytes = req
        .collect()
        .await
        .map(|b| b.to_bytes())
        .unwrap_or_default();
    request.body = body_bytes.to_vec();

    let response = app.dispatch(request).await;

    // Convert the patina Response back onto the wire
    let mut builder = HyperResponse::builder().status(
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    );

    for (key, value) in &response.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    for cookie in &response.cookies {
        builder = builder.header("Set-Cookie", cookie.to_header_value());
    }

    let response = builder
        .body(Full::new(Bytes::from(response.body)))
        .unwrap_or_else(|_| {
            HyperResponse::new(Full::new(Bytes::from_static(b"Internal Server Error")))
        });

    Ok(response)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(workdir) = &cli.workdir {
        std::env::set_current_dir(workdir)?;
    }

    let app = build_app()?;
    for report in app.bind_reports() {
        if !report.is_complete() {
            tracing::warn!(
                resource = %report.resource,
                missing = ?report.missing,
                "resource bound with missing actions"
            );
        }
    }

    let addr: SocketAddr = ([127, 0, 0, 1], cli.port).into();
    let listener = TcpListener::bind(addr).await?;
    info!("users_demo running at http://{}", addr);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let app = app.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| {
                let app = app.clone();
                handle_request(req, app)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::warn!("error serving connection: {err:?}");
            }
        });
    }
}
