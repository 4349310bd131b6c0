//! Resource-to-route expansion.

use std::sync::Arc;

use patina_http::{Method, Request, Response};
use patina_router::{ConverterRegistry, Handler, Middleware, Route, RouteTable};

use crate::controller::{Action, Controller, ControllerResult, Reply};
use crate::error::{ResourceError, Result};

/// A named resource wired to a controller.
///
/// Binding expands it into the conventional CRUD route set:
///
/// | Action | Route                          |
/// |--------|--------------------------------|
/// | index  | `GET /name`                    |
/// | show   | `GET /name/{kind:id}`          |
/// | create | `POST /name`                   |
/// | update | `PUT` and `PATCH /name/{kind:id}` |
/// | delete | `DELETE /name/{kind:id}`       |
///
/// The id capture kind defaults to `str`.
pub struct Resource {
    name: String,
    id_kind: String,
    controller: Arc<dyn Controller>,
}

/// One route produced by a binding.
#[derive(Debug, Clone)]
pub struct Binding {
    /// Controller action the route delegates to.
    pub action: Action,
    /// HTTP method of the route.
    pub method: Method,
    /// Registered pattern string.
    pub pattern: String,
}

/// The outcome of binding one resource.
///
/// Missing controller capabilities are recorded here at bind time rather
/// than discovered as 404s at request time.
#[derive(Debug, Clone)]
pub struct BindReport {
    /// Resource name.
    pub resource: String,
    /// Routes that were registered.
    pub registered: Vec<Binding>,
    /// Actions the controller does not implement.
    pub missing: Vec<Action>,
}

impl BindReport {
    /// Returns whether the controller covered every action.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

impl Resource {
    /// Creates a resource over a controller.
    pub fn new(name: impl Into<String>, controller: impl Controller + 'static) -> Self {
        Self {
            name: name.into(),
            id_kind: ConverterRegistry::STR.to_string(),
            controller: Arc::new(controller),
        }
    }

    /// Overrides the converter kind of the `{id}` capture.
    #[must_use]
    pub fn id_kind(mut self, kind: impl Into<String>) -> Self {
        self.id_kind = kind.into();
        self
    }

    /// Returns the resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binds the resource's routes into a table.
    ///
    /// Actions missing from the controller's capability set are skipped and
    /// reported (and logged), so the gap is visible at startup; the
    /// remaining routes are still registered.
    pub fn bind(&self, table: &mut RouteTable) -> Result<BindReport> {
        self.bind_scoped(table, Vec::new())
    }

    /// Binds like [`Resource::bind`], attaching scoped middleware to every
    /// generated route.
    pub fn bind_scoped(
        &self,
        table: &mut RouteTable,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<BindReport> {
        let collection = format!("/{}", self.name);
        let member = format!("/{}/{{{}:id}}", self.name, self.id_kind);
        let capabilities = self.controller.capabilities();

        let mut report = BindReport {
            resource: self.name.clone(),
            registered: Vec::new(),
            missing: Vec::new(),
        };

        for action in Action::ALL {
            if !capabilities.contains(action) {
                tracing::warn!(
                    resource = %self.name,
                    action = %action,
                    "controller does not implement action; route not registered"
                );
                report.missing.push(action);
                continue;
            }

            let (methods, pattern): (&[Method], &str) = match action {
                Action::Index => (&[Method::Get], &collection),
                Action::Show => (&[Method::Get], &member),
                Action::Create => (&[Method::Post], &collection),
                Action::Update => (&[Method::Put, Method::Patch], &member),
                Action::Delete => (&[Method::Delete], &member),
            };

            for method in methods {
                let compiled = table.compile(pattern)?;
                let route = Route::from_handler(*method, compiled, self.handler(action))
                    .middleware(middleware.clone());
                table.insert(route);
                report.registered.push(Binding {
                    action,
                    method: *method,
                    pattern: pattern.to_string(),
                });
            }
        }

        Ok(report)
    }

    /// Binds the resource, failing when the controller is incomplete.
    pub fn bind_strict(&self, table: &mut RouteTable) -> Result<BindReport> {
        let report = self.bind(table)?;
        if report.is_complete() {
            Ok(report)
        } else {
            Err(ResourceError::MissingCapabilities {
                resource: self.name.clone(),
                actions: report.missing,
            })
        }
    }

    /// Builds the handler adapting one controller action to a route.
    fn handler(&self, action: Action) -> Handler {
        let controller = self.controller.clone();
        Arc::new(move |req: Request| {
            let controller = controller.clone();
            Box::pin(async move {
                let result = match action {
                    Action::Index => controller.index(&req).await,
                    Action::Create => controller.create(&req).await,
                    Action::Show | Action::Update | Action::Delete => {
                        let id = match req.params.require("id") {
                            Ok(value) => value.clone(),
                            Err(err) => {
                                tracing::error!(error = %err, "resource route without id binding");
                                return Response::internal_server_error();
                            }
                        };
                        match action {
                            Action::Show => controller.show(&req, &id).await,
                            Action::Update => controller.update(&req, &id).await,
                            _ => controller.delete(&req, &id).await,
                        }
                    }
                };
                into_response(result)
            })
        })
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("id_kind", &self.id_kind)
            .finish()
    }
}

/// Adapts a controller result into a wire response.
fn into_response(result: ControllerResult) -> Response {
    match result {
        Ok(Reply::Response(response)) => response,
        Ok(Reply::Json(value)) => Response::json(&value),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ActionSet, ControllerError};
    use patina_http::ParamValue;
    use patina_router::BoxFuture;

    struct Echo;

    impl Controller for Echo {
        fn capabilities(&self) -> ActionSet {
            ActionSet::all().without(Action::Delete)
        }

        fn index<'a>(&'a self, _req: &'a Request) -> BoxFuture<'a, ControllerResult> {
            Box::pin(async { Reply::json(&serde_json::json!(["a", "b"])) })
        }

        fn show<'a>(
            &'a self,
            _req: &'a Request,
            id: &'a ParamValue,
        ) -> BoxFuture<'a, ControllerResult> {
            Box::pin(async move { Reply::json(&serde_json::json!({ "id": id.to_json() })) })
        }

        fn create<'a>(&'a self, _req: &'a Request) -> BoxFuture<'a, ControllerResult> {
            Box::pin(async { Ok(Reply::Response(Response::new(201))) })
        }

        fn update<'a>(
            &'a self,
            _req: &'a Request,
            _id: &'a ParamValue,
        ) -> BoxFuture<'a, ControllerResult> {
            Box::pin(async { Err(ControllerError::not_found("nothing to update")) })
        }
    }

    async fn dispatch(table: &RouteTable, req: Request) -> Response {
        let matched = table
            .resolve(req.method, &req.path)
            .expect("route should resolve");
        let mut req = req;
        req.params = matched.params;
        (matched.route.handler)(req).await
    }

    #[tokio::test]
    async fn test_bind_registers_available_actions() {
        let mut table = RouteTable::new();
        let report = Resource::new("users", Echo).bind(&mut table).unwrap();

        assert_eq!(report.resource, "users");
        assert_eq!(report.missing, vec![Action::Delete]);
        assert!(!report.is_complete());
        // index, show, create, update(PUT), update(PATCH)
        assert_eq!(report.registered.len(), 5);

        assert!(table.resolve(Method::Get, "/users").is_ok());
        assert!(table.resolve(Method::Get, "/users/jane").is_ok());
        assert!(table.resolve(Method::Post, "/users").is_ok());
        assert!(table.resolve(Method::Put, "/users/jane").is_ok());
        assert!(table.resolve(Method::Patch, "/users/jane").is_ok());
        assert!(table.resolve(Method::Delete, "/users/jane").is_err());
    }

    #[tokio::test]
    async fn test_bind_strict_rejects_incomplete_controller() {
        let mut table = RouteTable::new();
        let err = Resource::new("users", Echo)
            .bind_strict(&mut table)
            .unwrap_err();
        assert!(matches!(
            err,
            ResourceError::MissingCapabilities { resource, actions }
                if resource == "users" && actions == vec![Action::Delete]
        ));
    }

    #[tokio::test]
    async fn test_json_reply_is_encoded() {
        let mut table = RouteTable::new();
        Resource::new("users", Echo).bind(&mut table).unwrap();

        let response = dispatch(&table, Request::get("/users")).await;
        assert_eq!(response.status, 200);
        assert_eq!(
            response.headers.get("Content-Type"),
            Some(&"application/json".to_string())
        );
        assert_eq!(response.body_string(), Some("[\"a\",\"b\"]".to_string()));
    }

    #[tokio::test]
    async fn test_response_reply_passes_through() {
        let mut table = RouteTable::new();
        Resource::new("users", Echo).bind(&mut table).unwrap();

        let response = dispatch(&table, Request::post("/users")).await;
        assert_eq!(response.status, 201);
    }

    #[tokio::test]
    async fn test_controller_error_maps_to_status() {
        let mut table = RouteTable::new();
        Resource::new("users", Echo).bind(&mut table).unwrap();

        let response = dispatch(&table, Request::put("/users/jane")).await;
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_typed_id_kind() {
        let mut table = RouteTable::new();
        Resource::new("users", Echo)
            .id_kind("int")
            .bind(&mut table)
            .unwrap();

        let response = dispatch(&table, Request::get("/users/42")).await;
        assert_eq!(response.body_string(), Some("{\"id\":42}".to_string()));

        assert!(table.resolve(Method::Get, "/users/jane").is_err());
    }

    #[tokio::test]
    async fn test_unknown_id_kind_fails_binding() {
        let mut table = RouteTable::new();
        let err = Resource::new("users", Echo)
            .id_kind("uuid")
            .bind(&mut table)
            .unwrap_err();
        assert!(matches!(err, ResourceError::Router(_)));
    }
}
