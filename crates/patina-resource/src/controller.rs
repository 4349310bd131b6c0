//! Resource controllers.
//!
//! A controller exposes up to five conventional actions over one named
//! collection. Which actions it implements is declared explicitly through
//! [`Controller::capabilities`], so the binder can fail fast at registration
//! time instead of surfacing a missing implementation as a puzzling 404.

use patina_http::{ParamValue, Request, Response};
use patina_router::BoxFuture;
use serde::Serialize;
use thiserror::Error;

/// The conventional resource actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `GET /resource` - list the collection.
    Index,
    /// `GET /resource/{id}` - fetch one member.
    Show,
    /// `POST /resource` - create a member.
    Create,
    /// `PUT|PATCH /resource/{id}` - update a member.
    Update,
    /// `DELETE /resource/{id}` - delete a member.
    Delete,
}

impl Action {
    /// All actions, in binding order.
    pub const ALL: [Self; 5] = [
        Self::Index,
        Self::Show,
        Self::Create,
        Self::Update,
        Self::Delete,
    ];

    /// Returns the action name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Show => "show",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Self::Index => 1,
            Self::Show => 1 << 1,
            Self::Create => 1 << 2,
            Self::Update => 1 << 3,
            Self::Delete => 1 << 4,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The set of actions a controller implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionSet {
    bits: u8,
}

impl ActionSet {
    /// The empty set.
    pub fn none() -> Self {
        Self::default()
    }

    /// The full set of five actions.
    pub fn all() -> Self {
        Action::ALL.into_iter().collect()
    }

    /// Adds an action.
    #[must_use]
    pub fn with(mut self, action: Action) -> Self {
        self.bits |= action.bit();
        self
    }

    /// Removes an action.
    #[must_use]
    pub fn without(mut self, action: Action) -> Self {
        self.bits &= !action.bit();
        self
    }

    /// Returns whether the set contains an action.
    pub fn contains(&self, action: Action) -> bool {
        self.bits & action.bit() != 0
    }

    /// Iterates the contained actions in binding order.
    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        Action::ALL.into_iter().filter(|a| self.contains(*a))
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        iter.into_iter().fold(Self::none(), Self::with)
    }
}

/// What a controller action hands back.
pub enum Reply {
    /// A fully-formed response, passed through unchanged.
    Response(Response),
    /// A JSON-representable value, encoded by the generated handler.
    Json(serde_json::Value),
}

impl Reply {
    /// Encodes any serializable value as a JSON reply.
    pub fn json<T: Serialize>(value: &T) -> ControllerResult {
        Ok(Self::Json(serde_json::to_value(value)?))
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

impl From<serde_json::Value> for Reply {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// A failed controller action, carried as a status class plus message.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ControllerError {
    /// HTTP status class of the failure.
    pub status: u16,
    /// Human-readable message, JSON-encoded into the error body.
    pub message: String,
}

impl ControllerError {
    /// Creates an error with an explicit status.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// A 400 Bad Request failure.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    /// A 404 Not Found failure.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    /// A 409 Conflict failure.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(409, message)
    }

    /// A 500 Internal Server Error failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }

    /// The failure produced by an unimplemented default action.
    pub fn unsupported(action: Action) -> Self {
        Self::new(501, format!("action {action} is not implemented"))
    }

    /// Renders the failure as a JSON error response.
    pub fn into_response(self) -> Response {
        Response::json(&serde_json::json!({ "error": self.message })).status(self.status)
    }
}

impl From<serde_json::Error> for ControllerError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("reply encoding failed: {err}"))
    }
}

/// Result type of a controller action.
pub type ControllerResult = std::result::Result<Reply, ControllerError>;

/// A controller over one resource collection.
///
/// Every action has a default implementation that fails with a 501 reply;
/// [`Controller::capabilities`] must declare exactly the actions the
/// implementation overrides, since the binder trusts the declaration when
/// it generates routes.
pub trait Controller: Send + Sync {
    /// The actions this controller implements.
    fn capabilities(&self) -> ActionSet;

    /// Lists the collection.
    fn index<'a>(&'a self, _req: &'a Request) -> BoxFuture<'a, ControllerResult> {
        Box::pin(async { Err(ControllerError::unsupported(Action::Index)) })
    }

    /// Fetches one member by id.
    fn show<'a>(
        &'a self,
        _req: &'a Request,
        _id: &'a ParamValue,
    ) -> BoxFuture<'a, ControllerResult> {
        Box::pin(async { Err(ControllerError::unsupported(Action::Show)) })
    }

    /// Creates a member.
    fn create<'a>(&'a self, _req: &'a Request) -> BoxFuture<'a, ControllerResult> {
        Box::pin(async { Err(ControllerError::unsupported(Action::Create)) })
    }

    /// Updates one member by id.
    fn update<'a>(
        &'a self,
        _req: &'a Request,
        _id: &'a ParamValue,
    ) -> BoxFuture<'a, ControllerResult> {
        Box::pin(async { Err(ControllerError::unsupported(Action::Update)) })
    }

    /// Deletes one member by id.
    fn delete<'a>(
        &'a self,
        _req: &'a Request,
        _id: &'a ParamValue,
    ) -> BoxFuture<'a, ControllerResult> {
        Box::pin(async { Err(ControllerError::unsupported(Action::Delete)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_set_operations() {
        let set = ActionSet::all().without(Action::Delete);

        assert!(set.contains(Action::Index));
        assert!(set.contains(Action::Update));
        assert!(!set.contains(Action::Delete));
        assert_eq!(set.iter().count(), 4);
        assert_eq!(set.with(Action::Delete), ActionSet::all());
    }

    #[test]
    fn test_action_set_from_iter() {
        let set: ActionSet = [Action::Index, Action::Show].into_iter().collect();
        assert!(set.contains(Action::Index));
        assert!(set.contains(Action::Show));
        assert!(!set.contains(Action::Create));
    }

    #[test]
    fn test_reply_json() {
        let reply = Reply::json(&serde_json::json!({"id": 1})).unwrap();
        assert!(matches!(reply, Reply::Json(_)));
    }

    #[test]
    fn test_controller_error_response() {
        let response = ControllerError::not_found("no such user").into_response();
        assert_eq!(response.status, 404);
        assert!(response
            .body_string()
            .unwrap()
            .contains("no such user"));
    }

    #[tokio::test]
    async fn test_default_actions_are_unsupported() {
        struct Bare;
        impl Controller for Bare {
            fn capabilities(&self) -> ActionSet {
                ActionSet::none()
            }
        }

        let req = Request::get("/things");
        let err = Bare.index(&req).await.err().expect("unsupported");
        assert_eq!(err.status, 501);
    }
}
