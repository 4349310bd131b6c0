//! Session lifecycle and cookie policy.

use std::sync::Arc;

use chrono::{Duration, Utc};
use patina_http::{Request, Response, SameSite, SetCookie};

use crate::error::Result;
use crate::session::Session;
use crate::store::{MemoryStore, SessionStore};

/// Cookie policy for the session id.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name of the session-id cookie.
    pub cookie_name: String,
    /// Path scope of the cookie.
    pub cookie_path: String,
    /// Cookie (and refresh) lifetime.
    pub ttl: Duration,
    /// Whether the cookie is hidden from client-side scripts.
    pub http_only: bool,
    /// Whether the cookie is restricted to secure transports.
    pub secure: bool,
    /// Cross-site sending policy.
    pub same_site: SameSite,
}

impl SessionConfig {
    /// Default session-id cookie name.
    pub const DEFAULT_COOKIE_NAME: &'static str = "sessionid";

    /// Sets the cookie name.
    #[must_use]
    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Sets the cookie lifetime in days.
    #[must_use]
    pub fn ttl_days(mut self, days: i64) -> Self {
        self.ttl = Duration::days(days);
        self
    }

    /// Sets whether the cookie is restricted to secure transports.
    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: Self::DEFAULT_COOKIE_NAME.to_string(),
            cookie_path: "/".to_string(),
            ttl: Duration::days(MemoryStore::DEFAULT_EXPIRY_DAYS),
            http_only: true,
            secure: false,
            same_site: SameSite::Lax,
        }
    }
}

/// Resolves and persists sessions around a dispatch.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl SessionManager {
    /// Creates a manager over a store with the default cookie policy.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self::with_config(store, SessionConfig::default())
    }

    /// Creates a manager with an explicit cookie policy.
    pub fn with_config(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// Returns the cookie policy.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the backing store.
    pub fn store(&self) -> Arc<dyn SessionStore> {
        self.store.clone()
    }

    /// Resolves the session handle for a request.
    ///
    /// Only the cookie map is read here; the store is not consulted until
    /// the handle's first access.
    pub fn resolve(&self, request: &Request) -> Session {
        let incoming_id = request
            .get_cookie(&self.config.cookie_name)
            .map(str::to_string);
        Session::new(self.store.clone(), incoming_id)
    }

    /// Persists the session after a dispatch.
    ///
    /// - untouched: nothing happens (no cookie churn);
    /// - mutated (or a fresh session written to): data is stored and the
    ///   session cookie is written with a refreshed expiry;
    /// - read-only access to an existing record: cookie refresh only;
    /// - read-only access that found no record: nothing worth keeping.
    pub async fn persist(&self, session: &Session, response: &mut Response) -> Result<()> {
        if !session.touched() {
            return Ok(());
        }
        let Some((id, data, fresh)) = session.snapshot() else {
            return Ok(());
        };

        if session.modified() {
            self.store.save(&id, data).await?;
        } else if fresh {
            return Ok(());
        }

        let cookie = SetCookie::new(self.config.cookie_name.clone(), id)
            .path(self.config.cookie_path.clone())
            .max_age(self.config.ttl.num_seconds())
            .expires(Utc::now() + self.config.ttl)
            .http_only(self.config.http_only)
            .secure(self.config.secure)
            .same_site(self.config.same_site);
        response.add_cookie(cookie);
        Ok(())
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        SessionManager::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_untouched_session_writes_nothing() {
        let manager = manager();
        let session = manager.resolve(&Request::get("/"));

        let mut response = Response::ok();
        manager.persist(&session, &mut response).await.unwrap();

        assert!(response.cookies.is_empty());
    }

    #[tokio::test]
    async fn test_mutated_session_sets_cookie_and_stores() {
        let manager = manager();
        let session = manager.resolve(&Request::get("/"));
        session.insert("user", "alice").await.unwrap();

        let mut response = Response::ok();
        manager.persist(&session, &mut response).await.unwrap();

        let cookie = response.get_cookie("sessionid").expect("session cookie");
        assert_eq!(cookie.value.len(), 64);
        assert!(cookie.http_only);

        let stored = manager.store.load(&cookie.value).await.unwrap().unwrap();
        assert_eq!(stored.get("user"), Some(&serde_json::json!("alice")));
    }

    #[tokio::test]
    async fn test_cookie_round_trip_restores_data() {
        let manager = manager();

        let session = manager.resolve(&Request::get("/"));
        session.insert("count", 1).await.unwrap();
        let mut response = Response::ok();
        manager.persist(&session, &mut response).await.unwrap();
        let cookie = response.get_cookie("sessionid").unwrap().clone();

        // Echo the cookie back the way a client would.
        let request = Request::get("/").header(
            "Cookie",
            format!("{}={}", cookie.name, cookie.value),
        );
        let session = manager.resolve(&request);
        let count: Option<u32> = session.get("count").await.unwrap();
        assert_eq!(count, Some(1));
        assert_eq!(session.id().await.unwrap(), cookie.value);
    }

    #[tokio::test]
    async fn test_read_only_existing_session_refreshes_cookie_only() {
        let manager = manager();
        let store = manager.store();
        let id = store.generate_id();
        let mut data = crate::store::SessionData::new();
        data.insert("user".to_string(), serde_json::json!("alice"));
        store.save(&id, data).await.unwrap();

        let request = Request::get("/").cookie("sessionid", id.clone());
        let session = manager.resolve(&request);
        let _: Option<String> = session.get("user").await.unwrap();

        let mut response = Response::ok();
        manager.persist(&session, &mut response).await.unwrap();

        let cookie = response.get_cookie("sessionid").expect("refreshed cookie");
        assert_eq!(cookie.value, id);
    }

    #[tokio::test]
    async fn test_read_only_fresh_session_persists_nothing() {
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::new(store.clone());
        let session = manager.resolve(&Request::get("/"));
        let _: Option<String> = session.get("anything").await.unwrap();

        let mut response = Response::ok();
        manager.persist(&session, &mut response).await.unwrap();

        assert!(response.cookies.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_custom_config() {
        let config = SessionConfig::default()
            .cookie_name("patina_sid")
            .ttl_days(1)
            .secure(true);
        let manager = SessionManager::with_config(Arc::new(MemoryStore::new()), config);

        let session = manager.resolve(&Request::get("/"));
        session.insert("k", "v").await.unwrap();
        let mut response = Response::ok();
        manager.persist(&session, &mut response).await.unwrap();

        let cookie = response.get_cookie("patina_sid").expect("custom cookie");
        assert_eq!(cookie.max_age, Some(86_400));
        assert!(cookie.secure);
    }
}
