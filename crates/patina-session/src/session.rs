//! The per-request session handle.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, SessionError};
use crate::store::{MemoryStore, SessionData, SessionStore};

enum SessionState {
    /// The store has not been consulted yet.
    Unresolved,
    /// Data loaded from the store, or a fresh record not yet persisted.
    Resolved {
        id: String,
        data: SessionData,
        /// True when no record existed under the incoming id.
        fresh: bool,
    },
}

struct SessionInner {
    store: Arc<dyn SessionStore>,
    incoming_id: Option<String>,
    state: Mutex<SessionState>,
    accessed: AtomicBool,
    dirty: AtomicBool,
}

/// A non-owning handle into the session store for one client.
///
/// The handle is lazy: the store is only consulted on first read or write
/// access, so session-free requests never touch it. Clones share the same
/// state, which is what makes a cloned [`patina_http::Request`] carry the
/// same session.
///
/// Whether the session was touched, and whether it was mutated, is tracked
/// so the manager can decide what to persist after the request.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Creates a handle bound to a store and an optional incoming id.
    pub fn new(store: Arc<dyn SessionStore>, incoming_id: Option<String>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                store,
                incoming_id,
                state: Mutex::new(SessionState::Unresolved),
                accessed: AtomicBool::new(false),
                dirty: AtomicBool::new(false),
            }),
        }
    }

    /// Creates a standalone handle backed by its own in-memory store.
    ///
    /// Useful for exercising handlers outside a dispatcher.
    pub fn detached() -> Self {
        Self::new(Arc::new(MemoryStore::new()), None)
    }

    /// Returns whether the session was read from or written to.
    pub fn touched(&self) -> bool {
        self.inner.accessed.load(Ordering::SeqCst)
    }

    /// Returns whether the session data was mutated.
    pub fn modified(&self) -> bool {
        self.inner.dirty.load(Ordering::SeqCst)
    }

    /// Returns the session id, resolving the session if needed.
    ///
    /// Counts as a read access.
    pub async fn id(&self) -> Result<String> {
        self.ensure_resolved().await?;
        match &*self.lock_state()? {
            SessionState::Resolved { id, .. } => Ok(id.clone()),
            SessionState::Unresolved => unreachable!("session resolved above"),
        }
    }

    /// Gets a value from the session data.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.ensure_resolved().await?;
        let state = self.lock_state()?;
        match &*state {
            SessionState::Resolved { data, .. } => data
                .get(key)
                .cloned()
                .map(|value| serde_json::from_value(value).map_err(SessionError::from))
                .transpose(),
            SessionState::Unresolved => unreachable!("session resolved above"),
        }
    }

    /// Sets a value in the session data.
    pub async fn insert<T: Serialize>(&self, key: &str, value: T) -> Result<()> {
        self.ensure_resolved().await?;
        let encoded = serde_json::to_value(value)?;
        let mut state = self.lock_state()?;
        match &mut *state {
            SessionState::Resolved { data, .. } => {
                data.insert(key.to_string(), encoded);
                self.inner.dirty.store(true, Ordering::SeqCst);
                Ok(())
            }
            SessionState::Unresolved => unreachable!("session resolved above"),
        }
    }

    /// Removes a value from the session data.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.ensure_resolved().await?;
        let mut state = self.lock_state()?;
        match &mut *state {
            SessionState::Resolved { data, .. } => {
                if data.remove(key).is_some() {
                    self.inner.dirty.store(true, Ordering::SeqCst);
                }
                Ok(())
            }
            SessionState::Unresolved => unreachable!("session resolved above"),
        }
    }

    /// Removes every value from the session data.
    pub async fn clear(&self) -> Result<()> {
        self.ensure_resolved().await?;
        let mut state = self.lock_state()?;
        match &mut *state {
            SessionState::Resolved { data, .. } => {
                if !data.is_empty() {
                    self.inner.dirty.store(true, Ordering::SeqCst);
                }
                data.clear();
                Ok(())
            }
            SessionState::Unresolved => unreachable!("session resolved above"),
        }
    }

    /// Returns a copy of the resolved state, if the session was resolved.
    ///
    /// Used by the manager at persist time: `(id, data, fresh)`.
    pub fn snapshot(&self) -> Option<(String, SessionData, bool)> {
        let state = self.inner.state.lock().ok()?;
        match &*state {
            SessionState::Resolved { id, data, fresh } => {
                Some((id.clone(), data.clone(), *fresh))
            }
            SessionState::Unresolved => None,
        }
    }

    /// Loads the state from the store on first access.
    async fn ensure_resolved(&self) -> Result<()> {
        self.inner.accessed.store(true, Ordering::SeqCst);

        if matches!(&*self.lock_state()?, SessionState::Resolved { .. }) {
            return Ok(());
        }

        // Load outside the state lock; the store call may suspend.
        let loaded = match &self.inner.incoming_id {
            Some(id) => self
                .inner
                .store
                .load(id)
                .await?
                .map(|data| (id.clone(), data)),
            None => None,
        };

        let mut state = self.lock_state()?;
        // A concurrent clone may have resolved the state meanwhile.
        if matches!(&*state, SessionState::Unresolved) {
            *state = match loaded {
                Some((id, data)) => SessionState::Resolved {
                    id,
                    data,
                    fresh: false,
                },
                None => SessionState::Resolved {
                    id: self.inner.store.generate_id(),
                    data: SessionData::new(),
                    fresh: true,
                },
            };
        }
        Ok(())
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, SessionState>> {
        self.inner
            .state
            .lock()
            .map_err(|_| SessionError::Store("session state lock poisoned".to_string()))
    }
}

/// Access to the session handle the dispatcher attached to a request.
pub trait RequestSessionExt {
    /// Returns the request's session handle.
    ///
    /// Outside a dispatcher (unit-testing a handler directly), no handle is
    /// attached and a detached in-memory session is returned instead, so
    /// handler code works unchanged.
    fn session(&self) -> Session;
}

impl RequestSessionExt for patina_http::Request {
    fn session(&self) -> Session {
        self.extensions
            .get::<Session>()
            .cloned()
            .unwrap_or_else(Session::detached)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resolved = matches!(
            self.inner.state.lock().as_deref(),
            Ok(SessionState::Resolved { .. })
        );
        f.debug_struct("Session")
            .field("resolved", &resolved)
            .field("touched", &self.touched())
            .field("modified", &self.modified())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_untouched_session_stays_unresolved() {
        let session = Session::detached();
        assert!(!session.touched());
        assert!(!session.modified());
        assert!(session.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_get_set_remove() {
        let session = Session::detached();

        session.insert("test_key", "test_value").await.unwrap();
        let value: Option<String> = session.get("test_key").await.unwrap();
        assert_eq!(value, Some("test_value".to_string()));

        session.remove("test_key").await.unwrap();
        let value: Option<String> = session.get("test_key").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_read_marks_touched_not_modified() {
        let session = Session::detached();
        let _: Option<u32> = session.get("counter").await.unwrap();

        assert!(session.touched());
        assert!(!session.modified());
    }

    #[tokio::test]
    async fn test_write_marks_modified() {
        let session = Session::detached();
        session.insert("counter", 1).await.unwrap();

        assert!(session.touched());
        assert!(session.modified());
    }

    #[tokio::test]
    async fn test_removing_missing_key_is_not_a_mutation() {
        let session = Session::detached();
        session.remove("missing").await.unwrap();

        assert!(session.touched());
        assert!(!session.modified());
    }

    #[tokio::test]
    async fn test_fresh_session_gets_generated_id() {
        let session = Session::detached();
        let id = session.id().await.unwrap();
        assert_eq!(id.len(), 64);

        let (snapshot_id, _, fresh) = session.snapshot().unwrap();
        assert_eq!(snapshot_id, id);
        assert!(fresh);
    }

    #[tokio::test]
    async fn test_existing_record_is_loaded_under_incoming_id() {
        let store = Arc::new(MemoryStore::new());
        let id = store.generate_id();
        let mut data = SessionData::new();
        data.insert("user".to_string(), serde_json::json!("alice"));
        store.save(&id, data).await.unwrap();

        let session = Session::new(store, Some(id.clone()));
        let user: Option<String> = session.get("user").await.unwrap();
        assert_eq!(user, Some("alice".to_string()));
        assert_eq!(session.id().await.unwrap(), id);

        let (_, _, fresh) = session.snapshot().unwrap();
        assert!(!fresh);
    }

    #[tokio::test]
    async fn test_unknown_incoming_id_starts_fresh_with_new_id() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store, Some("stale-id".to_string()));

        let value: Option<String> = session.get("anything").await.unwrap();
        assert!(value.is_none());
        assert_ne!(session.id().await.unwrap(), "stale-id");
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let session = Session::detached();
        let clone = session.clone();

        clone.insert("shared", 7).await.unwrap();
        let value: Option<u32> = session.get("shared").await.unwrap();
        assert_eq!(value, Some(7));
        assert!(session.modified());
    }
}
