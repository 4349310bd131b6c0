//! Session storage.
//!
//! The store is an external collaborator behind [`SessionStore`]; the
//! in-memory implementation is the default and the reference for the
//! concurrency contract: `save` replaces a record atomically, so concurrent
//! requests on the same id resolve last-writer-wins.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use futures::future::BoxFuture;

use crate::error::{Result, SessionError};

/// The JSON-compatible data of one session.
pub type SessionData = HashMap<String, serde_json::Value>;

/// Key-value storage for session records.
pub trait SessionStore: Send + Sync {
    /// Loads the data stored under `id`, if any.
    fn load<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<SessionData>>>;

    /// Stores `data` under `id`, replacing any previous record.
    fn save<'a>(&'a self, id: &'a str, data: SessionData) -> BoxFuture<'a, Result<()>>;

    /// Removes the record stored under `id`.
    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Mints a fresh opaque session id.
    fn generate_id(&self) -> String {
        generate_session_id()
    }
}

/// Generates a cryptographically secure session id (64 hex characters).
pub fn generate_session_id() -> String {
    use rand::RngExt;
    let mut rng = rand::rng();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes);
    hex::encode(&bytes)
}

/// Helper module for hex encoding (avoiding external dependency).
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

struct MemoryRecord {
    data: SessionData,
    expire_date: DateTime<Utc>,
}

/// In-memory session store with per-record expiry.
pub struct MemoryStore {
    ttl: Duration,
    records: RwLock<HashMap<String, MemoryRecord>>,
}

impl MemoryStore {
    /// Default record expiration time (2 weeks).
    pub const DEFAULT_EXPIRY_DAYS: i64 = 14;

    /// Creates a store with the default record expiry.
    pub fn new() -> Self {
        Self::with_ttl(Duration::days(Self::DEFAULT_EXPIRY_DAYS))
    }

    /// Creates a store with a custom record expiry.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Deletes all expired records, returning how many were removed.
    pub fn clear_expired(&self) -> Result<usize> {
        let mut records = self.write()?;
        let now = Utc::now();
        let before = records.len();
        records.retain(|_, record| record.expire_date > now);
        Ok(before - records.len())
    }

    /// Returns the count of stored records, expired ones included.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Returns whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, MemoryRecord>>> {
        self.records
            .read()
            .map_err(|_| SessionError::Store("session store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, MemoryRecord>>> {
        self.records
            .write()
            .map_err(|_| SessionError::Store("session store lock poisoned".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemoryStore {
    fn load<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<SessionData>>> {
        Box::pin(async move {
            let records = self.read()?;
            Ok(records
                .get(id)
                .filter(|record| record.expire_date > Utc::now())
                .map(|record| record.data.clone()))
        })
    }

    fn save<'a>(&'a self, id: &'a str, data: SessionData) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut records = self.write()?;
            records.insert(
                id.to_string(),
                MemoryRecord {
                    data,
                    expire_date: Utc::now() + self.ttl,
                },
            );
            Ok(())
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.write()?.remove(id);
            Ok(())
        })
    }
}
