//! Type-keyed request extensions.
//!
//! The dispatcher uses this slot to attach request-scoped collaborators
//! (the session handle, the renderer) without the primitive types knowing
//! about them. Values are reference-counted, so request clones share the
//! same attached instances.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A map of request-scoped values keyed by type.
#[derive(Clone, Default)]
pub struct Extensions {
    map: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Extensions {
    /// Creates an empty extensions map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any existing value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.map.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Gets a reference to the value of the given type.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns whether a value of the given type is present.
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.map.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Marker(u32);

    #[test]
    fn test_insert_and_get() {
        let mut ext = Extensions::new();
        ext.insert(Marker(7));

        assert_eq!(ext.get::<Marker>(), Some(&Marker(7)));
        assert!(ext.contains::<Marker>());
        assert!(ext.get::<String>().is_none());
    }

    #[test]
    fn test_replace() {
        let mut ext = Extensions::new();
        ext.insert(Marker(1));
        ext.insert(Marker(2));

        assert_eq!(ext.get::<Marker>(), Some(&Marker(2)));
    }

    #[test]
    fn test_clone_shares_values() {
        let mut ext = Extensions::new();
        ext.insert(Arc::new(Marker(9)));

        let cloned = ext.clone();
        let a = ext.get::<Arc<Marker>>().unwrap();
        let b = cloned.get::<Arc<Marker>>().unwrap();
        assert!(Arc::ptr_eq(a, b));
    }
}
