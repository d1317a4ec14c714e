use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::{validate_key, SessionStore};

/// In-memory, HashMap-based session store.
///
/// Intended for tests and embedding. Entries live behind a `RwLock` and are
/// lost when the store is dropped, which is exactly a session's lifetime.
#[derive(Debug)]
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemorySessionStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        validate_key(key)?;
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<bool> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.remove(key).is_some())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn clear(&self) -> StoreResult<()> {
        self.entries
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let store = InMemorySessionStore::new();
        store.set_item("app-state", "{\"a\":1}").unwrap();
        assert_eq!(
            store.get_item("app-state").unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_key_is_none() {
        let store = InMemorySessionStore::new();
        assert!(store.get_item("nope").unwrap().is_none());
        assert!(!store.remove_item("nope").unwrap());
    }

    #[test]
    fn set_replaces_entry() {
        let store = InMemorySessionStore::new();
        store.set_item("k", "1").unwrap();
        store.set_item("k", "2").unwrap();
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_and_clear() {
        let store = InMemorySessionStore::new();
        store.set_item("a", "1").unwrap();
        store.set_item("b", "2").unwrap();
        assert!(store.remove_item("a").unwrap());
        assert_eq!(store.keys().unwrap(), vec!["b".to_string()]);
        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn invalid_key_is_rejected() {
        let store = InMemorySessionStore::new();
        assert!(matches!(
            store.set_item("", "x"),
            Err(StoreError::InvalidKey { .. })
        ));
    }

    #[test]
    fn concurrent_writers_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemorySessionStore::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for j in 0..25 {
                        store.set_item(&format!("k{i}-{j}"), "v").unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 100);
    }
}
