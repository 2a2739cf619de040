//! Driven port for the persistent key/value storage that backs the session.
//!
//! The contract mirrors browser-style local storage: string keys, string
//! values, and a `clear` that wipes every key rather than just the ones the
//! client knows about.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::define_port_error;

define_port_error! {
    /// Errors raised by storage adapters.
    pub enum StorageError {
        /// The backing medium could not be read or written.
        Unavailable { message: String } => "storage unavailable: {message}",
        /// Stored bytes could not be decoded into a key/value map.
        Corrupt { message: String } => "storage contents unreadable: {message}",
    }
}

/// Port for string key/value persistence.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key` if present.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Remove every key.
    fn clear(&self) -> Result<(), StorageError>;

    /// Every stored key in ascending order.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// In-memory store used by tests and by sessions that should not persist.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `entries`.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
        }
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // A panic mid-write cannot leave a BTreeMap half-updated.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.entries().clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[test]
    fn set_replaces_and_remove_deletes() {
        let store = MemoryKeyValueStore::new();
        store.set("user", "a").expect("set");
        store.set("user", "b").expect("set");
        assert_eq!(store.get("user").expect("get").as_deref(), Some("b"));

        store.remove("user").expect("remove");
        assert_eq!(store.get("user").expect("get"), None);
    }

    #[test]
    fn clear_removes_unrelated_keys_too() {
        let store = MemoryKeyValueStore::with_entries([("user", "{}"), ("theme", "dark")]);
        assert_eq!(store.keys().expect("keys"), vec!["theme", "user"]);

        store.clear().expect("clear");
        assert!(store.keys().expect("keys").is_empty());
    }

    #[test]
    fn storage_errors_render_their_cause() {
        assert_eq!(
            StorageError::corrupt("expected object").to_string(),
            "storage contents unreadable: expected object"
        );
    }
}
