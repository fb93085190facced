//! String-keyed persistence backends
//!
//! Everything the game persists (best score, sound preference, the saved face
//! sprite and its last-active timestamp) goes through [`KeyValueStore`] so the
//! logic on top is testable without a browser. The wasm build talks to
//! LocalStorage; native builds and tests use the in-memory store.

use std::collections::HashMap;

/// Minimal string key-value storage interface.
///
/// `set` reports failure (quota exceeded, storage disabled) instead of
/// erroring; callers are expected to degrade silently.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> bool;
    fn remove(&mut self, key: &str);
}

/// In-memory store for native builds and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        self.entries.insert(key.to_owned(), value.to_owned());
        true
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// LocalStorage-backed store (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    pub fn new() -> Self {
        Self
    }

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok()?
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        match Self::storage() {
            Some(storage) => storage.set_item(key, value).is_ok(),
            None => false,
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.get("a").is_none());

        assert!(store.set("a", "1"));
        assert_eq!(store.get("a").as_deref(), Some("1"));

        store.set("a", "2");
        assert_eq!(store.get("a").as_deref(), Some("2"));

        store.remove("a");
        assert!(store.get("a").is_none());
        assert!(store.is_empty());
    }
}
