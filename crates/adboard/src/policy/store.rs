//! Key-value storage behind the suppression policy.
//!
//! The policy itself is storage-agnostic: tests and embedded use get the
//! in-memory store, a browser-backed host can adapt its session storage.
//! Session-scoped vs durable semantics are a property of the instance the
//! caller supplies, not of the trait.

use std::collections::HashMap;
use std::sync::RwLock;

/// Minimal string key-value store. Writes are single-key,
/// last-writer-wins; the policy never needs multi-key atomicity because
/// the two partitions use independent keys.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store. One instance models one browser session (or the
/// durable store, when the caller keeps it alive across "sessions").
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.entries.write() {
            map.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut map) = self.entries.write() {
            map.remove(key);
        }
    }
}
