//! In-memory key-value store for tests and ephemeral sessions

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::KeyValueStore;
use crate::error::Result;

/// In-memory key-value store
///
/// Contents are lost when the process exits. Intended for tests; a session
/// backed by this store behaves like a browser with storage disabled.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();

        assert!(store.get("missing").await.unwrap().is_none());

        store.set("theme", "dark").await.unwrap();
        assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("dark"));

        store.set("theme", "light").await.unwrap();
        assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("light"));

        store.remove("theme").await.unwrap();
        assert!(store.get("theme").await.unwrap().is_none());

        // Removing a missing key succeeds
        store.remove("theme").await.unwrap();
    }
}
