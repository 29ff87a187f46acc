//! File-backed key-value store
//!
//! Persists all keys as a single JSON object in one file under the platform
//! data directory. Values are small (a token, a serialized user record, a
//! theme name), so every write is a read-modify-write of the whole file.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::warn;

use super::KeyValueStore;
use crate::error::{Error, Result};

/// File name of the store within the data directory
const STORE_FILE: &str = "local_store.json";

/// File-backed key-value store
///
/// An unreadable or corrupt store file is treated as empty on read; the next
/// successful write replaces it.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store at the default platform location
    ///
    /// Honors the `AURACHAT_DATA_DIR` environment variable, falling back to
    /// the platform data directory.
    pub fn open_default() -> Result<Self> {
        let dir = if let Ok(custom_dir) = env::var("AURACHAT_DATA_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::data_dir()
                .ok_or_else(|| Error::Storage("Could not determine data directory".to_string()))?
                .join("aurachat")
        };
        Ok(Self::new(dir.join(STORE_FILE)))
    }

    /// Path of the backing file
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read_all(&self) -> HashMap<String, String> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read store file");
                return HashMap::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(values) => values,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt store file; treating as empty");
                HashMap::new()
            }
        }
    }

    fn write_all(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(Error::Io)?;
        }
        let contents = serde_json::to_string_pretty(values)
            .map_err(|e| Error::Storage(format!("Failed to serialize store: {}", e)))?;
        fs::write(&self.path, contents).map_err(Error::Io)?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.read_all();
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.read_all();
        if values.remove(key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}
