use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::StoreError;

const APP_DIR: &str = "ivory";

/// A named, persisted key-value document.
///
/// `get` and `set` only touch the in-memory copy; `load` and `save` move it
/// to and from durable storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn load(&mut self) -> Result<(), StoreError>;
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value);
    async fn save(&mut self) -> Result<(), StoreError>;
}

/// Keeps the document as a pretty-printed JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Map::new(),
        }
    }

    /// Places `file_name` under the platform config directory.
    pub fn in_config_dir(file_name: &str) -> Result<Self, StoreError> {
        let base = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        Ok(Self::new(base.join(APP_DIR).join(file_name)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn load(&mut self) -> Result<(), StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => match serde_json::from_str::<Value>(&text)? {
                Value::Object(entries) => {
                    debug!(path = ?self.path, keys = entries.len(), "loaded settings file");
                    self.entries = entries;
                    Ok(())
                }
                _ => Err(StoreError::NotAnObject(self.path.clone())),
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = ?self.path, "no settings file yet");
                self.entries.clear();
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    async fn save(&mut self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

/// In-memory store whose "disk" is shared between clones made with
/// [`MemoryStore::reopen`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    disk: Arc<Mutex<Map<String, Value>>>,
    entries: Map<String, Value>,
    fail_load: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `load` always fails.
    pub fn failing() -> Self {
        Self {
            fail_load: true,
            ..Self::default()
        }
    }

    /// A fresh handle on the same disk, with nothing loaded yet.
    pub fn reopen(&self) -> Self {
        Self {
            disk: Arc::clone(&self.disk),
            entries: Map::new(),
            fail_load: self.fail_load,
        }
    }

    /// Reads straight from the shared disk.
    pub fn persisted(&self, key: &str) -> Option<Value> {
        self.disk
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Writes straight to the shared disk.
    pub fn seed(&self, key: &str, value: Value) {
        self.disk
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn load(&mut self) -> Result<(), StoreError> {
        if self.fail_load {
            return Err(StoreError::Unavailable("memory store set to fail".into()));
        }
        let disk = self.disk.lock().unwrap_or_else(PoisonError::into_inner);
        self.entries = disk.clone();
        Ok(())
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    async fn save(&mut self) -> Result<(), StoreError> {
        let mut disk = self.disk.lock().unwrap_or_else(PoisonError::into_inner);
        *disk = self.entries.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("ivory-store-{}-{}", std::process::id(), name))
            .join("settings.json")
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let mut store = JsonFileStore::new(scratch_path("missing"));
        store.load().await.unwrap();
        assert_eq!(store.get("piano-sound"), None);
    }

    #[tokio::test]
    async fn file_store_persists_between_instances() {
        let path = scratch_path("persist");
        let mut store = JsonFileStore::new(&path);
        store.set("mute-sound", json!(false));
        store.set("piano-sound", json!("harpsichord"));
        store.save().await.unwrap();

        let mut reopened = JsonFileStore::new(&path);
        reopened.load().await.unwrap();
        assert_eq!(reopened.get("mute-sound"), Some(json!(false)));
        assert_eq!(reopened.get("piano-sound"), Some(json!("harpsichord")));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn non_object_document_is_rejected() {
        let path = scratch_path("array");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let mut store = JsonFileStore::new(&path);
        assert!(matches!(store.load().await, Err(StoreError::NotAnObject(_))));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn memory_store_only_persists_on_save() {
        let mut store = MemoryStore::new();
        store.set("show-keyboard", json!(true));
        assert_eq!(store.persisted("show-keyboard"), None);
        store.save().await.unwrap();
        assert_eq!(store.persisted("show-keyboard"), Some(json!(true)));

        let mut reopened = store.reopen();
        assert_eq!(reopened.get("show-keyboard"), None);
        reopened.load().await.unwrap();
        assert_eq!(reopened.get("show-keyboard"), Some(json!(true)));
    }
}
