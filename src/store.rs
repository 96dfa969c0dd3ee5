//! Persistent key-value store used for history and settings.
//!
//! The store mirrors a browser extension's local storage: an async `get` of a
//! set of keys returning whatever is present, and an async `set` that merges a
//! mapping into the stored values.

use crate::error::StorageError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Keys used by the translation pipeline.
pub mod keys {
    pub const HISTORY: &str = "history";
    pub const LAST_SOURCE: &str = "lastSource";
    pub const LAST_TARGET: &str = "lastTarget";
    pub const TRANSLATION_COUNT: &str = "translationCount";
    pub const HAS_REVIEWED: &str = "hasReviewed";
}

/// Async key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the requested keys. Missing keys are absent from the result.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StorageError>;

    /// Merge `values` into the store in a single write.
    async fn set(&self, values: Map<String, Value>) -> Result<(), StorageError>;
}

/// Read one key and decode it, `None` when the key is missing or null.
pub async fn read_key<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let mut values = store.get(&[key]).await?;
    match values.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            }),
    }
}

/// Encode one value and write it under `key`.
pub async fn write_key<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let value = serde_json::to_value(value).map_err(|e| StorageError::Serialize {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    let mut values = Map::new();
    values.insert(key.to_string(), value);
    store.set(values).await
}

/// In-memory store, used for tests and when no file is configured.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<Map<String, Value>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `StorageError::Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "memory store disconnected".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StorageError> {
        self.check_available()?;
        let values = self.values.read().await;
        Ok(keys
            .iter()
            .filter_map(|key| values.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, values: Map<String, Value>) -> Result<(), StorageError> {
        self.check_available()?;
        self.values.write().await.extend(values);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk.
///
/// Writes go to a sibling temp file which is then renamed over the target, so a
/// crash never leaves a half-written store behind.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>, StorageError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(StorageError::Unavailable(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StorageError::Corrupt {
                key: "*".to_string(),
                reason: "store file is not a JSON object".to_string(),
            }),
            Err(e) => Err(StorageError::Corrupt {
                key: "*".to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StorageError> {
        let mut all = self.read_all().await?;
        Ok(keys
            .iter()
            .filter_map(|key| all.remove(*key).map(|v| (key.to_string(), v)))
            .collect())
    }

    async fn set(&self, values: Map<String, Value>) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut all = self.read_all().await?;
        all.extend(values);

        let body = serde_json::to_vec_pretty(&Value::Object(all)).map_err(|e| {
            StorageError::Serialize {
                key: "*".to_string(),
                reason: e.to_string(),
            }
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    StorageError::Unavailable(format!(
                        "failed to create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &body).await.map_err(|e| {
            StorageError::Unavailable(format!("failed to write {}: {}", tmp_path.display(), e))
        })?;
        tokio::fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            StorageError::Unavailable(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!("Store written to {}", self.path.display());
        Ok(())
    }
}
