// SPDX-License-Identifier: AGPL-3.0
// Foundly Core - Durable key-value storage
//
// String keys to string values, the same shape a mobile async storage
// exposes. The file-backed store keeps everything in one local JSON file.

use crate::types::AppError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Async string key-value storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key was never set
    async fn get_item(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Write a value, replacing any previous one
    async fn set_item(&self, key: &str, value: String) -> Result<(), AppError>;

    /// Delete a value; removing a missing key is not an error
    async fn remove_item(&self, key: &str) -> Result<(), AppError>;
}

/// Volatile store, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing values
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), AppError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), AppError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// File-based store: one JSON object of key to value, rewritten on every change
pub struct FileStore {
    entries: RwLock<HashMap<String, String>>,
    file_path: PathBuf,
}

impl FileStore {
    /// Open the store in the platform config directory
    pub fn new() -> Result<Self, AppError> {
        Self::open(crate::config_dir()?.join("storage.json"))
    }

    /// Open the store at an explicit path, loading it if it exists
    pub fn open(file_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let file_path = file_path.into();

        let entries: HashMap<String, String> = if file_path.exists() {
            let content = fs::read_to_string(&file_path)
                .map_err(|e| AppError::FileIo(format!("Failed to read storage: {}", e)))?;

            serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse storage file, starting empty: {}", e);
                HashMap::new()
            })
        } else {
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    AppError::FileIo(format!("Failed to create storage dir: {}", e))
                })?;
            }
            HashMap::new()
        };

        tracing::debug!("Opened storage at {:?} with {} keys", file_path, entries.len());

        Ok(Self {
            entries: RwLock::new(entries),
            file_path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Persist entries to disk; caller holds the write lock
    async fn persist(&self, entries: &HashMap<String, String>) -> Result<(), AppError> {
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize storage: {}", e)))?;

        tokio::fs::write(&self.file_path, content)
            .await
            .map_err(|e| AppError::FileIo(format!("Failed to write storage: {}", e)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), AppError> {
        let mut entries = self.entries.write().await;
        let previous = entries.insert(key.to_string(), value);

        if let Err(e) = self.persist(&entries).await {
            // Keep the cache in step with what is on disk
            match previous {
                Some(previous) => entries.insert(key.to_string(), previous),
                None => entries.remove(key),
            };
            tracing::error!("Failed to persist storage key {}: {}", key, e);
            return Err(e);
        }
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), AppError> {
        let mut entries = self.entries.write().await;
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };

        if let Err(e) = self.persist(&entries).await {
            entries.insert(key.to_string(), previous);
            tracing::error!("Failed to persist removal of key {}: {}", key, e);
            return Err(e);
        }
        Ok(())
    }
}
