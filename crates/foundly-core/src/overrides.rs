// SPDX-License-Identifier: AGPL-3.0
// Foundly Core - Local classification overrides
//
// The override map is stored as one JSON object under a fixed key.
// Writes are read-modify-write and serialized so concurrent calls never
// merge from a stale snapshot.

use crate::storage::KeyValueStore;
use crate::types::{AppError, Classification, DEFAULT_OVERRIDE_KEY};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Item id to user-chosen classification
pub type OverrideMap = HashMap<String, Classification>;

/// Persisted user overrides backed by a key-value store
pub struct OverrideStore {
    storage: Arc<dyn KeyValueStore>,
    key: String,
    write_lock: Mutex<()>,
}

impl OverrideStore {
    /// Create a store using the default storage key
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(storage, DEFAULT_OVERRIDE_KEY)
    }

    pub fn with_key(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Load the override map.
    ///
    /// Never fails: a missing, unreadable or corrupt map loads as empty and
    /// unrecognised entries are skipped.
    pub async fn load(&self) -> OverrideMap {
        let raw = match self.storage.get_item(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return OverrideMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read item type overrides: {}", e);
                return OverrideMap::new();
            }
        };

        let entries = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(entries)) => entries,
            Ok(_) => {
                tracing::warn!("Item type overrides are not a JSON object, ignoring");
                return OverrideMap::new();
            }
            Err(e) => {
                tracing::warn!("Failed to parse item type overrides, ignoring: {}", e);
                return OverrideMap::new();
            }
        };

        entries
            .into_iter()
            .filter_map(|(id, value)| {
                let classification = value.as_str().and_then(Classification::from_exact);
                if classification.is_none() {
                    tracing::warn!("Dropping override for item {} with value {}", id, value);
                }
                classification.map(|c| (id, c))
            })
            .collect()
    }

    /// Get the override for a single item
    pub async fn get_override(&self, id: &str) -> Option<Classification> {
        self.load().await.get(id).copied()
    }

    /// Record a user classification for an item and persist it
    pub async fn set_override(&self, id: &str, classification: Classification) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;

        let mut map = self.load().await;
        map.insert(id.to_string(), classification);
        self.persist(&map).await?;

        tracing::info!("Item {} marked as {}", id, classification);
        Ok(())
    }

    /// Remove an item's override, returning whether one existed
    pub async fn clear_override(&self, id: &str) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;

        let mut map = self.load().await;
        if map.remove(id).is_none() {
            return Ok(false);
        }
        self.persist(&map).await?;

        tracing::info!("Cleared override for item {}", id);
        Ok(true)
    }

    async fn persist(&self, map: &OverrideMap) -> Result<(), AppError> {
        let content = serde_json::to_string(map).map_err(|e| {
            AppError::Serialization(format!("Failed to serialize overrides: {}", e))
        })?;

        self.storage.set_item(&self.key, content).await.map_err(|e| {
            tracing::error!("Failed to persist item type overrides: {}", e);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::time::Duration;

    fn memory_store() -> (Arc<MemoryStore>, OverrideStore) {
        let storage = Arc::new(MemoryStore::new());
        let store = OverrideStore::new(storage.clone());
        (storage, store)
    }

    #[tokio::test]
    async fn test_persistence_roundtrip_merges() {
        let (_, store) = memory_store();

        store.set_override("42", Classification::Lost).await.unwrap();
        let map = store.load().await;
        assert_eq!(map.get("42"), Some(&Classification::Lost));

        store.set_override("7", Classification::Found).await.unwrap();
        let map = store.load().await;
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("42"), Some(&Classification::Lost));
        assert_eq!(map.get("7"), Some(&Classification::Found));
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let (_, store) = memory_store();
        store.set_override("1", Classification::Lost).await.unwrap();
        store.set_override("1", Classification::Found).await.unwrap();
        assert_eq!(store.get_override("1").await, Some(Classification::Found));
    }

    #[tokio::test]
    async fn test_stored_format() {
        let (storage, store) = memory_store();
        store.set_override("42", Classification::Lost).await.unwrap();
        let raw = storage.get_item(DEFAULT_OVERRIDE_KEY).await.unwrap().unwrap();
        assert_eq!(raw, r#"{"42":"lost"}"#);
    }

    #[tokio::test]
    async fn test_corrupt_storage_loads_empty() {
        let storage = Arc::new(MemoryStore::with_entries([(DEFAULT_OVERRIDE_KEY, "not json{")]));
        let store = OverrideStore::new(storage);
        assert!(store.load().await.is_empty());

        // The next write resets the map
        store.set_override("3", Classification::Lost).await.unwrap();
        assert_eq!(store.load().await.len(), 1);
    }

    #[tokio::test]
    async fn test_non_object_and_bad_entries() {
        let storage = Arc::new(MemoryStore::with_entries([(DEFAULT_OVERRIDE_KEY, "[1,2]")]));
        assert!(OverrideStore::new(storage).load().await.is_empty());

        let storage = Arc::new(MemoryStore::with_entries([(
            DEFAULT_OVERRIDE_KEY,
            r#"{"1":"lost","2":"stolen","3":true,"4":"found"}"#,
        )]));
        let map = OverrideStore::new(storage).load().await;
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("4"), Some(&Classification::Found));
    }

    #[tokio::test]
    async fn test_clear_override() {
        let (_, store) = memory_store();
        store.set_override("5", Classification::Lost).await.unwrap();
        assert!(store.clear_override("5").await.unwrap());
        assert!(!store.clear_override("5").await.unwrap());
        assert_eq!(store.get_override("5").await, None);
    }

    #[tokio::test]
    async fn test_custom_key() {
        let storage = Arc::new(MemoryStore::new());
        let store = OverrideStore::with_key(storage.clone(), "other_key");
        store.set_override("1", Classification::Lost).await.unwrap();
        assert!(storage.get_item(DEFAULT_OVERRIDE_KEY).await.unwrap().is_none());
        assert!(storage.get_item("other_key").await.unwrap().is_some());
    }

    /// Storage whose reads and writes yield to the scheduler, widening the
    /// window for interleaved read-modify-write cycles
    struct SlowStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl KeyValueStore for SlowStore {
        async fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.inner.get_item(key).await
        }

        async fn set_item(&self, key: &str, value: String) -> Result<(), AppError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.inner.set_item(key, value).await
        }

        async fn remove_item(&self, key: &str) -> Result<(), AppError> {
            self.inner.remove_item(key).await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_overrides_are_serialized() {
        let store = Arc::new(OverrideStore::new(Arc::new(SlowStore {
            inner: MemoryStore::new(),
        })));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let classification = if i % 2 == 0 {
                        Classification::Lost
                    } else {
                        Classification::Found
                    };
                    store.set_override(&i.to_string(), classification).await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let map = store.load().await;
        assert_eq!(map.len(), 16);
        assert_eq!(map.get("3"), Some(&Classification::Found));
    }

    struct FailingStore;

    #[async_trait]
    impl KeyValueStore for FailingStore {
        async fn get_item(&self, _key: &str) -> Result<Option<String>, AppError> {
            Err(AppError::Storage("unavailable".to_string()))
        }

        async fn set_item(&self, _key: &str, _value: String) -> Result<(), AppError> {
            Err(AppError::Storage("quota exceeded".to_string()))
        }

        async fn remove_item(&self, _key: &str) -> Result<(), AppError> {
            Err(AppError::Storage("unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_storage_failures() {
        let store = OverrideStore::new(Arc::new(FailingStore));
        assert!(store.load().await.is_empty());
        let err = store.set_override("1", Classification::Lost).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }
}
