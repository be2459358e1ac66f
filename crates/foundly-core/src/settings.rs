// SPDX-License-Identifier: AGPL-3.0
// Foundly Core - Settings persistence
//
// Settings are stored in a local JSON file next to the key-value storage.

use crate::types::{AppError, AppSettings};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// In-memory cache of settings, persisted to disk on changes
pub struct SettingsStore {
    settings: RwLock<AppSettings>,
    file_path: PathBuf,
}

impl SettingsStore {
    /// Create a new settings store in the platform config directory
    pub fn new() -> Result<Self, AppError> {
        Self::open(crate::config_dir()?.join("settings.json"))
    }

    /// Open settings at an explicit path, loading from disk if available
    pub fn open(file_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let file_path = file_path.into();
        tracing::info!("Settings file path: {:?}", file_path);

        let settings = if file_path.exists() {
            let content = fs::read_to_string(&file_path)
                .map_err(|e| AppError::FileIo(format!("Failed to read settings: {}", e)))?;

            serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse settings, using defaults: {}", e);
                AppSettings::default()
            })
        } else {
            tracing::info!("No settings file found, using defaults");
            AppSettings::default()
        };

        let store = Self {
            settings: RwLock::new(settings),
            file_path,
        };

        if !store.file_path.exists() {
            tracing::info!("Creating initial settings file");
            store.persist()?;
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Persist settings to disk
    fn persist(&self) -> Result<(), AppError> {
        let settings = self.get();

        let content = serde_json::to_string_pretty(&settings)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize settings: {}", e)))?;

        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::FileIo(format!("Failed to create config dir: {}", e)))?;
        }

        fs::write(&self.file_path, content)
            .map_err(|e| AppError::FileIo(format!("Failed to write settings: {}", e)))?;

        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> AppSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Update settings and persist to disk
    pub fn update(&self, new_settings: AppSettings) -> Result<(), AppError> {
        if new_settings.override_key.trim().is_empty() {
            return Err(AppError::InvalidConfig(
                "Override storage key must not be empty".to_string(),
            ));
        }

        {
            let mut settings = self
                .settings
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *settings = new_settings;
        }

        let result = self.persist();
        match &result {
            Ok(()) => tracing::info!("Settings persisted successfully"),
            Err(e) => tracing::error!("Failed to persist settings: {}", e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SortOrder, TypeFilter};

    #[test]
    fn test_creates_initial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.get(), AppSettings::default());
    }

    #[test]
    fn test_update_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::open(&path).unwrap();
        let mut settings = store.get();
        settings.default_filter = TypeFilter::Lost;
        settings.default_sort = SortOrder::Oldest;
        settings.search_debounce_ms = 250;
        store.update(settings.clone()).unwrap();

        let reopened = SettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get(), settings);
    }

    #[test]
    fn test_corrupt_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "][").unwrap();

        let store = SettingsStore::open(&path).unwrap();
        assert_eq!(store.get().search_debounce_ms, 500);
    }

    #[test]
    fn test_rejects_empty_override_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open(dir.path().join("settings.json")).unwrap();
        let settings = AppSettings {
            override_key: " ".to_string(),
            ..AppSettings::default()
        };
        assert!(store.update(settings).is_err());
        assert_eq!(store.get().override_key, "foundly_item_type_map");
    }
}
