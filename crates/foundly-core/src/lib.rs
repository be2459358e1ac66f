// SPDX-License-Identifier: AGPL-3.0
// Foundly Core - Shared logic for all frontends
//
// This crate provides:
// - Classification, AppSettings and AppError types
// - ItemRecord, a tolerant view over backend item JSON
// - classify, the lost/found type resolver
// - OverrideStore for persistent user overrides
// - KeyValueStore with memory and file backends
// - ItemFeed for classified, filtered listings
// - SearchDebouncer for search-as-you-type
// - SettingsStore for persistent settings
//
// Frontend-specific code lives in separate crates.

pub mod classify;
pub mod feed;
pub mod item;
pub mod overrides;
pub mod search;
pub mod settings;
pub mod storage;
pub mod types;

// Re-export commonly used items
pub use classify::{classify, classify_all, resolve, Resolution, Rule};
pub use feed::{FeedEntry, FeedQuery, ItemFeed, ItemSource, JsonFileSource, LoadTicket};
pub use item::{parse_items, ItemRecord};
pub use overrides::{OverrideMap, OverrideStore};
pub use search::SearchDebouncer;
pub use settings::SettingsStore;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use types::{AppError, AppSettings, Classification, SortOrder, TypeFilter, DEFAULT_OVERRIDE_KEY};

use std::path::PathBuf;

/// Platform config directory, created if missing
pub fn config_dir() -> Result<PathBuf, AppError> {
    let config_dir = directories::ProjectDirs::from("com", "foundly", "foundly")
        .ok_or_else(|| AppError::FileIo("Could not determine config directory".to_string()))?
        .config_dir()
        .to_path_buf();

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| AppError::FileIo(format!("Failed to create config dir: {}", e)))?;

    Ok(config_dir)
}
