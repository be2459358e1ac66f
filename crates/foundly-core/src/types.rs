// SPDX-License-Identifier: AGPL-3.0
// Foundly Core - Type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lost/found label assigned to an item for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Lost,
    Found,
}

impl Classification {
    /// Wire value, as stored in the override map
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lost => "lost",
            Self::Found => "found",
        }
    }

    /// Get display label for this classification
    pub fn label(&self) -> &'static str {
        match self {
            Self::Lost => "Lost",
            Self::Found => "Found",
        }
    }

    /// Match an already lower-cased value exactly
    pub(crate) fn from_exact(value: &str) -> Option<Self> {
        match value {
            "lost" => Some(Self::Lost),
            "found" => Some(Self::Found),
            _ => None,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_exact(&s.trim().to_lowercase())
            .ok_or_else(|| AppError::InvalidConfig(format!("Unknown classification: {}", s)))
    }
}

/// Which classifications a listing should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Lost,
    Found,
}

impl TypeFilter {
    /// Check if an item with this classification should be shown
    pub fn should_show(&self, classification: Classification) -> bool {
        match self {
            Self::All => true,
            Self::Lost => classification == Classification::Lost,
            Self::Found => classification == Classification::Found,
        }
    }
}

impl FromStr for TypeFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "lost" => Ok(Self::Lost),
            "found" => Ok(Self::Found),
            _ => Err(AppError::InvalidConfig(format!("Unknown filter: {}", s))),
        }
    }
}

/// Listing sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Most recently posted first
    #[default]
    Newest,
    Oldest,
    /// Alphabetical by item name, case-insensitive
    Name,
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "name" => Ok(Self::Name),
            _ => Err(AppError::InvalidConfig(format!("Unknown sort order: {}", s))),
        }
    }
}

/// Storage key the override map is persisted under
pub const DEFAULT_OVERRIDE_KEY: &str = "foundly_item_type_map";

/// Application settings (GUI-agnostic)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Quiet period before a typed search is issued
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    /// Filter applied when a listing first opens
    #[serde(default)]
    pub default_filter: TypeFilter,
    /// Sort applied when a listing first opens
    #[serde(default)]
    pub default_sort: SortOrder,
    /// Key-value storage key for the override map
    #[serde(default = "default_override_key")]
    pub override_key: String,
}

fn default_search_debounce_ms() -> u64 {
    500
}

fn default_override_key() -> String {
    DEFAULT_OVERRIDE_KEY.to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            search_debounce_ms: default_search_debounce_ms(),
            default_filter: TypeFilter::default(),
            default_sort: SortOrder::default(),
            override_key: default_override_key(),
        }
    }
}

impl AppSettings {
    pub fn search_debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.search_debounce_ms)
    }
}

/// Error types for the application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Item source error: {0}")]
    Source(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileIo(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.search_debounce_ms, 500);
        assert_eq!(settings.default_filter, TypeFilter::All);
        assert_eq!(settings.override_key, "foundly_item_type_map");
        assert_eq!(settings.search_debounce(), std::time::Duration::from_millis(500));
    }

    #[test]
    fn test_settings_fill_missing_fields() {
        let settings: AppSettings = serde_json::from_str(r#"{"defaultSort":"name"}"#).unwrap();
        assert_eq!(settings.default_sort, SortOrder::Name);
        assert_eq!(settings.search_debounce_ms, 500);
    }

    #[test]
    fn test_classification_parsing() {
        assert_eq!(" LOST ".parse::<Classification>().unwrap(), Classification::Lost);
        assert_eq!("Found".parse::<Classification>().unwrap(), Classification::Found);
        assert!("stolen".parse::<Classification>().is_err());
    }

    #[test]
    fn test_classification_serde() {
        let json = serde_json::to_string(&Classification::Lost).unwrap();
        assert_eq!(json, "\"lost\"");
    }

    #[test]
    fn test_type_filter() {
        assert!(TypeFilter::All.should_show(Classification::Lost));
        assert!(TypeFilter::Found.should_show(Classification::Found));
        assert!(!TypeFilter::Found.should_show(Classification::Lost));
    }
}
