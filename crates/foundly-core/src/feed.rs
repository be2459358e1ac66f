// SPDX-License-Identifier: AGPL-3.0
// Foundly Core - Item feed
//
// Owns a listing's items and the latest override map, and produces the
// classified, filtered and sorted view a frontend renders. Items and
// overrides are loaded concurrently; an override load that resolves after
// a newer one has been applied is discarded.

use crate::classify::classify;
use crate::item::{parse_items, ItemRecord};
use crate::overrides::{OverrideMap, OverrideStore};
use crate::types::{AppError, AppSettings, Classification, SortOrder, TypeFilter};
use async_trait::async_trait;
use std::cmp::Reverse;
use std::path::PathBuf;

/// Where listing items come from
#[async_trait]
pub trait ItemSource: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<ItemRecord>, AppError>;
}

/// Item source reading a JSON export of the backend's item list
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ItemSource for JsonFileSource {
    async fn fetch_items(&self) -> Result<Vec<ItemRecord>, AppError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::Source(format!("Failed to read items from {:?}: {}", self.path, e))
        })?;
        parse_items(&content)
    }
}

/// Search, filter and sort applied to a listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedQuery {
    pub filter: TypeFilter,
    /// Case-insensitive match against name and description
    pub search: String,
    /// Exact category, case-insensitive
    pub category: Option<String>,
    pub sort: SortOrder,
}

impl FeedQuery {
    /// Query a listing opens with
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            filter: settings.default_filter,
            sort: settings.default_sort,
            ..Self::default()
        }
    }
}

/// An item with its resolved classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedEntry<'a> {
    pub item: &'a ItemRecord,
    pub classification: Classification,
}

/// Identifies one in-flight override load
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// Items plus overrides for one listing
#[derive(Debug, Default)]
pub struct ItemFeed {
    items: Vec<ItemRecord>,
    overrides: OverrideMap,
    issued: u64,
    applied: u64,
}

impl ItemFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[ItemRecord] {
        &self.items
    }

    pub fn overrides(&self) -> &OverrideMap {
        &self.overrides
    }

    /// Replace the item list
    pub fn set_items(&mut self, items: Vec<ItemRecord>) {
        self.items = items;
    }

    /// Start an override load; pass the ticket back to `apply_overrides`
    pub fn begin_override_load(&mut self) -> LoadTicket {
        self.issued += 1;
        LoadTicket(self.issued)
    }

    /// Apply a loaded override map unless a newer one is already applied.
    ///
    /// Returns whether the map was applied.
    pub fn apply_overrides(&mut self, ticket: LoadTicket, overrides: OverrideMap) -> bool {
        if ticket.0 < self.applied {
            tracing::debug!(
                "Discarding stale override load {} (applied {})",
                ticket.0,
                self.applied
            );
            return false;
        }
        self.applied = ticket.0;
        self.overrides = overrides;
        true
    }

    /// Fetch items and overrides concurrently and apply both.
    ///
    /// The override load is best-effort; an item fetch error is returned
    /// and leaves the previous items in place.
    pub async fn refresh(
        &mut self,
        source: &dyn ItemSource,
        store: &OverrideStore,
    ) -> Result<usize, AppError> {
        let ticket = self.begin_override_load();
        let (items, overrides) = tokio::join!(source.fetch_items(), store.load());

        self.apply_overrides(ticket, overrides);

        let items = items.map_err(|e| {
            tracing::error!("Failed to load items: {}", e);
            e
        })?;
        tracing::info!(
            "Loaded {} items with {} overrides",
            items.len(),
            self.overrides.len()
        );
        self.items = items;
        Ok(self.items.len())
    }

    /// Reload only the override map, e.g. when a listing regains focus
    pub async fn refresh_overrides(&mut self, store: &OverrideStore) -> bool {
        let ticket = self.begin_override_load();
        let overrides = store.load().await;
        self.apply_overrides(ticket, overrides)
    }

    /// Persist a user override and re-resolve with it immediately
    pub async fn set_override(
        &mut self,
        store: &OverrideStore,
        id: &str,
        classification: Classification,
    ) -> Result<(), AppError> {
        store.set_override(id, classification).await?;

        // Loads issued before this write may not contain it
        self.issued += 1;
        self.applied = self.issued;
        self.overrides.insert(id.to_string(), classification);
        Ok(())
    }

    /// Classify a single item with the current overrides
    pub fn classify(&self, item: &ItemRecord) -> Classification {
        classify(item, &self.overrides)
    }

    /// Find an item by id
    pub fn find(&self, id: &str) -> Option<&ItemRecord> {
        self.items.iter().find(|item| item.id().as_deref() == Some(id))
    }

    /// Classified, filtered and sorted items
    pub fn view(&self, query: &FeedQuery) -> Vec<FeedEntry<'_>> {
        let search = query.search.trim().to_lowercase();
        let category = query
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_lowercase);

        let mut entries: Vec<FeedEntry<'_>> = self
            .items
            .iter()
            .map(|item| FeedEntry {
                item,
                classification: self.classify(item),
            })
            .filter(|entry| query.filter.should_show(entry.classification))
            .filter(|entry| search.is_empty() || matches_search(entry.item, &search))
            .filter(|entry| match &category {
                Some(category) => entry
                    .item
                    .category()
                    .is_some_and(|c| c.trim().to_lowercase() == *category),
                None => true,
            })
            .collect();

        match query.sort {
            SortOrder::Newest => entries.sort_by_key(|entry| {
                let posted = entry.item.posted_at();
                (posted.is_none(), Reverse(posted))
            }),
            SortOrder::Oldest => entries.sort_by_key(|entry| {
                let posted = entry.item.posted_at();
                (posted.is_none(), posted)
            }),
            SortOrder::Name => entries.sort_by_key(|entry| {
                entry.item.name().unwrap_or_default().to_lowercase()
            }),
        }

        entries
    }
}

fn matches_search(item: &ItemRecord, search: &str) -> bool {
    [item.name(), item.description()]
        .into_iter()
        .flatten()
        .any(|text| text.to_lowercase().contains(search))
}
