// SPDX-License-Identifier: AGPL-3.0
// Foundly Core - Lost/found type resolution
//
// Decides whether an item is shown as lost or found. Signals are tried in a
// fixed precedence order and the first one that decides wins; anything
// malformed is treated as absent.

use crate::item::ItemRecord;
use crate::types::Classification;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Legacy type fields, in the order they are consulted
const ALTERNATE_TYPE_FIELDS: [&str; 3] = ["itemType", "postType", "listingType"];

static LOST_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(lost|missing|misplaced)\b").expect("valid lost pattern"));

static FOUND_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(found|recovered|picked\s*up)\b").expect("valid found pattern"));

/// The precedence rule that produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// User-set local override
    Override,
    /// Exact `type` field
    CanonicalField,
    /// First non-empty of `itemType`, `postType`, `listingType`
    AlternateField(&'static str),
    /// `lost` or `isLost` set to true
    LostFlag,
    /// Keyword found in highlight or description
    Keyword,
    /// Nothing decided
    Default,
}

impl Rule {
    pub fn describe(&self) -> String {
        match self {
            Self::Override => "local override".to_string(),
            Self::CanonicalField => "type field".to_string(),
            Self::AlternateField(name) => format!("{} field", name),
            Self::LostFlag => "lost flag".to_string(),
            Self::Keyword => "description keywords".to_string(),
            Self::Default => "default".to_string(),
        }
    }
}

/// A classification together with the rule that decided it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub classification: Classification,
    pub rule: Rule,
}

impl Resolution {
    fn new(classification: Classification, rule: Rule) -> Self {
        Self {
            classification,
            rule,
        }
    }
}

/// Classify an item as lost or found.
///
/// Total over every record: never panics and always returns a value.
pub fn classify(item: &ItemRecord, overrides: &HashMap<String, Classification>) -> Classification {
    resolve(item, overrides).classification
}

/// Classify an item and report which rule decided it
pub fn resolve(item: &ItemRecord, overrides: &HashMap<String, Classification>) -> Resolution {
    if let Some(local) = item.id().and_then(|id| overrides.get(&id).copied()) {
        return Resolution::new(local, Rule::Override);
    }

    if let Some(canonical) = item.str_field("type").and_then(Classification::from_exact) {
        return Resolution::new(canonical, Rule::CanonicalField);
    }

    // Only the first populated alternate field is consulted, even when its
    // value is not a recognised type.
    if let Some((name, value)) = ALTERNATE_TYPE_FIELDS.iter().find_map(|name| {
        item.str_field(name)
            .filter(|value| !value.is_empty())
            .map(|value| (*name, value))
    }) {
        if let Some(alternate) = Classification::from_exact(&value.to_lowercase()) {
            return Resolution::new(alternate, Rule::AlternateField(name));
        }
    }

    if item.bool_field("lost") == Some(true) || item.bool_field("isLost") == Some(true) {
        return Resolution::new(Classification::Lost, Rule::LostFlag);
    }

    if let Some(from_text) = scan_keywords(item) {
        return Resolution::new(from_text, Rule::Keyword);
    }

    Resolution::new(Classification::Found, Rule::Default)
}

/// Classify every item in a render pass
pub fn classify_all<'a>(
    items: &'a [ItemRecord],
    overrides: &HashMap<String, Classification>,
) -> Vec<(&'a ItemRecord, Classification)> {
    items
        .iter()
        .map(|item| (item, classify(item, overrides)))
        .collect()
}

fn scan_keywords(item: &ItemRecord) -> Option<Classification> {
    let text = format!(
        "{} {}",
        item.highlight().unwrap_or_default(),
        item.description().unwrap_or_default()
    )
    .to_lowercase();
    let text = text.trim();

    if LOST_WORDS.is_match(text) {
        Some(Classification::Lost)
    } else if FOUND_WORDS.is_match(text) {
        Some(Classification::Found)
    } else {
        None
    }
}
