// SPDX-License-Identifier: AGPL-3.0
// Foundly Core - Item records
//
// Backend item shapes have drifted across versions, so records keep the raw
// JSON object and expose tolerant accessors. A field with the wrong JSON
// type reads as absent.

use crate::types::AppError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single lost/found item as delivered by the item source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRecord {
    fields: Map<String, Value>,
}

impl ItemRecord {
    /// Build a record from a JSON value, which must be an object
    pub fn from_value(value: Value) -> Result<Self, AppError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(AppError::Serialization(format!(
                "Item record must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Raw field value, if present
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Field value if it is a JSON string (possibly empty)
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    /// Field value if it is a JSON boolean
    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.field(name).and_then(Value::as_bool)
    }

    /// Stable identifier as a string; integer ids are rendered in decimal
    pub fn id(&self) -> Option<String> {
        match self.field("id")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.first_text(&["itemName", "title", "name"])
    }

    pub fn description(&self) -> Option<&str> {
        self.first_text(&["itemDescription", "description"])
    }

    pub fn highlight(&self) -> Option<&str> {
        self.first_text(&["itemHighlight", "highlight"])
    }

    pub fn category(&self) -> Option<&str> {
        self.first_text(&["itemCategory", "category"])
    }

    /// When the item was posted, from `date` + `time` or `createdAt`
    pub fn posted_at(&self) -> Option<NaiveDateTime> {
        if let Some(date) = self
            .str_field("date")
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
        {
            return match self
                .str_field("time")
                .and_then(|t| NaiveTime::parse_from_str(t.trim(), "%H:%M:%S").ok())
            {
                Some(time) => Some(date.and_time(time)),
                None => date.and_hms_opt(0, 0, 0),
            };
        }

        let created = self.str_field("createdAt")?.trim();
        DateTime::parse_from_rfc3339(created)
            .map(|dt| dt.naive_utc())
            .or_else(|_| NaiveDateTime::parse_from_str(created, "%Y-%m-%dT%H:%M:%S"))
            .ok()
    }

    fn first_text(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|name| self.str_field(name))
            .find(|s| !s.is_empty())
    }
}

impl TryFrom<Value> for ItemRecord {
    type Error = AppError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Parse an item list from a bare array or a `{items}` / `{data: {items}}` envelope
pub fn parse_items(content: &str) -> Result<Vec<ItemRecord>, AppError> {
    let value: Value = serde_json::from_str(content)?;

    let list = match value {
        Value::Array(list) => list,
        Value::Object(mut envelope) => {
            let items = match envelope.remove("data") {
                Some(Value::Object(mut data)) => data.remove("items"),
                Some(Value::Array(list)) => Some(Value::Array(list)),
                _ => envelope.remove("items"),
            };
            match items {
                Some(Value::Array(list)) => list,
                _ => {
                    return Err(AppError::Serialization(
                        "Expected an item array or an envelope with an items array".to_string(),
                    ))
                }
            }
        }
        other => {
            return Err(AppError::Serialization(format!(
                "Expected an item array, got {}",
                json_kind(&other)
            )))
        }
    };

    list.into_iter().map(ItemRecord::from_value).collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
