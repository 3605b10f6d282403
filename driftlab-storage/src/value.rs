//! Values held by the remote store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field map stored under a single hash entry.
pub type FieldMap = BTreeMap<String, String>;

/// A value stored under a map field.
///
/// Serialized untagged: text becomes a JSON string and a field map becomes a
/// JSON object, which is also how it shows up in step observations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Text(String),
    Fields(FieldMap),
}

impl StoredValue {
    pub fn text(value: impl Into<String>) -> Self {
        StoredValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StoredValue::Text(s) => Some(s),
            StoredValue::Fields(_) => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            StoredValue::Text(s) => Some(s),
            StoredValue::Fields(_) => None,
        }
    }

    /// Approximate resident size in bytes.
    pub fn approx_bytes(&self) -> u64 {
        match self {
            StoredValue::Text(s) => s.len() as u64,
            StoredValue::Fields(fields) => fields
                .iter()
                .map(|(k, v)| (k.len() + v.len()) as u64)
                .sum(),
        }
    }
}

impl From<String> for StoredValue {
    fn from(value: String) -> Self {
        StoredValue::Text(value)
    }
}

impl From<&str> for StoredValue {
    fn from(value: &str) -> Self {
        StoredValue::Text(value.to_string())
    }
}

impl From<FieldMap> for StoredValue {
    fn from(value: FieldMap) -> Self {
        StoredValue::Fields(value)
    }
}
