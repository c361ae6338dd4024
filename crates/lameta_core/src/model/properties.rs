//! Typed property bag shared by projects, sessions, people and files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One stored field value.
///
/// Multi-value fields (language lists, keyword lists) arrive as arrays and
/// read back as `;`-joined text, the same shape lameta stores on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Single text or date value.
    Text(String),
    /// Multi-value field.
    List(Vec<String>),
}

impl FieldValue {
    /// Returns the value as text, joining lists with `;`.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::List(values) => values.join(";"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

/// Key-ordered property bag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, FieldValue>);

impl Properties {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts or replaces one value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns the raw text of `key`, or an empty string when absent.
    pub fn text(&self, key: &str) -> String {
        self.0.get(key).map(FieldValue::as_text).unwrap_or_default()
    }

    /// Returns the trimmed text of `key`, or `default` when absent or blank.
    pub fn text_or(&self, key: &str, default: &str) -> String {
        let value = self.text(key);
        let trimmed = value.trim();
        if trimmed.is_empty() {
            default.to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// True when `key` holds non-blank text.
    pub fn has_value(&self, key: &str) -> bool {
        !self.text(key).trim().is_empty()
    }

    /// Trimmed text of `key` unless it is blank or `unspecified`.
    pub fn meaningful(&self, key: &str) -> Option<String> {
        let value = self.text(key);
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == "unspecified" {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Iterates keys and values in key order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// True when no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Self::new();
        for (key, value) in iter {
            properties.insert(key, value);
        }
        properties
    }
}
