//! Results carried forward between workflow steps.

use crate::error::{BuildError, ExtractError};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Named values accumulated over a workflow run.
///
/// Keys are unique per run: merging never overwrites an existing key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedResult {
    values: BTreeMap<String, JsonValue>,
}

impl ExtractedResult {
    /// Creates an empty result set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, replacing nothing. Intended for building initial context.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.values.entry(key.into()).or_insert(value.into());
        self
    }

    /// Merges another result set into this one.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first key present in both; nothing is
    /// merged in that case.
    pub fn merge(&mut self, other: ExtractedResult) -> Result<(), ExtractError> {
        if let Some(key) = other.values.keys().find(|k| self.values.contains_key(*k)) {
            return Err(ExtractError::DuplicateKey { key: key.clone() });
        }
        self.values.extend(other.values);
        Ok(())
    }

    /// Returns the value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    /// Returns the value for a key as a string slice.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(JsonValue::as_str)
    }

    /// Returns the value for a key, or a build error if it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingResult`] if the key is absent.
    pub fn require(&self, key: &str) -> Result<&JsonValue, BuildError> {
        self.values.get(key).ok_or_else(|| BuildError::MissingResult {
            key: key.to_string(),
        })
    }

    /// Returns a string value, or a build error if it is missing or not a string.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] if the key is absent or not a string.
    pub fn require_str(&self, key: &str) -> Result<&str, BuildError> {
        self.require(key)?
            .as_str()
            .ok_or_else(|| BuildError::InvalidResult {
                key: key.to_string(),
                expected: "a string",
            })
    }

    /// Returns an array value, or a build error if it is missing or not an array.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] if the key is absent or not an array.
    pub fn require_array(&self, key: &str) -> Result<&Vec<JsonValue>, BuildError> {
        self.require(key)?
            .as_array()
            .ok_or_else(|| BuildError::InvalidResult {
                key: key.to_string(),
                expected: "an array",
            })
    }

    /// Returns true if the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
