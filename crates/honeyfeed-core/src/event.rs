//! The event record flowing through the pipeline.
//!
//! An [`Event`] is a flat bag of values addressed by dotted keys such as
//! `source.country.isocode`. It is created by the upstream source, annotated in
//! place by the enrichment stage, and read-only afterwards. Stages hand events
//! off by value so exactly one stage owns an event at a time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event category field.
pub const CATEGORY: &str = "category";

/// Source IP address field, set by the upstream source.
pub const SOURCE_IP: &str = "source-ip";

/// ISO country code of the source IP, set by enrichment.
pub const SOURCE_COUNTRY_ISOCODE: &str = "source.country.isocode";

/// A structured security event keyed by dotted paths.
///
/// Serializes as a flat JSON object with keys in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event {
    fields: BTreeMap<String, Value>,
}

impl Event {
    /// Create an empty event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(path, value);
        self
    }

    /// Value stored at `path`, if any.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.fields.get(path)
    }

    /// String value stored at `path`.
    ///
    /// Returns the empty string when the field is absent or not a string.
    pub fn get_str(&self, path: &str) -> &str {
        self.fields
            .get(path)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Store `value` at `path`, replacing any previous value.
    pub fn set(&mut self, path: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(path.into(), value.into());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.fields.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Event category, empty when unset.
    pub fn category(&self) -> &str {
        self.get_str(CATEGORY)
    }

    /// Resolved source country code, empty when unset.
    pub fn country_code(&self) -> &str {
        self.get_str(SOURCE_COUNTRY_ISOCODE)
    }
}

impl<K, V> FromIterator<(K, V)> for Event
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
