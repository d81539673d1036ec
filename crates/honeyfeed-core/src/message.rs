//! Outbound message envelope and process metadata.
//!
//! Every message pushed to a session is a JSON object with exactly two keys:
//!
//! ```text
//! {"type": "hot_countries", "data": [{"isocode": "US", "count": 1, "last": "..."}]}
//! ```
//!
//! | type | data |
//! |------|------|
//! | `metadata` | [`Metadata`] |
//! | `events` | event history at attach time |
//! | `hot_countries` | country counters (at attach time or after an update) |
//! | `event` | single event |

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::Result;

/// Message type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Metadata,
    Events,
    HotCountries,
    Event,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Metadata => "metadata",
            MessageKind::Events => "events",
            MessageKind::HotCountries => "hot_countries",
            MessageKind::Event => "event",
        }
    }
}

/// Immutable `{type, data}` message.
///
/// The payload is captured as a JSON value at construction, so later changes
/// to the source (a counter collection, say) never alter a built envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    kind: MessageKind,
    data: Value,
}

impl Envelope {
    pub fn new<T: Serialize + ?Sized>(kind: MessageKind, data: &T) -> Result<Self> {
        Ok(Self {
            kind,
            data: serde_json::to_value(data)?,
        })
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Wire representation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Process start time and build identifiers, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub start: DateTime<Utc>,
    pub version: String,
    pub release_tag: String,
    pub commit_id: String,
    pub short_commit_id: String,
}

impl Metadata {
    /// Build metadata; the short commit id is the first 7 characters of `commit_id`.
    pub fn new(
        start: DateTime<Utc>,
        version: impl Into<String>,
        release_tag: impl Into<String>,
        commit_id: impl Into<String>,
    ) -> Self {
        let commit_id = commit_id.into();
        let short_commit_id = commit_id.chars().take(7).collect();
        Self {
            start,
            version: version.into(),
            release_tag: release_tag.into(),
            commit_id,
            short_commit_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_wire_format() {
        let env = Envelope::new(MessageKind::HotCountries, &json!([{"isocode": "US"}])).unwrap();
        let parsed: Value = serde_json::from_str(&env.to_json().unwrap()).unwrap();
        assert_eq!(
            parsed,
            json!({"type": "hot_countries", "data": [{"isocode": "US"}]})
        );
        assert_eq!(parsed.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_kind_as_str_matches_serde() {
        for kind in [
            MessageKind::Metadata,
            MessageKind::Events,
            MessageKind::HotCountries,
            MessageKind::Event,
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        }
    }

    #[test]
    fn test_envelope_captures_payload_at_construction() {
        let mut counts = vec![1];
        let env = Envelope::new(MessageKind::Events, &counts).unwrap();
        counts.push(2);
        assert_eq!(env.data(), &json!([1]));
        assert_eq!(env.kind(), MessageKind::Events);
    }

    #[test]
    fn test_metadata_short_commit() {
        let meta = Metadata::new(Utc::now(), "0.1.0", "v0.1.0", "0123456789abcdef");
        assert_eq!(meta.short_commit_id, "0123456");

        let meta = Metadata::new(Utc::now(), "0.1.0", "", "abc");
        assert_eq!(meta.short_commit_id, "abc");
    }

    #[test]
    fn test_metadata_serializes_fields() {
        let meta = Metadata::new(Utc::now(), "0.1.0", "v0.1.0", "deadbeefcafe");
        let value = serde_json::to_value(&meta).unwrap();
        for key in ["start", "version", "release_tag", "commit_id", "short_commit_id"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
    }
}
