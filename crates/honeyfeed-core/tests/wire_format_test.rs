//! Wire format of the messages sessions receive.

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use honeyfeed_core::event::{CATEGORY, SOURCE_COUNTRY_ISOCODE};
use honeyfeed_core::{Envelope, Event, MessageKind, Metadata, TelemetryState};

fn wire(envelope: &Envelope) -> Value {
    serde_json::from_str(&envelope.to_json().unwrap()).unwrap()
}

#[tokio::test]
async fn test_events_message_lists_history_oldest_first() {
    let state = TelemetryState::with_history_limit(2);
    let publish = state.publish_lock().await;
    for seq in 0..3 {
        publish.record_event(Event::new().with(CATEGORY, "ssh").with("seq", seq));
    }

    let envelope = Envelope::new(MessageKind::Events, publish.history()).unwrap();
    assert_eq!(
        wire(&envelope),
        json!({
            "type": "events",
            "data": [
                {"category": "ssh", "seq": 1},
                {"category": "ssh", "seq": 2}
            ]
        })
    );
}

#[tokio::test]
async fn test_hot_countries_message_shape() {
    let state = TelemetryState::new();
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let publish = state.publish_lock().await;
    publish.record_country("DE", at);

    let envelope = Envelope::new(MessageKind::HotCountries, publish.hot_countries()).unwrap();
    assert_eq!(
        wire(&envelope),
        json!({
            "type": "hot_countries",
            "data": [{"isocode": "DE", "count": 1, "last": "2024-05-01T12:00:00Z"}]
        })
    );
}

#[test]
fn test_event_message_carries_enriched_fields() {
    let event = Event::new()
        .with(CATEGORY, "http")
        .with(SOURCE_COUNTRY_ISOCODE, "FR");

    let envelope = Envelope::new(MessageKind::Event, &event).unwrap();
    let value = wire(&envelope);
    assert_eq!(value["type"], "event");
    assert_eq!(value["data"]["source.country.isocode"], "FR");
}

#[test]
fn test_metadata_message_fields() {
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let metadata = Metadata::new(start, "1.2.3", "v1.2.3", "0123456789abcdef");

    let envelope = Envelope::new(MessageKind::Metadata, &metadata).unwrap();
    let value = wire(&envelope);
    assert_eq!(value["type"], "metadata");
    assert_eq!(value["data"]["version"], "1.2.3");
    assert_eq!(value["data"]["release_tag"], "v1.2.3");
    assert_eq!(value["data"]["short_commit_id"], "0123456");
    assert_eq!(value["data"]["start"], "2024-01-02T03:04:05Z");
}
