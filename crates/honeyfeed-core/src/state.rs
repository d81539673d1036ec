//! Rolling aggregate state shared between the aggregator and sessions.
//!
//! ## Publish ordering
//!
//! The aggregator mutates state and hands the resulting broadcasts to the
//! [`BroadcastSink`] while holding the publish lock. A session attaching to the
//! hub registers and takes its initial snapshot under the same lock. Since the
//! hub processes its commands in FIFO order, a session's snapshot reflects
//! exactly the broadcasts queued before its registration and it receives
//! exactly the broadcasts queued after.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};

use crate::collection::BoundedCollection;
use crate::defaults::HISTORY_CAPACITY;
use crate::event::Event;
use crate::message::Envelope;

/// Per-country hit counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotCountry {
    pub isocode: String,
    pub count: u64,
    pub last: DateTime<Utc>,
}

impl HotCountry {
    /// Counter for a first sighting.
    pub fn first_seen(isocode: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            isocode: isocode.into(),
            count: 1,
            last: at,
        }
    }

    /// Record another sighting.
    pub fn hit(&mut self, at: DateTime<Utc>) {
        self.count += 1;
        self.last = at;
    }
}

/// Destination for outbound broadcast messages.
#[async_trait]
pub trait BroadcastSink: Send + Sync {
    /// Deliver `envelope` to every live subscriber. Best effort.
    async fn broadcast(&self, envelope: Envelope);
}

/// Event history and country counters.
///
/// Readers get snapshots and lengths directly. Mutation goes through the
/// [`PublishGuard`] returned by [`publish_lock`](Self::publish_lock).
#[derive(Debug)]
pub struct TelemetryState {
    history: BoundedCollection<Event>,
    hot_countries: BoundedCollection<HotCountry>,
    publish: Mutex<()>,
}

impl TelemetryState {
    pub fn new() -> Self {
        Self::with_history_limit(HISTORY_CAPACITY)
    }

    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            history: BoundedCollection::with_limit(limit),
            hot_countries: BoundedCollection::unbounded(),
            publish: Mutex::new(()),
        }
    }

    /// Acquire the publish lock.
    pub async fn publish_lock(&self) -> PublishGuard<'_> {
        PublishGuard {
            state: self,
            _lock: self.publish.lock().await,
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Events currently retained, oldest first.
    pub fn history_snapshot(&self) -> Vec<Event> {
        self.history.snapshot()
    }

    pub fn history_limit(&self) -> Option<usize> {
        self.history.limit()
    }

    pub fn hot_countries_len(&self) -> usize {
        self.hot_countries.len()
    }

    /// Counters in first-seen order.
    pub fn hot_countries_snapshot(&self) -> Vec<HotCountry> {
        self.hot_countries.snapshot()
    }
}

impl Default for TelemetryState {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive publish access to a [`TelemetryState`].
pub struct PublishGuard<'a> {
    state: &'a TelemetryState,
    _lock: MutexGuard<'a, ()>,
}

impl PublishGuard<'_> {
    pub fn history(&self) -> &BoundedCollection<Event> {
        &self.state.history
    }

    pub fn hot_countries(&self) -> &BoundedCollection<HotCountry> {
        &self.state.hot_countries
    }

    /// Append to the history, returning the evicted oldest event if any.
    pub fn record_event(&self, event: Event) -> Option<Event> {
        self.state.history.append(event)
    }

    /// Count a sighting of `isocode`. Returns `true` for a first sighting.
    pub fn record_country(&self, isocode: &str, at: DateTime<Utc>) -> bool {
        // Country codes are a small set; a linear scan keeps first-seen order.
        let mut found = false;
        self.state.hot_countries.range_mut(|hc| {
            if hc.isocode != isocode {
                return true;
            }
            hc.hit(at);
            found = true;
            false
        });
        if !found {
            self.state
                .hot_countries
                .append(HotCountry::first_seen(isocode, at));
        }
        !found
    }
}

impl std::fmt::Debug for PublishGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishGuard").finish_non_exhaustive()
    }
}
