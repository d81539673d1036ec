//! Aggregation stage: event history, per-country counters, and broadcasts.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{error, info, trace};

use honeyfeed_core::logging::{COMPONENT, ERROR_MSG, HISTORY_LEN, ISO_CODE};
use honeyfeed_core::{BroadcastSink, Envelope, Event, MessageKind, TelemetryState};

/// Folds filtered events into [`TelemetryState`] and broadcasts the results.
pub struct Aggregator {
    state: Arc<TelemetryState>,
    sink: Arc<dyn BroadcastSink>,
}

impl Aggregator {
    pub fn new(state: Arc<TelemetryState>, sink: Arc<dyn BroadcastSink>) -> Self {
        Self { state, sink }
    }

    /// Process one event.
    ///
    /// Appends it to the history and broadcasts it as `event`. When it carries
    /// a country code, the matching counter is incremented (or created) and the
    /// full counter set is broadcast as `hot_countries`.
    pub async fn process(&self, event: Event) {
        let publish = self.state.publish_lock().await;

        let code = event.country_code().to_string();
        let event_msg = Envelope::new(MessageKind::Event, &event);
        publish.record_event(event);
        trace!(
            { COMPONENT } = "aggregate",
            { HISTORY_LEN } = publish.history().len(),
            "Event appended"
        );
        self.emit(event_msg).await;

        if code.is_empty() {
            return;
        }

        if publish.record_country(&code, Utc::now()) {
            trace!({ COMPONENT } = "aggregate", { ISO_CODE } = %code, "New hot country");
        }

        self.emit(Envelope::new(MessageKind::HotCountries, publish.hot_countries()))
            .await;
    }

    async fn emit(&self, envelope: honeyfeed_core::Result<Envelope>) {
        match envelope {
            Ok(envelope) => self.sink.broadcast(envelope).await,
            Err(e) => error!(
                { COMPONENT } = "aggregate",
                { ERROR_MSG } = %e,
                "Failed to build broadcast message"
            ),
        }
    }

    /// Run the stage until the inbound channel closes.
    pub async fn run(self, mut inbound: mpsc::Receiver<Event>) {
        while let Some(event) = inbound.recv().await {
            self.process(event).await;
        }
        info!({ COMPONENT } = "aggregate", "Inbound closed, aggregator stopping");
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("history", &self.state.history_len())
            .field("hot_countries", &self.state.hot_countries_len())
            .finish()
    }
}
