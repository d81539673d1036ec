//! Pipeline assembly and the `submit` entry point.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, instrument};

use honeyfeed_core::{BroadcastSink, Error, Event, Result, TelemetryState};

use crate::aggregate::Aggregator;
use crate::config::PipelineConfig;
use crate::geoip::{CountryResolver, MaxMindResolver};
use crate::{enrich, filter};

/// Wires the enrich, filter, and aggregate stages together.
pub struct Pipeline;

impl Pipeline {
    /// Bootstrap the geolocation database, then spawn all stages.
    ///
    /// Fails before any task is spawned if the database cannot be fetched or
    /// opened, so callers can refuse to declare the service ready.
    #[instrument(skip_all, fields(data_dir = %config.data_dir.display()))]
    pub async fn start(
        config: &PipelineConfig,
        state: Arc<TelemetryState>,
        sink: Arc<dyn BroadcastSink>,
    ) -> Result<PipelineHandle> {
        let resolver = MaxMindResolver::bootstrap(config).await?;
        Ok(Self::with_resolver(
            Arc::new(resolver),
            config.channel_capacity,
            state,
            sink,
        ))
    }

    /// Spawn all stages around an already-open resolver.
    pub fn with_resolver(
        resolver: Arc<dyn CountryResolver>,
        channel_capacity: usize,
        state: Arc<TelemetryState>,
        sink: Arc<dyn BroadcastSink>,
    ) -> PipelineHandle {
        let capacity = channel_capacity.max(1);
        let (submit_tx, enrich_rx) = mpsc::channel(capacity);
        let (enrich_tx, filter_rx) = mpsc::channel(capacity);
        let (filter_tx, aggregate_rx) = mpsc::channel(capacity);

        tokio::spawn(enrich::run(resolver, enrich_rx, enrich_tx));
        tokio::spawn(filter::run(filter_rx, filter_tx));
        tokio::spawn(Aggregator::new(state, sink).run(aggregate_rx));

        info!(channel_capacity = capacity, "Event pipeline started");
        PipelineHandle { tx: submit_tx }
    }
}

/// Cloneable handle accepting events into the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    tx: mpsc::Sender<Event>,
}

impl PipelineHandle {
    /// Submit one event, waiting while the first stage is saturated.
    ///
    /// Enrichment, filtering, and aggregation never make this fail; the only
    /// error is a pipeline that has shut down.
    pub async fn submit(&self, event: Event) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| Error::ChannelClosed("pipeline".into()))
    }

    /// Blocking variant of [`submit`](Self::submit) for synchronous callers.
    ///
    /// Must not be called from within an async context.
    pub fn blocking_submit(&self, event: Event) -> Result<()> {
        self.tx
            .blocking_send(event)
            .map_err(|_| Error::ChannelClosed("pipeline".into()))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
