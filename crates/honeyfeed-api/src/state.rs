//! Shared application state.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use honeyfeed_core::{Metadata, TelemetryState};
use honeyfeed_pipeline::PipelineHandle;

use crate::hub::Hub;

/// State handed to every route and session.
#[derive(Clone)]
pub struct AppState {
    pub hub: Hub,
    pub telemetry: Arc<TelemetryState>,
    pub metadata: Arc<Metadata>,
    pub pipeline: PipelineHandle,
}

/// Metadata for this build, stamped with `start`.
///
/// Release tag and commit id come from `HONEYFEED_RELEASE_TAG` and
/// `HONEYFEED_COMMIT_ID` at compile time and are empty when unset.
pub fn build_metadata(start: DateTime<Utc>) -> Metadata {
    Metadata::new(
        start,
        env!("CARGO_PKG_VERSION"),
        option_env!("HONEYFEED_RELEASE_TAG").unwrap_or_default(),
        option_env!("HONEYFEED_COMMIT_ID").unwrap_or_default(),
    )
}
