//! # honeyfeed-pipeline
//!
//! Event processing pipeline for honeyfeed.
//!
//! Raw events flow through three stages, each running as its own task and
//! connected by bounded channels:
//!
//! ```text
//! submit ─▶ enrich (GeoIP country) ─▶ filter (drop heartbeats) ─▶ aggregate ─▶ BroadcastSink
//! ```
//!
//! Events are processed strictly in arrival order. No stage failure stops the
//! pipeline; an event whose lookup fails simply passes through unannotated.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use honeyfeed_core::{Event, TelemetryState};
//! use honeyfeed_pipeline::{Pipeline, PipelineConfig};
//!
//! let state = Arc::new(TelemetryState::new());
//! let handle = Pipeline::start(&PipelineConfig::from_env(), state, sink).await?;
//! handle.submit(Event::new().with("source-ip", "8.8.8.8")).await?;
//! ```

pub mod aggregate;
pub mod config;
pub mod enrich;
pub mod filter;
pub mod geoip;
pub mod pipeline;

pub use aggregate::Aggregator;
pub use config::PipelineConfig;
pub use geoip::{ensure_database, CountryResolver, MaxMindResolver};
pub use pipeline::{Pipeline, PipelineHandle};
