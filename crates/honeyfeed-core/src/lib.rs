//! # honeyfeed-core
//!
//! Core types, shared state, and abstractions for honeyfeed, the live
//! security telemetry fan-out.
//!
//! This crate provides the event record that flows through the pipeline, the
//! concurrency-safe bounded collections holding rolling aggregates, and the
//! message envelope pushed to observer sessions. The pipeline and API crates
//! depend on it.

pub mod collection;
pub mod defaults;
pub mod error;
pub mod event;
pub mod logging;
pub mod message;
pub mod state;

// Re-export commonly used types at crate root
pub use collection::BoundedCollection;
pub use error::{Error, Result};
pub use event::Event;
pub use message::{Envelope, MessageKind, Metadata};
pub use state::{BroadcastSink, HotCountry, PublishGuard, TelemetryState};
