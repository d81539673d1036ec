//! # honeyfeed-api
//!
//! Web interface for honeyfeed: websocket subscriber sessions fed by the
//! connection hub, an ingest endpoint feeding the event pipeline, and the
//! static UI bundle.
//!
//! ```ignore
//! let hub = Hub::spawn(HUB_INBOX_CAPACITY);
//! let telemetry = Arc::new(TelemetryState::new());
//! let pipeline = Pipeline::start(&config, telemetry.clone(), Arc::new(hub.clone())).await?;
//! let app = router(AppState { hub, telemetry, metadata, pipeline }, None);
//! ```

pub mod config;
pub mod hub;
pub mod routes;
pub mod session;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use hub::{Hub, Payload, SessionId, SessionQueue};
pub use routes::router;
pub use session::serve_session;
pub use state::{build_metadata, AppState};
