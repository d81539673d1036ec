//! Structured logging field name constants for honeyfeed.
//!
//! All crates use these constants for consistent structured logging fields so
//! log aggregation tools can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, event passed through unannotated |
//! | INFO  | Lifecycle events (startup, session open/close) |
//! | DEBUG | Decision points, registry changes |
//! | TRACE | Per-event and per-message flow |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "pipeline", "hub", "session", "api"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "enrich", "filter", "aggregate", "geoip"
pub const COMPONENT: &str = "component";

/// Subscriber session UUID.
pub const SESSION_ID: &str = "session_id";

// ─── Event fields ──────────────────────────────────────────────────────────

/// Source IP address of an event being enriched.
pub const SOURCE_IP: &str = "source_ip";

/// ISO country code resolved for an event.
pub const ISO_CODE: &str = "iso_code";

/// Event category.
pub const CATEGORY: &str = "category";

/// Outbound message type tag.
pub const MESSAGE_TYPE: &str = "message_type";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Number of live sessions.
pub const SESSION_COUNT: &str = "sessions";

/// Number of events in the rolling history.
pub const HISTORY_LEN: &str = "history_len";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Size in bytes of a downloaded or written artifact.
pub const BYTES: &str = "bytes";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
