//! Centralized default constants for honeyfeed.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

// =============================================================================
// AGGREGATION
// =============================================================================

/// Maximum number of events retained in the rolling history.
pub const HISTORY_CAPACITY: usize = 1000;

/// Category value marking low-value periodic events that are filtered out.
pub const HEARTBEAT_CATEGORY: &str = "heartbeat";

// =============================================================================
// PIPELINE
// =============================================================================

/// Buffer size of each pipeline stage's inbound channel.
///
/// `submit` blocks once the first stage's buffer is full.
pub const PIPELINE_CHANNEL_CAPACITY: usize = 16;

// =============================================================================
// GEOLOCATION
// =============================================================================

/// File name of the country database inside the data directory.
pub const GEOIP_DB_FILENAME: &str = "GeoLite2-Country.mmdb";

/// Remote location of the gzip-compressed database, fetched when missing.
pub const GEOIP_DB_URL: &str =
    "http://geolite.maxmind.com/download/geoip/database/GeoLite2-City.mmdb.gz";

/// Default data directory for persisted artifacts.
pub const DATA_DIR: &str = "./data";

// =============================================================================
// SESSIONS & HUB
// =============================================================================

/// Outbound queue capacity of each subscriber session.
pub const SESSION_QUEUE_CAPACITY: usize = 100;

/// Buffer size of the hub's command inbox.
pub const HUB_INBOX_CAPACITY: usize = 32;

/// Interval between keepalive pings sent to each session, in seconds.
pub const SESSION_PING_INTERVAL_SECS: u64 = 30;

// =============================================================================
// SERVER
// =============================================================================

/// Default listen address of the web interface.
pub const LISTEN_ADDRESS: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8089));

/// Path of the session upgrade endpoint.
pub const WS_PATH: &str = "/ws";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geoip_url_is_gzip() {
        assert!(GEOIP_DB_URL.ends_with(".gz"));
        assert!(GEOIP_DB_FILENAME.ends_with(".mmdb"));
    }

    #[test]
    fn test_capacities_nonzero() {
        assert!(HISTORY_CAPACITY > 0);
        assert!(PIPELINE_CHANNEL_CAPACITY > 0);
        assert!(SESSION_QUEUE_CAPACITY > 0);
        assert!(HUB_INBOX_CAPACITY > 0);
    }

    #[test]
    fn test_listen_address_is_loopback() {
        assert!(LISTEN_ADDRESS.ip().is_loopback());
        assert_eq!(LISTEN_ADDRESS.port(), 8089);
    }
}
