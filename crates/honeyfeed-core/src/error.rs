//! Error types for honeyfeed.

use thiserror::Error;

/// Result type alias using honeyfeed's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for honeyfeed operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Geolocation database could not be opened or queried
    #[error("GeoIP error: {0}")]
    GeoIp(String),

    /// Geolocation database could not be fetched or installed
    #[error("Bootstrap error: {0}")]
    Bootstrap(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A pipeline or hub channel has shut down
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_geoip() {
        let err = Error::GeoIp("corrupt metadata section".to_string());
        assert_eq!(err.to_string(), "GeoIP error: corrupt metadata section");
    }

    #[test]
    fn test_error_display_bootstrap() {
        let err = Error::Bootstrap("HTTP 404".to_string());
        assert_eq!(err.to_string(), "Bootstrap error: HTTP 404");
    }

    #[test]
    fn test_error_display_channel_closed() {
        let err = Error::ChannelClosed("pipeline".to_string());
        assert_eq!(err.to_string(), "Channel closed: pipeline");
    }

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
