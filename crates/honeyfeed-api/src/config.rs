//! Web interface configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use honeyfeed_core::defaults;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid listen address {value:?}: {source}")]
    InvalidListen {
        value: String,
        source: std::net::AddrParseError,
    },
}

/// Configuration for the web interface.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Whether the web interface runs at all.
    pub enabled: bool,
    /// Address to bind.
    pub listen: SocketAddr,
    /// Prebuilt UI bundle served for non-API paths.
    pub assets_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: defaults::LISTEN_ADDRESS,
            assets_dir: None,
        }
    }
}

/// Parse `WEB_LISTEN`, falling back to the default address when unset.
fn listen_from(raw: Option<String>) -> Result<SocketAddr, ConfigError> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|source| ConfigError::InvalidListen { value, source }),
        None => Ok(defaults::LISTEN_ADDRESS),
    }
}

impl ServerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `WEB_ENABLED` | `false` | Enable the web interface |
    /// | `WEB_LISTEN` | `127.0.0.1:8089` | Listen address |
    /// | `WEB_ASSETS_DIR` | unset | Directory of static UI assets |
    pub fn from_env() -> Result<Self, ConfigError> {
        let enabled = std::env::var("WEB_ENABLED")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let listen = listen_from(std::env::var("WEB_LISTEN").ok())?;

        let assets_dir = std::env::var("WEB_ASSETS_DIR")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            enabled,
            listen,
            assets_dir,
        })
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_listen(mut self, listen: SocketAddr) -> Self {
        self.listen = listen;
        self
    }

    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = Some(dir.into());
        self
    }
}
