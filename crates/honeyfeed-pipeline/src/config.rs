//! Pipeline configuration.

use std::path::{Path, PathBuf};

use honeyfeed_core::defaults;

/// Configuration for the event pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding the geolocation database.
    pub data_dir: PathBuf,
    /// URL of the gzip-compressed database, fetched when the file is missing.
    pub database_url: String,
    /// Buffer size of each stage's inbound channel.
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(defaults::DATA_DIR),
            database_url: defaults::GEOIP_DB_URL.to_string(),
            channel_capacity: defaults::PIPELINE_CHANNEL_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DATA_DIR` | `./data` | Directory for the geolocation database |
    /// | `GEOIP_DATABASE_URL` | GeoLite location | Where to fetch a missing database |
    /// | `PIPELINE_CHANNEL_CAPACITY` | `16` | Per-stage channel buffer |
    pub fn from_env() -> Self {
        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(defaults::DATA_DIR));

        let database_url = std::env::var("GEOIP_DATABASE_URL")
            .unwrap_or_else(|_| defaults::GEOIP_DB_URL.to_string());

        let channel_capacity = std::env::var("PIPELINE_CHANNEL_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::PIPELINE_CHANNEL_CAPACITY)
            .max(1);

        Self {
            data_dir,
            database_url,
            channel_capacity,
        }
    }

    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Full path of the geolocation database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(defaults::GEOIP_DB_FILENAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.channel_capacity, defaults::PIPELINE_CHANNEL_CAPACITY);
        assert_eq!(config.database_url, defaults::GEOIP_DB_URL);
    }

    #[test]
    fn test_database_path() {
        let config = PipelineConfig::default().with_data_dir("/var/lib/honeyfeed");
        assert_eq!(
            config.database_path(),
            PathBuf::from("/var/lib/honeyfeed/GeoLite2-Country.mmdb")
        );
    }

    #[test]
    fn test_channel_capacity_min_one() {
        let config = PipelineConfig::default().with_channel_capacity(0);
        assert_eq!(config.channel_capacity, 1);
    }
}
