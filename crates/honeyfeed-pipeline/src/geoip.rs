//! Country lookup against a local MaxMind database.
//!
//! The database is a single on-disk artifact. [`ensure_database`] fetches it
//! once when missing; afterwards it is opened once at pipeline startup and held
//! read-only for the lifetime of the process.

use std::fs::File;
use std::io;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Instant;

use flate2::read::GzDecoder;
use maxminddb::{geoip2, MaxMindDBError};
use tracing::{debug, info};

use honeyfeed_core::logging::{BYTES, COMPONENT, DURATION_MS};
use honeyfeed_core::{Error, Result};

use crate::config::PipelineConfig;

/// Resolves an IP address to the ISO code of its country.
pub trait CountryResolver: Send + Sync {
    /// `Ok(None)` when the database has no country for `ip`.
    fn lookup_country(&self, ip: IpAddr) -> Result<Option<String>>;
}

/// [`CountryResolver`] backed by a MaxMind GeoLite2/GeoIP2 database.
pub struct MaxMindResolver {
    reader: maxminddb::Reader<Vec<u8>>,
}

impl MaxMindResolver {
    /// Open the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let reader = maxminddb::Reader::open_readfile(path)
            .map_err(|e| Error::GeoIp(format!("open {}: {}", path.display(), e)))?;
        debug!(
            { COMPONENT } = "geoip",
            path = %path.display(),
            database_type = %reader.metadata.database_type,
            "Opened geolocation database"
        );
        Ok(Self { reader })
    }

    /// Make sure the database exists (downloading it if needed), then open it.
    ///
    /// Any failure here means the pipeline cannot enrich events correctly and
    /// must not start.
    pub async fn bootstrap(config: &PipelineConfig) -> Result<Self> {
        let path = config.database_path();
        ensure_database(&path, &config.database_url).await?;
        tokio::task::spawn_blocking(move || Self::open(&path))
            .await
            .map_err(|e| Error::Internal(format!("geoip open task failed: {}", e)))?
    }
}

impl CountryResolver for MaxMindResolver {
    fn lookup_country(&self, ip: IpAddr) -> Result<Option<String>> {
        match self.reader.lookup::<geoip2::Country>(ip) {
            Ok(record) => Ok(record
                .country
                .and_then(|c| c.iso_code)
                .filter(|code| !code.is_empty())
                .map(str::to_string)),
            Err(MaxMindDBError::AddressNotFoundError(_)) => Ok(None),
            Err(e) => Err(Error::GeoIp(e.to_string())),
        }
    }
}

/// Download the database to `path` unless it already exists.
///
/// The remote file is gzip-compressed. It is decompressed into a `.part` file
/// next to `path` and renamed into place only once complete, so a failed
/// download never leaves a truncated database behind. Returns `true` when a
/// download took place.
pub async fn ensure_database(path: &Path, url: &str) -> Result<bool> {
    if tokio::fs::try_exists(path).await? {
        debug!({ COMPONENT } = "geoip", path = %path.display(), "Geolocation database present");
        return Ok(false);
    }

    info!(
        { COMPONENT } = "geoip",
        path = %path.display(),
        url,
        "Geolocation database missing, downloading"
    );
    let started = Instant::now();

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::Bootstrap(format!("fetch {}: {}", url, e)))?;
    let compressed = response
        .bytes()
        .await
        .map_err(|e| Error::Bootstrap(format!("read {}: {}", url, e)))?;

    let part = part_path(path);
    let target = part.clone();
    let written = tokio::task::spawn_blocking(move || decompress_to(&compressed, &target))
        .await
        .map_err(|e| Error::Internal(format!("decompress task failed: {}", e)))?
        .map_err(|e| Error::Bootstrap(format!("decompress {}: {}", url, e)))?;

    if let Err(e) = tokio::fs::rename(&part, path).await {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(e.into());
    }

    info!(
        { COMPONENT } = "geoip",
        { BYTES } = written,
        { DURATION_MS } = started.elapsed().as_millis() as u64,
        path = %path.display(),
        "Geolocation database installed"
    );
    Ok(true)
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn decompress_to(compressed: &[u8], dest: &Path) -> io::Result<u64> {
    let result = File::create(dest).and_then(|mut file| {
        let mut decoder = GzDecoder::new(compressed);
        let n = io::copy(&mut decoder, &mut file)?;
        file.sync_all()?;
        Ok(n)
    });
    if result.is_err() {
        let _ = std::fs::remove_file(dest);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    /// Serve `body` at `/db.gz` and return its URL.
    async fn serve_bytes(body: Vec<u8>) -> String {
        let router = Router::new().route("/db.gz", get(move || async move { body }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/db.gz", addr)
    }

    #[tokio::test]
    async fn test_ensure_database_downloads_and_decompresses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("GeoLite2-Country.mmdb");
        let url = serve_bytes(gzip(b"mmdb-bytes")).await;

        let downloaded = ensure_database(&path, &url).await.unwrap();

        assert!(downloaded);
        assert_eq!(std::fs::read(&path).unwrap(), b"mmdb-bytes");
        assert!(!part_path(&path).exists());
    }

    #[tokio::test]
    async fn test_ensure_database_existing_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GeoLite2-Country.mmdb");
        std::fs::write(&path, b"already here").unwrap();

        // Nothing listens on port 1; a fetch attempt would fail.
        let downloaded = ensure_database(&path, "http://127.0.0.1:1/db.gz")
            .await
            .unwrap();

        assert!(!downloaded);
        assert_eq!(std::fs::read(&path).unwrap(), b"already here");
    }

    #[tokio::test]
    async fn test_ensure_database_unreachable_is_bootstrap_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GeoLite2-Country.mmdb");

        let err = ensure_database(&path, "http://127.0.0.1:1/db.gz")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Bootstrap(_)), "got {:?}", err);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_ensure_database_http_error_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GeoLite2-Country.mmdb");
        let url = serve_bytes(Vec::new()).await.replace("/db.gz", "/missing.gz");

        let err = ensure_database(&path, &url).await.unwrap_err();

        assert!(matches!(err, Error::Bootstrap(_)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_ensure_database_corrupt_gzip_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GeoLite2-Country.mmdb");
        let url = serve_bytes(b"definitely not gzip".to_vec()).await;

        let err = ensure_database(&path, &url).await.unwrap_err();

        assert!(matches!(err, Error::Bootstrap(_)));
        assert!(!path.exists());
        assert!(!part_path(&path).exists());
    }

    #[test]
    fn test_open_invalid_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GeoLite2-Country.mmdb");
        std::fs::write(&path, b"not a maxmind database").unwrap();

        let err = MaxMindResolver::open(&path).err().unwrap();
        assert!(matches!(err, Error::GeoIp(_)));
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("/data/GeoLite2-Country.mmdb")),
            PathBuf::from("/data/GeoLite2-Country.mmdb.part")
        );
    }
}
