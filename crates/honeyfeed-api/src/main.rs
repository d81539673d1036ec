//! honeyfeed-api - live telemetry web interface

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use honeyfeed_api::{build_metadata, router, AppState, Hub, ServerConfig};
use honeyfeed_core::defaults::HUB_INBOX_CAPACITY;
use honeyfeed_core::TelemetryState;
use honeyfeed_pipeline::{Pipeline, PipelineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "honeyfeed_api=debug,honeyfeed_pipeline=info,tower_http=info".into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("honeyfeed.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    let server_config = ServerConfig::from_env()?;
    if !server_config.enabled {
        info!("Web interface disabled (set WEB_ENABLED=true to enable)");
        return Ok(());
    }
    let pipeline_config = PipelineConfig::from_env();

    let metadata = Arc::new(build_metadata(Utc::now()));
    info!(
        version = %metadata.version,
        release_tag = %metadata.release_tag,
        commit = %metadata.short_commit_id,
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Starting honeyfeed"
    );

    let hub = Hub::spawn(HUB_INBOX_CAPACITY);
    let telemetry = Arc::new(TelemetryState::new());
    let pipeline = Pipeline::start(&pipeline_config, telemetry.clone(), Arc::new(hub.clone())).await?;

    let state = AppState {
        hub,
        telemetry,
        metadata,
        pipeline,
    };
    let app = router(state, server_config.assets_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(server_config.listen).await?;
    info!("Listening on {}", server_config.listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
