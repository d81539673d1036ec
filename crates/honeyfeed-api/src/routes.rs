//! HTTP routes: session upgrade, event ingest, health, static UI.

use std::path::Path;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;
use uuid::Uuid;

use honeyfeed_core::defaults::WS_PATH;
use honeyfeed_core::logging::{CATEGORY, ERROR_MSG, SUBSYSTEM};
use honeyfeed_core::Event;

use crate::session::ws_handler;
use crate::state::AppState;

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Build the application router.
///
/// When `assets_dir` is given, paths that match no route are served from it.
pub fn router(state: AppState, assets_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route(WS_PATH, get(ws_handler))
        .route("/api/v1/events", post(ingest_event))
        .route("/health", get(health));

    if let Some(dir) = assets_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct IngestError {
    error: String,
}

/// Hand a raw event to the pipeline.
///
/// Returns `202 Accepted` once the event is queued, `503` when the pipeline
/// has shut down.
async fn ingest_event(State(state): State<AppState>, Json(event): Json<Event>) -> impl IntoResponse {
    let category = event.category().to_string();
    match state.pipeline.submit(event).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            warn!(
                { SUBSYSTEM } = "ingest",
                { CATEGORY } = %category,
                { ERROR_MSG } = %e,
                "Event rejected"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(IngestError {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: String,
    start: DateTime<Utc>,
    sessions: usize,
    history: usize,
    hot_countries: usize,
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let pipeline_up = !state.pipeline.is_closed();
    let body = HealthResponse {
        status: if pipeline_up { "ok" } else { "degraded" },
        version: state.metadata.version.clone(),
        start: state.metadata.start,
        sessions: state.hub.session_count(),
        history: state.telemetry.history_len(),
        hot_countries: state.telemetry.hot_countries_len(),
    };
    let code = if pipeline_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(body))
}
