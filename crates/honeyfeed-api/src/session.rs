//! Subscriber session protocol.
//!
//! On upgrade a session registers with the hub and enqueues three initial
//! messages (`metadata`, `events`, `hot_countries`). Then a writer drains the
//! session queue onto the socket while a reader consumes and discards inbound
//! frames. Whichever loop ends first tears the session down: the hub
//! unregisters it exactly once and the socket is dropped.

use std::time::Duration;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{IntoResponse, Response},
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use honeyfeed_core::defaults::{SESSION_PING_INTERVAL_SECS, SESSION_QUEUE_CAPACITY};
use honeyfeed_core::logging::{ERROR_MSG, SESSION_COUNT, SESSION_ID, SUBSYSTEM};
use honeyfeed_core::{Envelope, Error, MessageKind, Result};

use crate::hub::{Payload, SessionId, SessionQueue};
use crate::state::AppState;

/// Session upgrade endpoint.
///
/// Requests that are not valid upgrades are rejected and logged.
pub async fn ws_handler(
    ws: std::result::Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<AppState>,
) -> Response {
    match ws {
        Ok(ws) => ws
            .on_failed_upgrade(|e| {
                warn!({ SUBSYSTEM } = "session", { ERROR_MSG } = %e, "Could not upgrade connection");
            })
            .on_upgrade(move |socket| serve_session(socket, state))
            .into_response(),
        Err(rejection) => {
            warn!(
                { SUBSYSTEM } = "session",
                { ERROR_MSG } = %rejection,
                "Could not upgrade connection"
            );
            rejection.into_response()
        }
    }
}

/// Drive one session until either direction of the socket fails.
pub async fn serve_session(socket: WebSocket, state: AppState) {
    let id = state.hub.next_session_id();
    let (queue, outbound) = mpsc::channel(SESSION_QUEUE_CAPACITY);

    if let Err(e) = attach(&state, id, queue).await {
        error!(
            { SUBSYSTEM } = "session",
            { SESSION_ID } = %id,
            { ERROR_MSG } = %e,
            "Failed to send initial snapshot"
        );
        state.hub.unregister(id).await;
        return;
    }
    info!(
        { SUBSYSTEM } = "session",
        { SESSION_ID } = %id,
        { SESSION_COUNT } = state.hub.session_count(),
        "Connection upgraded"
    );

    let (sender, receiver) = socket.split();
    let mut write_task = tokio::spawn(write_loop(id, sender, outbound));
    let mut read_task = tokio::spawn(read_loop(id, receiver));

    // Wait for either task to finish
    tokio::select! {
        _ = &mut write_task => read_task.abort(),
        _ = &mut read_task => write_task.abort(),
    }

    state.hub.unregister(id).await;
    info!({ SUBSYSTEM } = "session", { SESSION_ID } = %id, "Connection closed");
}

/// Register with the hub and enqueue the initial snapshot.
///
/// Runs under the publish lock so the snapshot lines up exactly with the
/// broadcasts the hub will deliver afterwards.
async fn attach(state: &AppState, id: SessionId, queue: SessionQueue) -> Result<()> {
    let publish = state.telemetry.publish_lock().await;

    state.hub.register(id, queue.clone()).await;

    let initial = [
        Envelope::new(MessageKind::Metadata, &*state.metadata)?,
        Envelope::new(MessageKind::Events, publish.history())?,
        Envelope::new(MessageKind::HotCountries, publish.hot_countries())?,
    ];
    for envelope in initial {
        let payload: Payload = envelope.to_json()?.into();
        queue
            .send(payload)
            .await
            .map_err(|_| Error::ChannelClosed("session queue".into()))?;
    }
    Ok(())
}

async fn write_loop(
    id: SessionId,
    mut sender: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Payload>,
) {
    let mut ping = tokio::time::interval(Duration::from_secs(SESSION_PING_INTERVAL_SECS));
    ping.tick().await;

    loop {
        tokio::select! {
            msg = outbound.recv() => match msg {
                Some(payload) => {
                    if let Err(e) = sender.send(Message::Text(payload.to_string())).await {
                        debug!({ SESSION_ID } = %id, { ERROR_MSG } = %e, "Write failed");
                        return;
                    }
                }
                None => {
                    // Queue closed by the hub.
                    let _ = sender.send(Message::Close(None)).await;
                    return;
                }
            },
            _ = ping.tick() => {
                if let Err(e) = sender.send(Message::Ping(Vec::new())).await {
                    debug!({ SESSION_ID } = %id, { ERROR_MSG } = %e, "Ping failed");
                    return;
                }
            }
        }
    }
}

async fn read_loop(id: SessionId, mut receiver: SplitStream<WebSocket>) {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!({ SESSION_ID } = %id, { ERROR_MSG } = %e, "Read failed");
                break;
            }
        }
    }
}
