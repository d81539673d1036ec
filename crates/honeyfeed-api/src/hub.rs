//! Connection hub: the single authority over live subscriber sessions.
//!
//! The hub runs as one task that exclusively owns the session map. Every
//! membership change and every broadcast arrives through one FIFO command
//! channel and is processed one at a time in arrival order, so the map is never
//! touched concurrently and no locks are involved.
//!
//! ## Backpressure
//!
//! Broadcast delivery awaits space in each session's bounded queue. A session
//! whose queue is full therefore stalls the whole hub (and with it every other
//! subscriber) until it drains or its writer goes away. A writer going away
//! drops the queue receiver, which fails the pending send and removes the
//! session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use honeyfeed_core::logging::{ERROR_MSG, MESSAGE_TYPE, SESSION_COUNT, SESSION_ID, SUBSYSTEM};
use honeyfeed_core::{BroadcastSink, Envelope};

/// Subscriber session identifier (UUIDv7, time-ordered).
pub type SessionId = Uuid;

/// Serialized outbound message, shared across all sessions.
pub type Payload = Arc<str>;

/// Sending half of a session's outbound queue.
pub type SessionQueue = mpsc::Sender<Payload>;

enum HubCommand {
    Register { id: SessionId, queue: SessionQueue },
    Unregister { id: SessionId },
    Broadcast { payload: Payload },
}

/// Cloneable handle to the hub task.
#[derive(Clone)]
pub struct Hub {
    tx: mpsc::Sender<HubCommand>,
    live: Arc<AtomicUsize>,
}

impl Hub {
    /// Spawn the hub task with a command inbox of `inbox_capacity`.
    ///
    /// The task runs until every handle is dropped.
    pub fn spawn(inbox_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(inbox_capacity.max(1));
        let live = Arc::new(AtomicUsize::new(0));

        let hub_loop = HubLoop {
            sessions: HashMap::new(),
            live: live.clone(),
        };
        tokio::spawn(hub_loop.run(rx));

        Self { tx, live }
    }

    /// Fresh session identifier.
    pub fn next_session_id(&self) -> SessionId {
        Uuid::now_v7()
    }

    /// Add a session to the live set.
    ///
    /// Nothing is sent to the session; the caller enqueues its initial snapshot.
    pub async fn register(&self, id: SessionId, queue: SessionQueue) {
        self.send(HubCommand::Register { id, queue }).await;
    }

    /// Remove a session and close its queue. No-op when already absent.
    pub async fn unregister(&self, id: SessionId) {
        self.send(HubCommand::Unregister { id }).await;
    }

    /// Fan a serialized message out to every live session.
    pub async fn publish(&self, payload: Payload) {
        self.send(HubCommand::Broadcast { payload }).await;
    }

    /// Number of live sessions as last seen by the hub task.
    pub fn session_count(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    async fn send(&self, cmd: HubCommand) {
        if self.tx.send(cmd).await.is_err() {
            error!({ SUBSYSTEM } = "hub", "Hub task is gone, command dropped");
        }
    }
}

#[async_trait]
impl BroadcastSink for Hub {
    async fn broadcast(&self, envelope: Envelope) {
        match envelope.to_json() {
            Ok(json) => {
                trace!(
                    { SUBSYSTEM } = "hub",
                    { MESSAGE_TYPE } = envelope.kind().as_str(),
                    "Broadcast queued"
                );
                self.publish(json.into()).await;
            }
            Err(e) => error!(
                { SUBSYSTEM } = "hub",
                { MESSAGE_TYPE } = envelope.kind().as_str(),
                { ERROR_MSG } = %e,
                "Failed to serialize broadcast"
            ),
        }
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("sessions", &self.session_count())
            .finish()
    }
}

struct HubLoop {
    sessions: HashMap<SessionId, SessionQueue>,
    live: Arc<AtomicUsize>,
}

impl HubLoop {
    async fn run(mut self, mut rx: mpsc::Receiver<HubCommand>) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                HubCommand::Register { id, queue } => self.register(id, queue),
                HubCommand::Unregister { id } => self.unregister(id),
                HubCommand::Broadcast { payload } => self.broadcast(payload).await,
            }
            self.live.store(self.sessions.len(), Ordering::Relaxed);
        }
        info!({ SUBSYSTEM } = "hub", "All hub handles dropped, hub stopping");
    }

    fn register(&mut self, id: SessionId, queue: SessionQueue) {
        if self.sessions.insert(id, queue).is_some() {
            warn!({ SUBSYSTEM } = "hub", { SESSION_ID } = %id, "Session registered twice");
        }
        debug!(
            { SUBSYSTEM } = "hub",
            { SESSION_ID } = %id,
            { SESSION_COUNT } = self.sessions.len(),
            "Session registered"
        );
    }

    fn unregister(&mut self, id: SessionId) {
        // Dropping the hub's sender closes the queue and stops the writer.
        if self.sessions.remove(&id).is_some() {
            debug!(
                { SUBSYSTEM } = "hub",
                { SESSION_ID } = %id,
                { SESSION_COUNT } = self.sessions.len(),
                "Session unregistered"
            );
        }
    }

    async fn broadcast(&mut self, payload: Payload) {
        let mut gone = Vec::new();
        for (id, queue) in &self.sessions {
            if queue.send(payload.clone()).await.is_err() {
                gone.push(*id);
            }
        }
        for id in gone {
            self.sessions.remove(&id);
            debug!(
                { SUBSYSTEM } = "hub",
                { SESSION_ID } = %id,
                "Session queue closed, removed"
            );
        }
    }
}
