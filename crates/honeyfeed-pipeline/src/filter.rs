//! Filter stage: drops heartbeat events.

use tokio::sync::mpsc;
use tracing::{info, trace, warn};

use honeyfeed_core::defaults::HEARTBEAT_CATEGORY;
use honeyfeed_core::logging::COMPONENT;
use honeyfeed_core::Event;

/// Whether `event` should continue down the pipeline.
pub fn keep(event: &Event) -> bool {
    event.category() != HEARTBEAT_CATEGORY
}

/// Run the stage until the inbound channel closes or downstream goes away.
pub async fn run(mut inbound: mpsc::Receiver<Event>, outbound: mpsc::Sender<Event>) {
    while let Some(event) = inbound.recv().await {
        if !keep(&event) {
            trace!({ COMPONENT } = "filter", "Dropped heartbeat");
            continue;
        }
        if outbound.send(event).await.is_err() {
            warn!({ COMPONENT } = "filter", "Downstream closed, filter stopping");
            return;
        }
    }
    info!({ COMPONENT } = "filter", "Inbound closed, filter stopping");
}

#[cfg(test)]
mod tests {
    use super::*;
    use honeyfeed_core::event::CATEGORY;

    #[test]
    fn test_keep() {
        assert!(keep(&Event::new()));
        assert!(keep(&Event::new().with(CATEGORY, "ssh")));
        assert!(keep(&Event::new().with(CATEGORY, "Heartbeat")));
        assert!(!keep(&Event::new().with(CATEGORY, "heartbeat")));
    }

    #[tokio::test]
    async fn test_run_drops_only_heartbeats() {
        let (in_tx, in_rx) = mpsc::channel(8);
        let (out_tx, mut out_rx) = mpsc::channel(8);
        tokio::spawn(run(in_rx, out_tx));

        for category in ["alert", "heartbeat", "ssh", "heartbeat", "http"] {
            in_tx
                .send(Event::new().with(CATEGORY, category))
                .await
                .unwrap();
        }
        drop(in_tx);

        let mut seen = Vec::new();
        while let Some(event) = out_rx.recv().await {
            seen.push(event.category().to_string());
        }
        assert_eq!(seen, vec!["alert", "ssh", "http"]);
    }
}
