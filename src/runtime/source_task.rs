use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{
    relay::{
        message::PageEnvelope,
        registry::TabId,
        source::{ContextLiveness, Reconnect, RelaySource},
    },
    runtime::{
        coordinator_task::{CoordinatorHandle, SourceLink},
        page_task::PageHandle,
    },
};

/// Why one connected session ended.
enum SessionEnd {
    LinkLost,
    PageGone,
}

/// Bridge `window` (scanner output) to the coordinator for `tab`, and
/// coordinator commands back into `page`.
///
/// Holds one connection attempt at a time; reconnects after `retry_delay`
/// while `liveness` holds, and stops for good once it does not.
pub fn spawn_relay_source(
    tab: TabId,
    coordinator: CoordinatorHandle,
    page: PageHandle,
    window: mpsc::UnboundedReceiver<PageEnvelope>,
    liveness: Arc<dyn ContextLiveness>,
    retry_delay: Duration,
) -> JoinHandle<RelaySource> {
    tokio::spawn(run(tab, coordinator, page, window, liveness, retry_delay))
}

async fn run(
    tab: TabId,
    coordinator: CoordinatorHandle,
    page: PageHandle,
    mut window: mpsc::UnboundedReceiver<PageEnvelope>,
    liveness: Arc<dyn ContextLiveness>,
    retry_delay: Duration,
) -> RelaySource {
    let mut relay = RelaySource::new(retry_delay);

    loop {
        match coordinator.connect_source(tab) {
            Ok(link) => {
                info!(%tab, "relay connected");
                if let SessionEnd::PageGone = session(&mut relay, link, &page, &mut window).await {
                    info!(%tab, "page gone, relay finished");
                    return relay;
                }
            }
            Err(e) => debug!(%tab, error = %e, "relay connect failed"),
        }

        match relay.on_disconnected(liveness.as_ref()) {
            Reconnect::RetryAfter(delay) => tokio::time::sleep(delay).await,
            Reconnect::Stop => return relay,
        }
    }
}

async fn session(
    relay: &mut RelaySource,
    mut link: SourceLink,
    page: &PageHandle,
    window: &mut mpsc::UnboundedReceiver<PageEnvelope>,
) -> SessionEnd {
    if let Some(msg) = relay.on_connected() {
        if link.outbound.send(msg).is_err() {
            return SessionEnd::LinkLost;
        }
    }

    loop {
        tokio::select! {
            envelope = window.recv() => {
                let Some(envelope) = envelope else {
                    return SessionEnd::PageGone;
                };
                if let Some(msg) = relay.on_page_message(envelope) {
                    if link.outbound.send(msg).is_err() {
                        return SessionEnd::LinkLost;
                    }
                }
            }
            command = link.inbound.recv() => {
                let Some(command) = command else {
                    return SessionEnd::LinkLost;
                };
                let actions = relay.on_command(command);
                if let Some(msg) = actions.to_coordinator {
                    if link.outbound.send(msg).is_err() {
                        return SessionEnd::LinkLost;
                    }
                }
                if let Some(envelope) = actions.to_page {
                    page.post_window(envelope);
                }
            }
        }
    }
}
