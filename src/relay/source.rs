use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info};

use crate::{
    form::form_model::FormSnapshot,
    relay::message::{PageEnvelope, PageMessage, SourceCommand, SourceMessage, timestamp_ms},
};

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Whether the extension context hosting the Relay-Source is still usable.
pub trait ContextLiveness: Send + Sync {
    fn is_valid(&self) -> bool;
}

/// Liveness flag flipped once when the extension context is torn down.
#[derive(Debug, Clone)]
pub struct ExtensionContext {
    valid: Arc<AtomicBool>,
}

impl Default for ExtensionContext {
    fn default() -> Self {
        Self {
            valid: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl ExtensionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&self) {
        self.valid.store(false, Ordering::SeqCst);
    }
}

impl ContextLiveness for ExtensionContext {
    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Connected,
    /// Context invalid; no further attempts.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconnect {
    RetryAfter(Duration),
    Stop,
}

/// What one coordinator command produces on each side of the bridge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceActions {
    pub to_coordinator: Option<SourceMessage>,
    pub to_page: Option<PageEnvelope>,
}

/// Boundary process between the page and the coordinator.
#[derive(Debug)]
pub struct RelaySource {
    latest: Option<(Vec<FormSnapshot>, u64)>,
    link: LinkState,
    retry_delay: Duration,
}

impl RelaySource {
    pub fn new(retry_delay: Duration) -> Self {
        Self {
            latest: None,
            link: LinkState::Connecting,
            retry_delay,
        }
    }

    pub fn link(&self) -> LinkState {
        self.link
    }

    pub fn latest_forms(&self) -> &[FormSnapshot] {
        self.latest.as_ref().map(|(f, _)| f.as_slice()).unwrap_or(&[])
    }

    /// Channel established. Re-announces the latest snapshot, if any, so a
    /// coordinator that reset this tab is repopulated.
    pub fn on_connected(&mut self) -> Option<SourceMessage> {
        self.link = LinkState::Connected;
        self.latest
            .as_ref()
            .map(|(forms, timestamp)| SourceMessage::StateUpdate {
                forms: forms.clone(),
                timestamp: *timestamp,
            })
    }

    /// A window message from the page. Foreign messages are ignored.
    pub fn on_page_message(&mut self, envelope: PageEnvelope) -> Option<SourceMessage> {
        if !envelope.is_ours() {
            return None;
        }
        match envelope.message {
            PageMessage::FormsUpdate { forms, timestamp } => {
                self.latest = Some((forms.clone(), timestamp));
                Some(SourceMessage::StateUpdate { forms, timestamp })
            }
            PageMessage::BadgeUpdate { count } => Some(SourceMessage::CountUpdate { count }),
            PageMessage::RefreshRequest => None,
        }
    }

    pub fn on_command(&mut self, command: SourceCommand) -> SourceActions {
        let refresh = Some(PageEnvelope::new(PageMessage::RefreshRequest));
        match command {
            SourceCommand::QueryCurrentState => SourceActions {
                to_coordinator: Some(SourceMessage::CurrentState {
                    forms: self.latest_forms().to_vec(),
                    timestamp: timestamp_ms(),
                }),
                to_page: refresh,
            },
            SourceCommand::RefreshCommand => SourceActions {
                to_coordinator: None,
                to_page: refresh,
            },
        }
    }

    /// Channel lost or connect failed.
    pub fn on_disconnected(&mut self, liveness: &dyn ContextLiveness) -> Reconnect {
        if self.link == LinkState::Stopped {
            return Reconnect::Stop;
        }
        if liveness.is_valid() {
            self.link = LinkState::Connecting;
            debug!(delay_ms = self.retry_delay.as_millis() as u64, "coordinator link lost, retrying");
            Reconnect::RetryAfter(self.retry_delay)
        } else {
            self.link = LinkState::Stopped;
            info!("extension context invalidated, relay stopped");
            Reconnect::Stop
        }
    }
}
