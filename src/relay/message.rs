use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::form::form_model::FormSnapshot;

/// Tag carried by every window message the inspector posts inside the page.
pub const PAGE_SOURCE_TAG: &str = "formik-inspector";

// ============================================================================
// Page <-> Relay-Source (window messages)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PageMessage {
    FormsUpdate {
        forms: Vec<FormSnapshot>,
        timestamp: u64,
    },
    BadgeUpdate {
        count: usize,
    },
    RefreshRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEnvelope {
    pub source: String,
    #[serde(flatten)]
    pub message: PageMessage,
}

impl PageEnvelope {
    pub fn new(message: PageMessage) -> Self {
        Self {
            source: PAGE_SOURCE_TAG.to_string(),
            message,
        }
    }

    /// Other scripts on the page share the window channel.
    pub fn is_ours(&self) -> bool {
        self.source == PAGE_SOURCE_TAG
    }
}

// ============================================================================
// Relay-Source <-> Coordinator
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SourceMessage {
    StateUpdate {
        forms: Vec<FormSnapshot>,
        timestamp: u64,
    },
    CountUpdate {
        count: usize,
    },
    /// Direct reply to a query-current-state command.
    CurrentState {
        forms: Vec<FormSnapshot>,
        timestamp: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SourceCommand {
    QueryCurrentState,
    RefreshCommand,
}

// ============================================================================
// Inspector Client <-> Coordinator
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientRequest {
    GetCurrentState,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    StateUpdate {
        forms: Vec<FormSnapshot>,
        timestamp: u64,
    },
}

impl ClientMessage {
    pub fn forms(&self) -> &[FormSnapshot] {
        match self {
            ClientMessage::StateUpdate { forms, .. } => forms,
        }
    }
}

/// Role a connecting port announces through its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortRole {
    Source,
    Client,
}

impl PortRole {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            PAGE_SOURCE_TAG => Some(PortRole::Source),
            "popup" => Some(PortRole::Client),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PortRole::Source => PAGE_SOURCE_TAG,
            PortRole::Client => "popup",
        }
    }
}

pub fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
