use serde::{Deserialize, Serialize};

use crate::relay::{badge::Badge, message::timestamp_ms, port::PortId, registry::TabId};

/// One coordinator transition, written as a JSON line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub timestamp_ms: u64,
    pub event: String,

    pub tab: Option<TabId>,
    pub port: Option<String>,

    pub forms: Option<usize>,
    pub badge: Option<String>,
    pub note: Option<String>,
}

impl TraceEvent {
    pub fn now(event: impl ToString) -> Self {
        Self {
            timestamp_ms: timestamp_ms(),
            event: event.to_string(),
            tab: None,
            port: None,
            forms: None,
            badge: None,
            note: None,
        }
    }

    pub fn with_tab(mut self, tab: TabId) -> Self {
        self.tab = Some(tab);
        self
    }

    pub fn with_port(mut self, port: PortId) -> Self {
        self.port = Some(port.to_string());
        self
    }

    pub fn with_forms(mut self, count: usize) -> Self {
        self.forms = Some(count);
        self
    }

    pub fn with_badge(mut self, badge: &Badge) -> Self {
        self.badge = Some(format!("{:?}:{}", badge.color, badge.text));
        self
    }

    pub fn with_note(mut self, note: impl ToString) -> Self {
        self.note = Some(note.to_string());
        self
    }
}
