use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::form::form_model::FormSnapshot;
use crate::relay::message::{ClientMessage, SourceCommand};
use crate::relay::port::{Port, PortId};

/// Opaque identity of one observed page/tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// Per-tab cache and connection presence.
#[derive(Debug)]
pub struct PageState {
    pub tab_id: TabId,
    forms: Vec<FormSnapshot>,
    pub(crate) source: Option<Port<SourceCommand>>,
    pub(crate) client: Option<Port<ClientMessage>>,
    /// Last count the source announced, kept for diagnostics only.
    pub reported_count: Option<usize>,
}

impl PageState {
    pub fn new(tab_id: TabId) -> Self {
        Self {
            tab_id,
            forms: vec![],
            source: None,
            client: None,
            reported_count: None,
        }
    }

    pub fn forms(&self) -> &[FormSnapshot] {
        &self.forms
    }

    /// Whole-batch replacement; the cache is never edited in place.
    pub fn replace_forms(&mut self, forms: Vec<FormSnapshot>) {
        self.forms = forms;
    }

    pub fn source_connected(&self) -> bool {
        self.source.is_some()
    }

    pub fn client_connected(&self) -> bool {
        self.client.is_some()
    }

    pub fn source_id(&self) -> Option<PortId> {
        self.source.as_ref().map(Port::id)
    }

    pub fn client_id(&self) -> Option<PortId> {
        self.client.as_ref().map(Port::id)
    }
}

/// tabId → PageState, owned by the coordinator.
#[derive(Debug, Default)]
pub struct Registry {
    tabs: BTreeMap<TabId, PageState>,
}

impl Registry {
    /// Insert on first contact.
    pub fn entry(&mut self, tab: TabId) -> &mut PageState {
        self.tabs.entry(tab).or_insert_with(|| PageState::new(tab))
    }

    pub fn get(&self, tab: TabId) -> Option<&PageState> {
        self.tabs.get(&tab)
    }

    pub fn get_mut(&mut self, tab: TabId) -> Option<&mut PageState> {
        self.tabs.get_mut(&tab)
    }

    pub fn evict(&mut self, tab: TabId) -> Option<PageState> {
        self.tabs.remove(&tab)
    }

    /// Tab whose registered client is `port`.
    pub fn tab_of_client(&self, port: PortId) -> Option<TabId> {
        self.tabs
            .values()
            .find(|s| s.client_id() == Some(port))
            .map(|s| s.tab_id)
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn tabs(&self) -> impl Iterator<Item = &PageState> {
        self.tabs.values()
    }
}
