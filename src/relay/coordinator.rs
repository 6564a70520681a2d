use std::collections::HashSet;

use tracing::{debug, info};

use crate::{
    form::form_model::FormSnapshot,
    relay::{
        badge::{Badge, BadgeSink},
        message::{ClientMessage, ClientRequest, SourceCommand, SourceMessage, timestamp_ms},
        port::{Port, PortId},
        registry::{PageState, Registry, TabId},
    },
    trace::{logger::TraceLogger, trace::TraceEvent},
};

/// Single source of truth for the latest snapshot per tab, and router between
/// at most one Relay-Source and one Inspector Client per tab.
///
/// Every handler runs to completion and leaves the registry consistent;
/// nothing outside these handlers touches it.
pub struct Coordinator<B: BadgeSink> {
    registry: Registry,
    badges: B,
    active_tab: Option<TabId>,
    /// Ports that belonged to a removed tab.
    retired: HashSet<PortId>,
    trace: TraceLogger,
}

impl<B: BadgeSink> Coordinator<B> {
    pub fn new(badges: B) -> Self {
        Self {
            registry: Registry::default(),
            badges,
            active_tab: None,
            retired: HashSet::new(),
            trace: TraceLogger::disabled(),
        }
    }

    pub fn with_trace(mut self, trace: TraceLogger) -> Self {
        self.trace = trace;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn page(&self, tab: TabId) -> Option<&PageState> {
        self.registry.get(tab)
    }

    pub fn badges(&self) -> &B {
        &self.badges
    }

    pub fn active_tab(&self) -> Option<TabId> {
        self.active_tab
    }

    /// Ports of removed tabs still waiting for their disconnect.
    pub fn retired_ports(&self) -> usize {
        self.retired.len()
    }

    pub fn set_active_tab(&mut self, tab: Option<TabId>) {
        self.active_tab = tab;
    }

    // ------------------------------------------------------------------------
    // Relay-Source side
    // ------------------------------------------------------------------------

    pub fn connect_source(&mut self, tab: TabId, port: Port<SourceCommand>) {
        let id = port.id();
        let state = self.registry.entry(tab);
        if let Some(previous) = state.source_id() {
            debug!(%tab, %previous, "source superseded");
        }
        state.source = Some(port);

        info!(%tab, port = %id, "source connected");
        self.trace
            .log(&TraceEvent::now("source-connected").with_tab(tab).with_port(id));
    }

    pub fn on_source_message(&mut self, tab: TabId, port: &Port<SourceCommand>, msg: SourceMessage) {
        if self.retired.contains(&port.id()) {
            debug!(%tab, port = %port.id(), "message from retired source ignored");
            return;
        }

        let state = self.registry.entry(tab);
        if state.source_id() != Some(port.id()) {
            debug!(%tab, port = %port.id(), "source replaced by message sender");
            state.source = Some(port.clone());
        }

        match msg {
            SourceMessage::StateUpdate { forms, timestamp } => {
                self.accept_forms(tab, forms, timestamp, "state-update");
            }
            SourceMessage::CurrentState { forms, timestamp } => {
                self.accept_forms(tab, forms, timestamp, "current-state");
            }
            SourceMessage::CountUpdate { count } => {
                state.reported_count = Some(count);
                debug!(%tab, count, "count update recorded");
            }
        }
    }

    pub fn source_disconnected(&mut self, tab: TabId, port: PortId) {
        // Last word from a removed tab's port.
        if self.retired.remove(&port) {
            return;
        }
        match self.registry.get(tab) {
            Some(state) if state.source_id() == Some(port) => self.drop_source(tab, "disconnected"),
            Some(_) => debug!(%tab, %port, "superseded source disconnected"),
            None => {}
        }
    }

    // ------------------------------------------------------------------------
    // Inspector Client side
    // ------------------------------------------------------------------------

    /// Bind the client to the active tab, answer from cache, then ask the
    /// source for a fresh snapshot.
    pub fn connect_client(&mut self, port: Port<ClientMessage>) -> Option<TabId> {
        let Some(tab) = self.active_tab else {
            debug!(port = %port.id(), "no active tab, client dropped");
            return None;
        };

        let id = port.id();
        let state = self.registry.entry(tab);
        state.client = Some(port);

        info!(%tab, port = %id, "client connected");
        self.trace
            .log(&TraceEvent::now("client-connected").with_tab(tab).with_port(id));

        self.reply_cached(tab);
        self.query_source(tab);
        Some(tab)
    }

    pub fn on_client_request(&mut self, port: PortId, req: ClientRequest) {
        let Some(tab) = self.registry.tab_of_client(port) else {
            debug!(%port, ?req, "request from unregistered client ignored");
            return;
        };

        match req {
            ClientRequest::GetCurrentState => {
                self.reply_cached(tab);
                self.query_source(tab);
            }
            ClientRequest::Refresh => self.send_to_source(tab, SourceCommand::RefreshCommand),
        }
    }

    pub fn client_disconnected(&mut self, port: PortId) {
        if self.retired.remove(&port) {
            return;
        }
        if let Some(tab) = self.registry.tab_of_client(port) {
            if let Some(state) = self.registry.get_mut(tab) {
                state.client = None;
            }
            debug!(%tab, %port, "client disconnected");
        }
    }

    // ------------------------------------------------------------------------
    // Tab lifecycle
    // ------------------------------------------------------------------------

    pub fn tab_removed(&mut self, tab: TabId) {
        if let Some(state) = self.registry.evict(tab) {
            self.retired.extend(state.source_id());
            self.retired.extend(state.client_id());
        }
        if self.active_tab == Some(tab) {
            self.active_tab = None;
        }

        let badge = Badge::neutral();
        self.badges.set_badge(tab, &badge);

        info!(%tab, "tab removed");
        self.trace
            .log(&TraceEvent::now("tab-removed").with_tab(tab).with_badge(&badge));
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn accept_forms(&mut self, tab: TabId, forms: Vec<FormSnapshot>, timestamp: u64, kind: &str) {
        let state = self.registry.entry(tab);
        state.replace_forms(forms);

        let count = state.forms().len();
        let badge = Badge::for_count(count);
        self.badges.set_badge(tab, &badge);

        if let Some(client) = &state.client {
            let update = ClientMessage::StateUpdate {
                forms: state.forms().to_vec(),
                timestamp,
            };
            if let Err(e) = client.post(update) {
                debug!(%tab, error = %e, "client gone, reference cleared");
                state.client = None;
            }
        }

        self.trace.log(
            &TraceEvent::now(kind)
                .with_tab(tab)
                .with_forms(count)
                .with_badge(&badge),
        );
    }

    fn reply_cached(&mut self, tab: TabId) {
        let Some(state) = self.registry.get_mut(tab) else {
            return;
        };
        let Some(client) = &state.client else {
            return;
        };

        let reply = ClientMessage::StateUpdate {
            forms: state.forms().to_vec(),
            timestamp: timestamp_ms(),
        };
        if let Err(e) = client.post(reply) {
            debug!(%tab, error = %e, "client gone before cached reply");
            state.client = None;
        }
    }

    fn query_source(&mut self, tab: TabId) {
        self.send_to_source(tab, SourceCommand::QueryCurrentState);
    }

    /// No registered source means the command is dropped.
    fn send_to_source(&mut self, tab: TabId, command: SourceCommand) {
        let Some(source) = self.registry.get(tab).and_then(|s| s.source.as_ref()) else {
            debug!(%tab, ?command, "no source registered, command dropped");
            return;
        };

        if let Err(e) = source.post(command) {
            debug!(%tab, error = %e, "source unreachable");
            self.drop_source(tab, "send-failed");
        }
    }

    fn drop_source(&mut self, tab: TabId, note: &str) {
        let Some(state) = self.registry.get_mut(tab) else {
            return;
        };
        state.source = None;
        state.replace_forms(vec![]);

        let badge = Badge::neutral();
        self.badges.set_badge(tab, &badge);

        info!(%tab, note, "source dropped, cache cleared");
        self.trace.log(
            &TraceEvent::now("source-dropped")
                .with_tab(tab)
                .with_badge(&badge)
                .with_note(note),
        );
    }
}
