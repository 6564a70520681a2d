use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{
    error::InspectorError,
    relay::{
        badge::BadgeSink,
        coordinator::Coordinator,
        message::{ClientMessage, ClientRequest, PortRole, SourceCommand, SourceMessage},
        port::{Port, PortId},
        registry::TabId,
    },
    runtime::client::InspectorClient,
};

#[derive(Debug)]
pub enum CoordinatorEvent {
    SourceConnected {
        tab: TabId,
        port: Port<SourceCommand>,
    },
    SourceMessage {
        tab: TabId,
        port: Port<SourceCommand>,
        msg: SourceMessage,
    },
    SourceDisconnected {
        tab: TabId,
        port: PortId,
    },
    ClientConnected {
        port: Port<ClientMessage>,
    },
    ClientRequest {
        port: PortId,
        req: ClientRequest,
    },
    ClientDisconnected {
        port: PortId,
    },
    ActiveTab(Option<TabId>),
    TabRemoved(TabId),
    Shutdown,
}

/// Relay-Source end of a coordinator connection.
#[derive(Debug)]
pub struct SourceLink {
    pub outbound: mpsc::UnboundedSender<SourceMessage>,
    pub inbound: mpsc::UnboundedReceiver<SourceCommand>,
}

/// Either end a named connect resolves to.
#[derive(Debug)]
pub enum Connection {
    Source(SourceLink),
    Client(InspectorClient),
}

#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    events: mpsc::UnboundedSender<CoordinatorEvent>,
}

impl CoordinatorHandle {
    /// Route a connection by its port name. Unknown names are ignored.
    pub fn connect(&self, name: &str, tab: TabId) -> Result<Option<Connection>, InspectorError> {
        match PortRole::from_name(name) {
            Some(PortRole::Source) => self.connect_source(tab).map(|l| Some(Connection::Source(l))),
            Some(PortRole::Client) => self.connect_client().map(|c| Some(Connection::Client(c))),
            None => {
                debug!(name, "connection with unknown port name ignored");
                Ok(None)
            }
        }
    }

    /// Open a named connection the way a port connect does; fails when the
    /// coordinator is no longer running.
    pub fn connect_source(&self, tab: TabId) -> Result<SourceLink, InspectorError> {
        let (port, inbound) = Port::channel(PortRole::Source);
        let (outbound, mut messages) = mpsc::unbounded_channel::<SourceMessage>();

        self.send(CoordinatorEvent::SourceConnected {
            tab,
            port: port.clone(),
        })
        .map_err(|_| InspectorError::ConnectFailure("coordinator not running".into()))?;

        let events = self.events.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    msg = messages.recv() => match msg {
                        Some(msg) => {
                            let event = CoordinatorEvent::SourceMessage { tab, port: port.clone(), msg };
                            if events.send(event).is_err() {
                                return;
                            }
                        }
                        None => break,
                    },
                    _ = events.closed() => return,
                }
            }
            let _ = events.send(CoordinatorEvent::SourceDisconnected { tab, port: port.id() });
        });

        Ok(SourceLink { outbound, inbound })
    }

    pub fn connect_client(&self) -> Result<InspectorClient, InspectorError> {
        let (port, updates) = Port::channel(PortRole::Client);
        let (requests, mut incoming) = mpsc::unbounded_channel::<ClientRequest>();
        let id = port.id();

        self.send(CoordinatorEvent::ClientConnected { port })
            .map_err(|_| InspectorError::ConnectFailure("coordinator not running".into()))?;

        let events = self.events.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    req = incoming.recv() => match req {
                        Some(req) => {
                            if events.send(CoordinatorEvent::ClientRequest { port: id, req }).is_err() {
                                return;
                            }
                        }
                        None => break,
                    },
                    _ = events.closed() => return,
                }
            }
            let _ = events.send(CoordinatorEvent::ClientDisconnected { port: id });
        });

        Ok(InspectorClient::new(requests, updates))
    }

    pub fn set_active_tab(&self, tab: Option<TabId>) {
        let _ = self.send(CoordinatorEvent::ActiveTab(tab));
    }

    pub fn tab_removed(&self, tab: TabId) {
        let _ = self.send(CoordinatorEvent::TabRemoved(tab));
    }

    pub fn shutdown(&self) {
        let _ = self.send(CoordinatorEvent::Shutdown);
    }

    fn send(&self, event: CoordinatorEvent) -> Result<(), InspectorError> {
        self.events
            .send(event)
            .map_err(|_| InspectorError::ConnectFailure("coordinator channel closed".into()))
    }
}

/// Run the coordinator until [`CoordinatorHandle::shutdown`]; the task hands
/// the coordinator back so its final state can be inspected.
pub fn spawn_coordinator<B>(coordinator: Coordinator<B>) -> (CoordinatorHandle, JoinHandle<Coordinator<B>>)
where
    B: BadgeSink + 'static,
{
    let (events, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(coordinator, rx));
    (CoordinatorHandle { events }, task)
}

async fn run<B: BadgeSink>(
    mut coordinator: Coordinator<B>,
    mut rx: mpsc::UnboundedReceiver<CoordinatorEvent>,
) -> Coordinator<B> {
    info!("coordinator started");

    while let Some(event) = rx.recv().await {
        match event {
            CoordinatorEvent::SourceConnected { tab, port } => coordinator.connect_source(tab, port),
            CoordinatorEvent::SourceMessage { tab, port, msg } => {
                coordinator.on_source_message(tab, &port, msg)
            }
            CoordinatorEvent::SourceDisconnected { tab, port } => {
                coordinator.source_disconnected(tab, port)
            }
            CoordinatorEvent::ClientConnected { port } => {
                if coordinator.connect_client(port).is_none() {
                    debug!("client connected without an active tab");
                }
            }
            CoordinatorEvent::ClientRequest { port, req } => coordinator.on_client_request(port, req),
            CoordinatorEvent::ClientDisconnected { port } => coordinator.client_disconnected(port),
            CoordinatorEvent::ActiveTab(tab) => coordinator.set_active_tab(tab),
            CoordinatorEvent::TabRemoved(tab) => coordinator.tab_removed(tab),
            CoordinatorEvent::Shutdown => break,
        }
    }

    info!("coordinator stopped");
    coordinator
}
