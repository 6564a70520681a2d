use tokio::sync::mpsc;

use crate::{
    error::InspectorError,
    relay::message::{ClientMessage, ClientRequest},
};

/// On-demand inspector surface: asks for the current snapshot, issues
/// refreshes, and receives pushed updates while it stays open.
///
/// Dropping the client disconnects it.
#[derive(Debug)]
pub struct InspectorClient {
    requests: mpsc::UnboundedSender<ClientRequest>,
    updates: mpsc::UnboundedReceiver<ClientMessage>,
}

impl InspectorClient {
    pub(crate) fn new(
        requests: mpsc::UnboundedSender<ClientRequest>,
        updates: mpsc::UnboundedReceiver<ClientMessage>,
    ) -> Self {
        Self { requests, updates }
    }

    pub fn get_current_state(&self) -> Result<(), InspectorError> {
        self.request(ClientRequest::GetCurrentState)
    }

    /// Fire-and-forget; a tab without a source silently ignores it.
    pub fn refresh(&self) -> Result<(), InspectorError> {
        self.request(ClientRequest::Refresh)
    }

    /// Next pushed state-update; `None` once the coordinator dropped this client.
    pub async fn next_update(&mut self) -> Option<ClientMessage> {
        self.updates.recv().await
    }

    pub fn try_next_update(&mut self) -> Option<ClientMessage> {
        self.updates.try_recv().ok()
    }

    fn request(&self, req: ClientRequest) -> Result<(), InspectorError> {
        self.requests
            .send(req)
            .map_err(|_| InspectorError::SendFailure {
                role: "popup",
                reason: "coordinator connection closed".into(),
            })
    }
}
