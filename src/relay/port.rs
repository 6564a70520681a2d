use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use crate::error::InspectorError;
use crate::relay::message::PortRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(pub u64);

impl PortId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        PortId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port-{}", self.0)
    }
}

/// Sending half of one named connection.
///
/// Posting never blocks; it fails once the receiving side has gone away.
#[derive(Debug)]
pub struct Port<M> {
    id: PortId,
    role: PortRole,
    tx: mpsc::UnboundedSender<M>,
}

impl<M> Clone for Port<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            role: self.role,
            tx: self.tx.clone(),
        }
    }
}

impl<M> Port<M> {
    pub fn new(role: PortRole, tx: mpsc::UnboundedSender<M>) -> Self {
        Self {
            id: PortId::next(),
            role,
            tx,
        }
    }

    /// A fresh port together with the receiver its messages arrive on.
    pub fn channel(role: PortRole) -> (Self, mpsc::UnboundedReceiver<M>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(role, tx), rx)
    }

    pub fn id(&self) -> PortId {
        self.id
    }

    pub fn role(&self) -> PortRole {
        self.role
    }

    pub fn post(&self, msg: M) -> Result<(), InspectorError> {
        self.tx.send(msg).map_err(|_| InspectorError::SendFailure {
            role: self.role.name(),
            reason: format!("{} closed", self.id),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
