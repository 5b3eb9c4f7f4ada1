use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;

use super::types::{ConnectionId, OutboundMessage, Participant};

#[derive(Debug)]
struct ConnectionEntry {
    /// Channel for outbound messages to this connection.
    /// OutboundMessage is cheap to clone for fan-out.
    tx: mpsc::UnboundedSender<OutboundMessage>,
    participant: Option<Participant>,
}

/// Live connections and the participant record each one currently holds
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly opened connection under a fresh id
    pub fn register(&mut self, tx: mpsc::UnboundedSender<OutboundMessage>) -> ConnectionId {
        let mut id = ConnectionId::generate();
        while self.connections.contains_key(&id) {
            id = ConnectionId::generate();
        }
        self.connections.insert(
            id,
            ConnectionEntry {
                tx,
                participant: None,
            },
        );
        id
    }

    /// Forget a connection. Returns the participant it still held, if any.
    /// Unknown ids are a no-op.
    pub fn unregister(&mut self, id: &ConnectionId) -> Option<Participant> {
        self.connections
            .remove(id)
            .and_then(|entry| entry.participant)
    }

    pub fn lookup(&self, id: &ConnectionId) -> Option<&Participant> {
        self.connections
            .get(id)
            .and_then(|entry| entry.participant.as_ref())
    }

    pub fn is_registered(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    /// Attach a participant record to a registered connection.
    /// Returns false if the connection is gone.
    pub fn bind(&mut self, id: &ConnectionId, participant: Participant) -> bool {
        match self.connections.get_mut(id) {
            Some(entry) => {
                entry.participant = Some(participant);
                true
            }
            None => false,
        }
    }

    pub fn unbind(&mut self, id: &ConnectionId) -> Option<Participant> {
        self.connections
            .get_mut(id)
            .and_then(|entry| entry.participant.take())
    }

    /// Targeted send. Returns false if the connection is unknown or its
    /// writer has already gone away.
    pub fn send(&self, id: &ConnectionId, msg: OutboundMessage) -> bool {
        match self.connections.get(id) {
            Some(entry) => {
                if entry.tx.send(msg).is_err() {
                    debug!("Outbound channel closed for {}", id);
                    return false;
                }
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
