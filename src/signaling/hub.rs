use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::chat;
use super::messages::ServerMessage;
use super::presence;
use super::registry::ConnectionRegistry;
use super::rooms::RoomStore;
use super::router::{self, RelayOutcome};
use super::types::{
    ConnectionId, NegotiationKind, OutboundMessage, Participant, RoomId, SignalingError,
};

/// Owns all membership state. Every operation runs to completion before the
/// next one starts, so snapshots and broadcasts never interleave.
#[derive(Debug, Default)]
pub struct Hub {
    connections: ConnectionRegistry,
    rooms: RoomStore,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and greet it with its id
    pub fn connect(&mut self, tx: mpsc::UnboundedSender<OutboundMessage>) -> ConnectionId {
        let id = self.connections.register(tx);
        match (ServerMessage::Connected { your_id: id }).encode() {
            Ok(msg) => {
                self.connections.send(&id, msg);
            }
            Err(e) => warn!("Failed to encode greeting for {}: {}", id, e),
        }
        info!("Connection {} opened", id);
        id
    }

    /// Join a room. Joining the current room again is rejected; joining a
    /// different one leaves the old room first.
    pub fn join(
        &mut self,
        id: ConnectionId,
        room_id: RoomId,
        display_name: String,
    ) -> Result<(), SignalingError> {
        if !self.connections.is_registered(&id) {
            return Err(SignalingError::Internal(format!("unknown connection {}", id)));
        }

        let current_room = self.connections.lookup(&id).map(|p| p.room_id.clone());
        if let Some(current_room) = current_room {
            if current_room == room_id {
                return Err(SignalingError::AlreadyInRoom(room_id));
            }
            self.depart(&id);
        }

        let outcome = self.rooms.join(&room_id, id, display_name)?;
        self.connections.bind(&id, outcome.joined.clone());
        presence::announce_join(&self.connections, &outcome.joined, &outcome.existing);
        Ok(())
    }

    /// Explicit leave; the connection stays open
    pub fn leave(&mut self, id: &ConnectionId) -> Option<Participant> {
        self.depart(id)
    }

    /// Transport closed. Safe to call more than once.
    pub fn disconnect(&mut self, id: &ConnectionId) {
        self.depart(id);
        if self.connections.is_registered(id) {
            self.connections.unregister(id);
            info!("Connection {} closed", id);
        }
    }

    pub fn relay(
        &self,
        kind: NegotiationKind,
        payload: Value,
        sender_id: ConnectionId,
        target_id: ConnectionId,
    ) -> RelayOutcome {
        router::relay(&self.connections, kind, payload, sender_id, target_id)
    }

    /// Chat into the sender's current room. Ignored if not joined.
    pub fn chat(&self, id: &ConnectionId, text: String) -> usize {
        match self.connections.lookup(id) {
            Some(sender) => {
                chat::broadcast(&self.connections, &self.rooms, &sender.room_id, id, text)
            }
            None => 0,
        }
    }

    pub fn snapshot(&self, room_id: &RoomId) -> Vec<Participant> {
        self.rooms.snapshot(room_id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }

    fn depart(&mut self, id: &ConnectionId) -> Option<Participant> {
        let participant = self.connections.unbind(id)?;
        let removed = self.rooms.leave(&participant.room_id, id)?;
        presence::announce_leave(&self.connections, &self.rooms, &removed);
        Some(removed)
    }
}
