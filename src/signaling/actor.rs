use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use super::hub::Hub;
use super::types::{
    ConnectionId, NegotiationKind, OutboundMessage, Participant, RoomId, SignalingError,
};

/// Commands sent to the room manager actor
pub(crate) enum RoomCommand {
    Connect {
        peer_tx: mpsc::UnboundedSender<OutboundMessage>,
        reply: oneshot::Sender<ConnectionId>,
    },
    Join {
        connection_id: ConnectionId,
        room_id: RoomId,
        display_name: String,
        reply: oneshot::Sender<Result<(), SignalingError>>,
    },
    Leave {
        connection_id: ConnectionId,
    },
    Relay {
        kind: NegotiationKind,
        payload: Value,
        sender_id: ConnectionId,
        target_id: ConnectionId,
    },
    Chat {
        connection_id: ConnectionId,
        text: String,
    },
    Disconnect {
        connection_id: ConnectionId,
    },
    Snapshot {
        room_id: RoomId,
        reply: oneshot::Sender<Vec<Participant>>,
    },
}

pub(crate) async fn room_manager_actor(mut rx: mpsc::Receiver<RoomCommand>) {
    let mut hub = Hub::new();

    while let Some(cmd) = rx.recv().await {
        match cmd {
            RoomCommand::Connect { peer_tx, reply } => {
                let id = hub.connect(peer_tx);
                let _ = reply.send(id);
            }

            RoomCommand::Join {
                connection_id,
                room_id,
                display_name,
                reply,
            } => {
                let _ = reply.send(hub.join(connection_id, room_id, display_name));
            }

            RoomCommand::Leave { connection_id } => {
                hub.leave(&connection_id);
            }

            RoomCommand::Relay {
                kind,
                payload,
                sender_id,
                target_id,
            } => {
                hub.relay(kind, payload, sender_id, target_id);
            }

            RoomCommand::Chat {
                connection_id,
                text,
            } => {
                hub.chat(&connection_id, text);
            }

            RoomCommand::Disconnect { connection_id } => {
                hub.disconnect(&connection_id);
            }

            RoomCommand::Snapshot { room_id, reply } => {
                let _ = reply.send(hub.snapshot(&room_id));
            }
        }
    }

    info!(
        "Room manager stopped ({} connections, {} rooms)",
        hub.connection_count(),
        hub.room_count()
    );
}

/// Handle to communicate with the room manager actor
#[derive(Clone)]
pub struct RoomManagerHandle {
    pub(crate) tx: mpsc::Sender<RoomCommand>,
}

impl RoomManagerHandle {
    /// Spawn the actor on the current runtime
    pub fn spawn(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel::<RoomCommand>(capacity);
        tokio::spawn(room_manager_actor(rx));
        Self { tx }
    }

    /// Register a new connection; its outbound channel gets a greeting first
    pub async fn connect(
        &self,
        peer_tx: mpsc::UnboundedSender<OutboundMessage>,
    ) -> Result<ConnectionId, SignalingError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let _ = self
            .tx
            .send(RoomCommand::Connect {
                peer_tx,
                reply: reply_tx,
            })
            .await;
        reply_rx
            .await
            .map_err(|_| SignalingError::Internal("actor channel closed".to_string()))
    }

    /// Join a room, creating it if absent
    pub async fn join_room(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        display_name: String,
    ) -> Result<(), SignalingError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let _ = self
            .tx
            .send(RoomCommand::Join {
                connection_id,
                room_id,
                display_name,
                reply: reply_tx,
            })
            .await;
        reply_rx
            .await
            .map_err(|_| SignalingError::Internal("actor channel closed".to_string()))?
    }

    /// Leave the current room
    pub async fn leave_room(&self, connection_id: ConnectionId) {
        let _ = self.tx.send(RoomCommand::Leave { connection_id }).await;
    }

    pub async fn relay(
        &self,
        kind: NegotiationKind,
        payload: Value,
        sender_id: ConnectionId,
        target_id: ConnectionId,
    ) {
        let _ = self
            .tx
            .send(RoomCommand::Relay {
                kind,
                payload,
                sender_id,
                target_id,
            })
            .await;
    }

    pub async fn send_chat(&self, connection_id: ConnectionId, text: String) {
        let _ = self
            .tx
            .send(RoomCommand::Chat {
                connection_id,
                text,
            })
            .await;
    }

    pub async fn disconnect(&self, connection_id: ConnectionId) {
        let _ = self.tx.send(RoomCommand::Disconnect { connection_id }).await;
    }

    /// Current members of a room, in join order
    pub async fn room_snapshot(&self, room_id: RoomId) -> Result<Vec<Participant>, SignalingError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let _ = self
            .tx
            .send(RoomCommand::Snapshot {
                room_id,
                reply: reply_tx,
            })
            .await;
        reply_rx
            .await
            .map_err(|_| SignalingError::Internal("actor channel closed".to_string()))
    }
}
