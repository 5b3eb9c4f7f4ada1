use serde_json::Value;
use tracing::{debug, warn};

use super::messages::ServerMessage;
use super::registry::ConnectionRegistry;
use super::types::{ConnectionId, NegotiationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Delivered,
    /// Target is not connected; the payload was dropped
    TargetNotFound,
    /// Target is registered but the payload could not be encoded or its
    /// outbound channel is already closed
    Dropped,
}

/// Forward an opaque negotiation payload to one connection, tagged with
/// the sender's id. Fire-and-forget: the sender is never told about drops.
pub fn relay(
    connections: &ConnectionRegistry,
    kind: NegotiationKind,
    payload: Value,
    sender_id: ConnectionId,
    target_id: ConnectionId,
) -> RelayOutcome {
    if !connections.is_registered(&target_id) {
        debug!(
            "Dropping {} from {}: target {} not connected",
            kind, sender_id, target_id
        );
        return RelayOutcome::TargetNotFound;
    }

    let msg = match ServerMessage::negotiation(kind, sender_id, payload).encode() {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to encode {} from {}: {}", kind, sender_id, e);
            return RelayOutcome::Dropped;
        }
    };

    if connections.send(&target_id, msg) {
        debug!("Relayed {} {} -> {}", kind, sender_id, target_id);
        RelayOutcome::Delivered
    } else {
        RelayOutcome::Dropped
    }
}
