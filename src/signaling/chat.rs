use tracing::{debug, warn};

use super::messages::ServerMessage;
use super::registry::ConnectionRegistry;
use super::rooms::RoomStore;
use super::types::{ConnectionId, RoomId};

/// Fan a chat line out to every member of the room, sender included.
/// Returns how many members it reached.
pub fn broadcast(
    connections: &ConnectionRegistry,
    rooms: &RoomStore,
    room_id: &RoomId,
    sender_id: &ConnectionId,
    text: String,
) -> usize {
    let members = rooms.members(room_id);
    let Some(sender) = members.iter().find(|p| p.connection_id == *sender_id) else {
        debug!("Ignoring chat from {}: not in room {}", sender_id, room_id);
        return 0;
    };

    let msg = ServerMessage::ReceiveMessage {
        sender_id: *sender_id,
        display_name: sender.display_name.clone(),
        text,
    };
    let msg = match msg.encode() {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to encode chat from {}: {}", sender_id, e);
            return 0;
        }
    };

    members
        .iter()
        .filter(|member| connections.send(&member.connection_id, msg.clone()))
        .count()
}
