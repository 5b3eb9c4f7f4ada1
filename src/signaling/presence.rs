use tracing::warn;

use super::messages::ServerMessage;
use super::registry::ConnectionRegistry;
use super::rooms::RoomStore;
use super::types::Participant;

/// Tell the members who were already in the room about the newcomer, then
/// hand the newcomer the pre-join member list.
pub fn announce_join(
    connections: &ConnectionRegistry,
    joined: &Participant,
    existing: &[Participant],
) {
    let notice = ServerMessage::ParticipantJoined {
        participant: joined.info(),
    };
    match notice.encode() {
        Ok(msg) => {
            for member in existing {
                connections.send(&member.connection_id, msg.clone());
            }
        }
        Err(e) => warn!("Failed to encode join notice: {}", e),
    }

    let snapshot = ServerMessage::ExistingMembers {
        room_id: joined.room_id.clone(),
        members: existing.iter().map(Participant::info).collect(),
    };
    match snapshot.encode() {
        Ok(msg) => {
            connections.send(&joined.connection_id, msg);
        }
        Err(e) => warn!("Failed to encode member snapshot: {}", e),
    }
}

/// Tell whoever is still in the departed participant's room. Returns the
/// number of members notified; zero when the room is gone.
pub fn announce_leave(
    connections: &ConnectionRegistry,
    rooms: &RoomStore,
    departed: &Participant,
) -> usize {
    let remaining = rooms.members(&departed.room_id);
    if remaining.is_empty() {
        return 0;
    }

    let notice = ServerMessage::ParticipantLeft {
        participant: departed.info(),
    };
    let msg = match notice.encode() {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to encode leave notice: {}", e);
            return 0;
        }
    };

    remaining
        .iter()
        .filter(|member| connections.send(&member.connection_id, msg.clone()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signaling::types::{ConnectionId, OutboundMessage, RoomId};
    use tokio::sync::mpsc;

    fn recv(rx: &mut mpsc::UnboundedReceiver<OutboundMessage>) -> ServerMessage {
        serde_json::from_str(rx.try_recv().unwrap().as_str()).unwrap()
    }

    #[test]
    fn join_notifies_existing_and_sends_snapshot_to_joiner() {
        let mut connections = ConnectionRegistry::new();
        let mut rooms = RoomStore::new();
        let x = RoomId::parse("x").unwrap();

        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = connections.register(tx_a);
        let b = connections.register(tx_b);

        let first = rooms.join(&x, a, "alice".to_string()).unwrap();
        announce_join(&connections, &first.joined, &first.existing);
        assert_eq!(
            recv(&mut rx_a),
            ServerMessage::ExistingMembers {
                room_id: x.clone(),
                members: vec![]
            }
        );

        let second = rooms.join(&x, b, "bob".to_string()).unwrap();
        announce_join(&connections, &second.joined, &second.existing);
        assert_eq!(
            recv(&mut rx_a),
            ServerMessage::ParticipantJoined {
                participant: second.joined.info()
            }
        );
        assert_eq!(
            recv(&mut rx_b),
            ServerMessage::ExistingMembers {
                room_id: x,
                members: vec![first.joined.info()]
            }
        );
        // nobody hears about themselves
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn leave_notifies_remaining_members() {
        let mut connections = ConnectionRegistry::new();
        let mut rooms = RoomStore::new();
        let x = RoomId::parse("x").unwrap();

        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = connections.register(tx_a);
        let b = connections.register(tx_b);
        rooms.join(&x, a, "alice".to_string()).unwrap();
        rooms.join(&x, b, "bob".to_string()).unwrap();

        let departed = rooms.leave(&x, &a).unwrap();
        assert_eq!(announce_leave(&connections, &rooms, &departed), 1);
        assert_eq!(
            recv(&mut rx_b),
            ServerMessage::ParticipantLeft {
                participant: departed.info()
            }
        );
    }

    #[test]
    fn leave_of_last_member_notifies_nobody() {
        let mut connections = ConnectionRegistry::new();
        let mut rooms = RoomStore::new();
        let x = RoomId::parse("x").unwrap();

        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let a = connections.register(tx_a);
        rooms.join(&x, a, "alice".to_string()).unwrap();

        let departed = rooms.leave(&x, &a).unwrap();
        assert_eq!(announce_leave(&connections, &rooms, &departed), 0);
        assert!(rx_a.try_recv().is_err());
    }

    #[test]
    fn join_skips_members_whose_connection_vanished() {
        let connections = ConnectionRegistry::new();
        let ghost = Participant {
            connection_id: ConnectionId::from("conn_0000dead"),
            display_name: "ghost".to_string(),
            room_id: RoomId::parse("x").unwrap(),
            join_sequence: 0,
        };
        let joined = Participant {
            connection_id: ConnectionId::from("conn_0000beef"),
            display_name: "new".to_string(),
            room_id: RoomId::parse("x").unwrap(),
            join_sequence: 1,
        };
        // neither is registered; must not panic
        announce_join(&connections, &joined, &[ghost]);
    }
}
