use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{ConnectionId, NegotiationKind, OutboundMessage, ParticipantInfo, RoomId};

/// Messages sent from client to server
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Join a room by id, creating it if nobody is in it yet
    JoinRoom { room_id: String, display_name: String },

    /// Leave the current room
    LeaveRoom,

    Offer { target_id: ConnectionId, payload: Value },

    Answer { target_id: ConnectionId, payload: Value },

    IceCandidate { target_id: ConnectionId, payload: Value },

    /// Chat to everyone in the current room
    SendMessage { text: String },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// First message on every connection
    Connected { your_id: ConnectionId },

    /// Members already in the room, in join order (sent to the joiner only)
    ExistingMembers {
        room_id: RoomId,
        members: Vec<ParticipantInfo>,
    },

    ParticipantJoined { participant: ParticipantInfo },

    ParticipantLeft { participant: ParticipantInfo },

    Offer { sender_id: ConnectionId, payload: Value },

    Answer { sender_id: ConnectionId, payload: Value },

    IceCandidate { sender_id: ConnectionId, payload: Value },

    ReceiveMessage {
        sender_id: ConnectionId,
        display_name: String,
        text: String,
    },

    /// Error response
    Error { message: String },
}

impl ServerMessage {
    pub fn negotiation(kind: NegotiationKind, sender_id: ConnectionId, payload: Value) -> Self {
        match kind {
            NegotiationKind::Offer => ServerMessage::Offer { sender_id, payload },
            NegotiationKind::Answer => ServerMessage::Answer { sender_id, payload },
            NegotiationKind::IceCandidate => ServerMessage::IceCandidate { sender_id, payload },
        }
    }

    pub fn encode(&self) -> Result<OutboundMessage, serde_json::Error> {
        serde_json::to_string(self).map(OutboundMessage::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_join_room() {
        let json = r#"{"type": "join-room", "room_id": "standup", "display_name": "alice"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        if let ClientMessage::JoinRoom {
            room_id,
            display_name,
        } = msg
        {
            assert_eq!(room_id, "standup");
            assert_eq!(display_name, "alice");
        } else {
            panic!("Expected JoinRoom");
        }
    }

    #[test]
    fn parse_leave_room() {
        let json = r#"{"type": "leave-room"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::LeaveRoom));
    }

    #[test]
    fn parse_ice_candidate_keeps_payload() {
        let json = r#"{"type": "ice-candidate", "target_id": "conn_0000beef",
                       "payload": {"candidate": "candidate:1 1 udp 2122 10.0.0.1 5000 typ host",
                                   "sdpMLineIndex": 0}}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        if let ClientMessage::IceCandidate { target_id, payload } = msg {
            assert_eq!(target_id, ConnectionId::from("conn_0000beef"));
            assert_eq!(payload["sdpMLineIndex"], json!(0));
        } else {
            panic!("Expected IceCandidate");
        }
    }

    #[test]
    fn parse_send_message() {
        let json = r#"{"type": "send-message", "text": "hi"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::SendMessage { ref text } if text == "hi"));
    }

    #[test]
    fn parse_unknown_type_fails() {
        let json = r#"{"type": "create_room"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn serialize_connected() {
        let msg = ServerMessage::Connected {
            your_id: ConnectionId::from("conn_abc12345"),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"connected","your_id":"conn_abc12345"}"#);
    }

    #[test]
    fn serialize_existing_members() {
        let msg = ServerMessage::ExistingMembers {
            room_id: RoomId::parse("standup").unwrap(),
            members: vec![ParticipantInfo {
                id: ConnectionId::from("conn_existing"),
                display_name: "bob".to_string(),
            }],
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"existing-members""#));
        assert!(json.contains("conn_existing"));
        assert!(json.contains("bob"));
    }

    #[test]
    fn serialize_negotiation_tags_sender() {
        let payload = json!({"type": "offer", "sdp": "v=0\r\n"});
        let msg = ServerMessage::negotiation(
            NegotiationKind::Offer,
            ConnectionId::from("conn_sender00"),
            payload.clone(),
        );
        let value: Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "offer");
        assert_eq!(value["sender_id"], "conn_sender00");
        assert_eq!(value["payload"], payload);
    }

    #[test]
    fn serialize_receive_message() {
        let msg = ServerMessage::ReceiveMessage {
            sender_id: ConnectionId::from("conn_aaaaaaaa"),
            display_name: "alice".to_string(),
            text: "hi".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("receive-message"));
        assert!(json.contains(r#""text":"hi""#));
    }

    #[test]
    fn encode_round_trips_through_outbound() {
        let msg = ServerMessage::Error {
            message: "already in room: x".to_string(),
        };
        let outbound = msg.encode().unwrap();
        let decoded: ServerMessage = serde_json::from_str(outbound.as_str()).unwrap();
        assert_eq!(decoded, msg);
    }
}
