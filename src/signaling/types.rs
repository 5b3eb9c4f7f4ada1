use std::fmt;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tokio_tungstenite::tungstenite::Utf8Bytes;

/// Signaling errors reported back to the requesting connection
#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("already in room: {0}")]
    AlreadyInRoom(RoomId),

    #[error("invalid room id: {0}")]
    InvalidRoomId(String),

    #[error("invalid display name: {0}")]
    InvalidDisplayName(String),

    #[error("internal error: {0}")]
    Internal(String),
}

const CONNECTION_ID_LEN: usize = 13;
const CONNECTION_ID_PREFIX: &[u8] = b"conn_";
const HEX_CHARS: &[u8] = b"0123456789abcdef";

pub const MAX_ROOM_ID_LEN: usize = 64;
pub const MAX_DISPLAY_NAME_LEN: usize = 64;

/// Connection ID: 13-byte fixed array ("conn_" + 8 hex)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId {
    bytes: [u8; CONNECTION_ID_LEN],
    len: u8,
}

impl ConnectionId {
    /// Never produced by `generate`, so it never names a registered connection
    pub const UNASSIGNED: ConnectionId = ConnectionId {
        bytes: [0; CONNECTION_ID_LEN],
        len: 0,
    };

    pub fn generate() -> Self {
        let mut bytes = [0u8; CONNECTION_ID_LEN];
        bytes[..CONNECTION_ID_PREFIX.len()].copy_from_slice(CONNECTION_ID_PREFIX);

        let value: u32 = rand::rng().random();
        for i in 0..8 {
            let nibble = ((value >> (28 - i * 4)) & 0xF) as usize;
            bytes[CONNECTION_ID_PREFIX.len() + i] = HEX_CHARS[nibble];
        }
        Self {
            bytes,
            len: CONNECTION_ID_LEN as u8,
        }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        let mut bytes = [0u8; CONNECTION_ID_LEN];
        let src = s.as_bytes();
        let len = src.len().min(CONNECTION_ID_LEN);
        bytes[..len].copy_from_slice(&src[..len]);
        Self {
            bytes,
            len: len as u8,
        }
    }
}

impl Serialize for ConnectionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ConnectionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        // truncating would alias a live id; map to one nobody holds instead
        if s.len() > CONNECTION_ID_LEN {
            return Ok(ConnectionId::UNASSIGNED);
        }
        Ok(ConnectionId::from(s.as_str()))
    }
}

/// Client-chosen room identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Trim and validate a room id supplied by a client
    pub fn parse(raw: &str) -> Result<Self, SignalingError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SignalingError::InvalidRoomId("empty".to_string()));
        }
        if trimmed.len() > MAX_ROOM_ID_LEN {
            return Err(SignalingError::InvalidRoomId(format!(
                "longer than {} bytes",
                MAX_ROOM_ID_LEN
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim and validate a display name supplied by a client
pub fn parse_display_name(raw: &str) -> Result<String, SignalingError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SignalingError::InvalidDisplayName("empty".to_string()));
    }
    if trimmed.len() > MAX_DISPLAY_NAME_LEN {
        return Err(SignalingError::InvalidDisplayName(format!(
            "longer than {} bytes",
            MAX_DISPLAY_NAME_LEN
        )));
    }
    Ok(trimmed.to_string())
}

/// A connection's membership in one room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub connection_id: ConnectionId,
    pub display_name: String,
    pub room_id: RoomId,
    pub join_sequence: u64,
}

impl Participant {
    pub fn info(&self) -> ParticipantInfo {
        ParticipantInfo {
            id: self.connection_id,
            display_name: self.display_name.clone(),
        }
    }
}

/// Public view of a participant, as sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub id: ConnectionId,
    pub display_name: String,
}

/// Which negotiation event a relayed payload belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationKind {
    Offer,
    Answer,
    IceCandidate,
}

impl fmt::Display for NegotiationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NegotiationKind::Offer => "offer",
            NegotiationKind::Answer => "answer",
            NegotiationKind::IceCandidate => "ice-candidate",
        })
    }
}

/// Wrapper for outbound WebSocket messages using tungstenite's Utf8Bytes.
#[derive(Debug, Clone)]
pub struct OutboundMessage(Utf8Bytes);

impl OutboundMessage {
    /// Create a new outbound message from any string type
    pub fn new(s: impl Into<Utf8Bytes>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Get the inner Utf8Bytes for tungstenite Message::Text
    pub fn into_inner(self) -> Utf8Bytes {
        self.0
    }
}

impl From<String> for OutboundMessage {
    fn from(s: String) -> Self {
        Self(Utf8Bytes::from(s))
    }
}
