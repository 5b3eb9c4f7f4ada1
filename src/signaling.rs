//! WebSocket signaling for multi-party rooms: membership, presence, chat,
//! and blind relay of negotiation payloads

mod actor;
mod chat;
mod hub;
mod messages;
mod presence;
mod registry;
mod rooms;
mod router;
mod server;
mod types;

pub use actor::RoomManagerHandle;
pub use chat::broadcast;
pub use hub::Hub;
pub use messages::{ClientMessage, ServerMessage};
pub use presence::{announce_join, announce_leave};
pub use registry::ConnectionRegistry;
pub use rooms::{JoinOutcome, RoomStore};
pub use router::{RelayOutcome, relay};
pub use server::SignalingServer;
pub use types::{
    ConnectionId, MAX_DISPLAY_NAME_LEN, MAX_ROOM_ID_LEN, NegotiationKind, OutboundMessage,
    Participant, ParticipantInfo, RoomId, SignalingError, parse_display_name,
};
