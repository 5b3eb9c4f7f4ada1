use std::collections::HashMap;

use tracing::info;

use super::types::{ConnectionId, Participant, RoomId, SignalingError};

#[derive(Debug, Default)]
struct Room {
    /// Join order. Leaving never reorders the rest.
    participants: Vec<Participant>,
}

/// Result of a successful join
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub joined: Participant,
    /// Members present before the join, excluding the joiner
    pub existing: Vec<Participant>,
}

/// Rooms keyed by id. A room exists only while it has members.
#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: HashMap<RoomId, Room>,
    next_sequence: u64,
}

impl RoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a participant to a room, creating the room if needed
    pub fn join(
        &mut self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        display_name: String,
    ) -> Result<JoinOutcome, SignalingError> {
        if self.rooms.get(room_id).is_some_and(|room| {
            room.participants
                .iter()
                .any(|p| p.connection_id == connection_id)
        }) {
            return Err(SignalingError::AlreadyInRoom(room_id.clone()));
        }

        let room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Room created: {}", room_id);
            Room::default()
        });

        let existing = room.participants.clone();
        let joined = Participant {
            connection_id,
            display_name,
            room_id: room_id.clone(),
            join_sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        room.participants.push(joined.clone());

        info!(
            "Participant {} ({}) joined room {}",
            connection_id, joined.display_name, room_id
        );
        Ok(JoinOutcome { joined, existing })
    }

    /// Remove a participant; the room goes away with its last member
    pub fn leave(&mut self, room_id: &RoomId, connection_id: &ConnectionId) -> Option<Participant> {
        let room = self.rooms.get_mut(room_id)?;
        let index = room
            .participants
            .iter()
            .position(|p| p.connection_id == *connection_id)?;
        let removed = room.participants.remove(index);

        if room.participants.is_empty() {
            self.rooms.remove(room_id);
            info!("Room {} removed (empty)", room_id);
        }
        info!("Participant {} left room {}", connection_id, room_id);
        Some(removed)
    }

    pub fn members(&self, room_id: &RoomId) -> &[Participant] {
        self.rooms
            .get(room_id)
            .map(|room| room.participants.as_slice())
            .unwrap_or(&[])
    }

    pub fn snapshot(&self, room_id: &RoomId) -> Vec<Participant> {
        self.members(room_id).to_vec()
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
