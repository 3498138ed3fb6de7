//! Player state.

use super::{EntityId, PlayerId};
use protocol::Color;

/// A joined player and the blobs it owns.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    /// Validated display name, 1..=16 characters.
    pub name: String,
    /// Derived deterministically from the id; stable for the session.
    pub color: Color,
    /// Owned blob ids; kept consistent with the world's blob map.
    pub blobs: Vec<EntityId>,
    /// Tick of the last accepted chat message.
    pub last_chat_tick: Option<u64>,
}

impl Player {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            color: Color::from_id(id),
            blobs: Vec::new(),
            last_chat_tick: None,
        }
    }
}
