//! Food pellet.

use super::EntityId;
use glam::Vec2;

/// A fixed-mass pellet consumable by blobs.
#[derive(Debug, Clone)]
pub struct Food {
    pub id: EntityId,
    pub position: Vec2,
    pub mass: f32,
}

impl Food {
    pub fn new(id: EntityId, position: Vec2, mass: f32) -> Self {
        Self { id, position, mass }
    }
}
