//! Player-controlled blob.

use super::{EntityId, PlayerId};
use crate::collision::radius_for_mass;
use glam::Vec2;

/// A single controllable mass unit owned by a player.
#[derive(Debug, Clone)]
pub struct Blob {
    pub id: EntityId,
    pub owner: PlayerId,
    pub position: Vec2,
    /// World position the blob steers toward.
    pub target: Vec2,
    /// Always > 0; a blob that would reach zero is removed instead.
    pub mass: f32,
    /// Decaying impulse applied after a split.
    pub boost: Option<Boost>,
    /// Tick from which this blob may merge with a sibling.
    pub merge_at: u64,
}

impl Blob {
    pub fn new(id: EntityId, owner: PlayerId, position: Vec2, mass: f32) -> Self {
        Self {
            id,
            owner,
            position,
            target: position,
            mass,
            boost: None,
            merge_at: 0,
        }
    }

    /// Radius grows monotonically with mass.
    #[inline]
    pub fn radius(&self) -> f32 {
        radius_for_mass(self.mass)
    }

    /// Start a split impulse toward `direction` (normalized by the caller).
    pub fn set_boost(&mut self, distance: f32, direction: Vec2) {
        self.boost = Some(Boost {
            distance,
            direction,
        });
    }

    /// Advance the impulse: move a tenth of the remaining distance each
    /// tick, drop the boost once it has nearly run out.
    ///
    /// Returns the displacement applied this tick.
    pub fn update_boost(&mut self) -> Vec2 {
        let Some(boost) = &mut self.boost else {
            return Vec2::ZERO;
        };
        if boost.distance < 1.0 {
            self.boost = None;
            return Vec2::ZERO;
        }
        let step = boost.distance / 10.0;
        boost.distance -= step;
        let delta = boost.direction * step;
        self.position += delta;
        delta
    }
}

/// Split impulse state.
#[derive(Debug, Clone, Copy)]
pub struct Boost {
    /// Remaining distance to travel.
    pub distance: f32,
    /// Direction vector (normalized).
    pub direction: Vec2,
}
