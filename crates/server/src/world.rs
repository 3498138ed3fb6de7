//! World state management.
//!
//! The authoritative aggregate of players, blobs, and food. Only the tick
//! loop ever holds a `&mut World`; everything else reads snapshots. All
//! mutation goes through the methods here so the spatial index can never
//! drift out of sync with entity positions.

use crate::collision::radius_for_mass;
use crate::config::{FoodConfig, WorldConfig};
use crate::entity::{Blob, EntityId, Food, Player, PlayerId};
use crate::spatial::SpatialGrid;
use glam::Vec2;
use rand::Rng;
use std::collections::HashMap;

/// World border bounds, centered on the origin.
#[derive(Debug, Clone, Copy)]
pub struct Border {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Border {
    pub fn new(width: f32, height: f32) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Self {
            min_x: -half_w,
            min_y: -half_h,
            max_x: half_w,
            max_y: half_h,
            width,
            height,
        }
    }

    /// Clamp a position inside the border. No wraparound.
    #[inline]
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.min_x, self.max_x),
            p.y.clamp(self.min_y, self.max_y),
        )
    }

    /// Get a random position within the border.
    #[inline]
    pub fn random_position(&self) -> Vec2 {
        let mut rng = rand::rng();
        Vec2::new(
            rng.random_range(self.min_x..self.max_x),
            rng.random_range(self.min_y..self.max_y),
        )
    }
}

/// The game world containing all entities.
#[derive(Debug)]
pub struct World {
    /// Next blob/food id; monotonic, never reused while referenced.
    next_entity_id: EntityId,
    /// Next player id; a separate namespace from entities.
    next_player_id: PlayerId,

    pub players: HashMap<PlayerId, Player>,
    pub blobs: HashMap<EntityId, Blob>,
    pub food: HashMap<EntityId, Food>,

    pub border: Border,
    /// Spatial index over blobs and food.
    pub grid: SpatialGrid,
}

impl World {
    pub fn new(config: &WorldConfig) -> Self {
        let border = Border::new(config.width, config.height);
        Self {
            next_entity_id: 1,
            next_player_id: 1,
            players: HashMap::new(),
            blobs: HashMap::with_capacity(256),
            food: HashMap::with_capacity(1024),
            grid: SpatialGrid::new(
                border.min_x,
                border.min_y,
                border.max_x,
                border.max_y,
                config.grid_cell,
            ),
            border,
        }
    }

    fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id = self.next_entity_id.wrapping_add(1);
        if self.next_entity_id == 0 {
            self.next_entity_id = 1; // Skip 0
        }
        id
    }

    fn next_player_id(&mut self) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id = self.next_player_id.wrapping_add(1);
        if self.next_player_id == 0 {
            self.next_player_id = 1;
        }
        id
    }

    /// Create a player with a validated name. No blob yet; the caller
    /// spawns the starter blob.
    pub fn add_player(&mut self, name: String) -> PlayerId {
        let id = self.next_player_id();
        self.players.insert(id, Player::new(id, name));
        id
    }

    /// Remove a player and cascade-remove all of its blobs.
    pub fn remove_player(&mut self, id: PlayerId) {
        if let Some(player) = self.players.remove(&id) {
            for blob_id in player.blobs {
                if self.blobs.remove(&blob_id).is_some() {
                    self.grid.remove(blob_id);
                }
            }
        }
    }

    /// Spawn a blob for an existing player. Returns `None` if the owner
    /// is gone (race with disconnect).
    pub fn spawn_blob(&mut self, owner: PlayerId, position: Vec2, mass: f32) -> Option<EntityId> {
        if !self.players.contains_key(&owner) {
            return None;
        }
        let id = self.next_entity_id();
        let blob = Blob::new(id, owner, position, mass);
        self.grid.insert(id, position, blob.radius());
        self.blobs.insert(id, blob);
        if let Some(player) = self.players.get_mut(&owner) {
            player.blobs.push(id);
        }
        Some(id)
    }

    /// Remove a blob, detaching it from its owner.
    pub fn remove_blob(&mut self, id: EntityId) -> Option<Blob> {
        let blob = self.blobs.remove(&id)?;
        self.grid.remove(id);
        if let Some(player) = self.players.get_mut(&blob.owner) {
            player.blobs.retain(|&b| b != id);
        }
        Some(blob)
    }

    /// Push a blob's current position and radius into the spatial index.
    /// Call after any position or mass change.
    pub fn sync_blob(&mut self, id: EntityId) {
        if let Some(blob) = self.blobs.get(&id) {
            self.grid.update(id, blob.position, blob.radius());
        }
    }

    /// Spawn one pellet at a position.
    pub fn spawn_food_at(&mut self, position: Vec2, mass: f32) -> EntityId {
        let id = self.next_entity_id();
        self.grid.insert(id, position, radius_for_mass(mass));
        self.food.insert(id, Food::new(id, position, mass));
        id
    }

    /// Remove a pellet.
    pub fn remove_food(&mut self, id: EntityId) -> Option<Food> {
        let food = self.food.remove(&id)?;
        self.grid.remove(id);
        Some(food)
    }

    /// Total mass owned by a player.
    pub fn player_mass(&self, id: PlayerId) -> f32 {
        self.players
            .get(&id)
            .map(|p| {
                p.blobs
                    .iter()
                    .filter_map(|b| self.blobs.get(b))
                    .map(|b| b.mass)
                    .sum()
            })
            .unwrap_or(0.0)
    }

    /// Pick a spawn position with no blob within `clearance`.
    ///
    /// Rejection-sampled with a bounded number of tries; a crowded world
    /// falls back to the last candidate rather than looping forever.
    pub fn spawn_position(&self, clearance: f32) -> Vec2 {
        let mut buf = Vec::new();
        let mut pos = self.border.random_position();
        for _ in 0..16 {
            self.grid.query_circle(pos, clearance, &mut buf);
            if !buf.iter().any(|id| self.blobs.contains_key(id)) {
                return pos;
            }
            pos = self.border.random_position();
        }
        pos
    }

    /// Spawn food toward the configured minimum.
    ///
    /// Budgeted per tick, and candidate positions that land within the
    /// safety margin of a blob are rejected (with bounded retries).
    pub fn replenish_food(&mut self, config: &FoodConfig) {
        let current = self.food.len();
        if current >= config.min_amount {
            return;
        }
        let budget = (config.min_amount - current)
            .min(config.spawn_per_tick)
            .min(config.max_amount.saturating_sub(current));

        let mut buf = Vec::new();
        let mut spawned = 0;
        let mut attempts = 0;
        while spawned < budget && attempts < budget * 4 {
            attempts += 1;
            let pos = self.border.random_position();
            self.grid.query_circle(pos, config.safety_margin, &mut buf);
            if buf.iter().any(|id| self.blobs.contains_key(id)) {
                continue;
            }
            self.spawn_food_at(pos, config.mass);
            spawned += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;

    fn world() -> World {
        World::new(&WorldConfig::default())
    }

    #[test]
    fn test_remove_player_cascades_blobs() {
        let mut w = world();
        let p = w.add_player("Ann".into());
        let a = w.spawn_blob(p, Vec2::ZERO, 10.0).unwrap();
        let b = w.spawn_blob(p, Vec2::new(50.0, 0.0), 10.0).unwrap();

        w.remove_player(p);
        assert!(w.blobs.is_empty());
        assert!(w.grid.is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn test_spawn_blob_for_missing_player() {
        let mut w = world();
        assert!(w.spawn_blob(99, Vec2::ZERO, 10.0).is_none());
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut w = world();
        let p = w.add_player("Ann".into());
        let a = w.spawn_blob(p, Vec2::ZERO, 10.0).unwrap();
        w.remove_blob(a);
        let b = w.spawn_blob(p, Vec2::ZERO, 10.0).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_remove_blob_detaches_from_owner() {
        let mut w = world();
        let p = w.add_player("Ann".into());
        let a = w.spawn_blob(p, Vec2::ZERO, 10.0).unwrap();
        w.remove_blob(a);
        assert!(w.players[&p].blobs.is_empty());
    }

    #[test]
    fn test_replenish_food_respects_budget_and_bounds() {
        let mut w = world();
        let config = FoodConfig {
            mass: 1.0,
            min_amount: 50,
            max_amount: 60,
            spawn_per_tick: 20,
            safety_margin: 12.0,
        };
        w.replenish_food(&config);
        assert_eq!(w.food.len(), 20);
        for _ in 0..5 {
            w.replenish_food(&config);
        }
        assert_eq!(w.food.len(), 50);
    }

    #[test]
    fn test_player_mass_sums_blobs() {
        let mut w = world();
        let p = w.add_player("Ann".into());
        w.spawn_blob(p, Vec2::ZERO, 10.0);
        w.spawn_blob(p, Vec2::new(100.0, 0.0), 25.0);
        assert!((w.player_mass(p) - 35.0).abs() < f32::EPSILON);
    }
}
