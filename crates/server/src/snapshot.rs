//! Per-tick snapshot building.
//!
//! One immutable snapshot is captured after each tick and serialized
//! exactly once; every session receives the same bytes.

use crate::world::World;
use protocol::{
    BlobView, Color, FoodView, LeaderboardEntry, ProtocolError, ServerMessage, encode_server,
};

/// The immutable per-tick world view.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub tick: u64,
    pub blobs: Vec<BlobView>,
    pub food: Vec<FoodView>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl Snapshot {
    /// Capture the current world. Views are sorted by id so equal worlds
    /// produce identical frames.
    pub fn capture(tick: u64, world: &World, leaderboard: Vec<LeaderboardEntry>) -> Self {
        let mut blobs: Vec<BlobView> = world
            .blobs
            .values()
            .map(|b| {
                let (name, color) = match world.players.get(&b.owner) {
                    Some(p) => (p.name.clone(), p.color),
                    None => (String::new(), Color::default()),
                };
                BlobView {
                    id: b.id,
                    owner: b.owner.to_string(),
                    name,
                    x: b.position.x,
                    y: b.position.y,
                    mass: b.mass,
                    radius: b.radius(),
                    color,
                }
            })
            .collect();
        blobs.sort_by_key(|b| b.id);

        let mut food: Vec<FoodView> = world
            .food
            .values()
            .map(|f| FoodView {
                id: f.id,
                x: f.position.x,
                y: f.position.y,
            })
            .collect();
        food.sort_by_key(|f| f.id);

        Self {
            tick,
            blobs,
            food,
            leaderboard,
        }
    }

    /// Serialize into the `gameState` and `leaderboard` wire frames.
    pub fn into_frames(self) -> Result<(String, String), ProtocolError> {
        let state = encode_server(&ServerMessage::GameState {
            blobs: self.blobs,
            food: self.food,
        })?;
        let leaderboard = encode_server(&ServerMessage::Leaderboard {
            entries: self.leaderboard,
        })?;
        Ok((state, leaderboard))
    }
}

/// Aggregate total mass per player, sorted descending, top `k` retained.
/// Players with no blobs left are not ranked.
pub fn leaderboard(world: &World, k: usize) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = world
        .players
        .values()
        .filter(|p| !p.blobs.is_empty())
        .map(|p| LeaderboardEntry {
            id: p.id.to_string(),
            name: p.name.clone(),
            mass: world.player_mass(p.id),
        })
        .collect();
    entries.sort_by(|a, b| b.mass.partial_cmp(&a.mass).unwrap_or(std::cmp::Ordering::Equal));
    entries.truncate(k);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use glam::Vec2;

    #[test]
    fn test_leaderboard_sorts_and_truncates() {
        let mut world = World::new(&WorldConfig::default());
        for (name, mass) in [("a", 10.0), ("b", 30.0), ("c", 20.0)] {
            let p = world.add_player(name.into());
            world.spawn_blob(p, Vec2::ZERO, mass);
        }
        let entries = leaderboard(&world, 2);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "b");
        assert_eq!(entries[1].name, "c");
    }

    #[test]
    fn test_blobless_players_are_not_ranked() {
        let mut world = World::new(&WorldConfig::default());
        world.add_player("ghost".into());
        assert!(leaderboard(&world, 10).is_empty());
    }

    #[test]
    fn test_capture_is_sorted_and_complete() {
        let mut world = World::new(&WorldConfig::default());
        let p = world.add_player("Ann".into());
        world.spawn_blob(p, Vec2::new(1.0, 2.0), 10.0);
        world.spawn_food_at(Vec2::new(3.0, 4.0), 1.0);
        world.spawn_food_at(Vec2::new(5.0, 6.0), 1.0);

        let snap = Snapshot::capture(7, &world, leaderboard(&world, 10));
        assert_eq!(snap.tick, 7);
        assert_eq!(snap.blobs.len(), 1);
        assert_eq!(snap.blobs[0].name, "Ann");
        assert_eq!(snap.food.len(), 2);
        assert!(snap.food[0].id < snap.food[1].id);
        assert_eq!(snap.leaderboard.len(), 1);

        let (state, lb) = snap.into_frames().unwrap();
        assert!(state.starts_with(r#"{"type":"gameState""#));
        assert!(lb.starts_with(r#"{"type":"leaderboard""#));
    }
}
