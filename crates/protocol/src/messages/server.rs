//! Server -> Client messages.

use crate::Color;
use serde::{Deserialize, Serialize};

/// A message broadcast or replied by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Sent once to the joining session.
    Init {
        #[serde(rename = "playerId")]
        player_id: String,
    },
    /// Per-tick world snapshot, identical for every session.
    GameState {
        blobs: Vec<BlobView>,
        food: Vec<FoodView>,
    },
    /// Per-tick ranking of the top players by total mass.
    Leaderboard { entries: Vec<LeaderboardEntry> },
    /// A relayed chat line.
    Chat {
        name: String,
        text: String,
        color: Color,
    },
}

/// One blob as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobView {
    pub id: u32,
    /// Owning player id, stringly typed like `init.playerId`.
    pub owner: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub mass: f32,
    pub radius: f32,
    pub color: Color,
}

/// One food pellet as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodView {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: String,
    pub name: String,
    pub mass: f32,
}
