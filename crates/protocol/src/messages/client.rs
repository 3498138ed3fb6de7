//! Client -> Server messages.

use serde::{Deserialize, Serialize};

/// A command sent by a client.
///
/// `split` carries an empty `data` object, so it is a struct variant even
/// though it has no fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Enter the game with a display name.
    Join { name: String },
    /// Point the player's blobs at a world position.
    Target { x: f32, y: f32 },
    /// Split every eligible blob.
    Split {},
    /// Say something.
    Chat { text: String },
}
