//! World entities: players, blobs, food.

mod blob;
mod food;
mod player;

pub use blob::{Blob, Boost};
pub use food::Food;
pub use player::Player;

/// Identifier for blobs and food, unique for the world's lifetime.
pub type EntityId = u32;

/// Identifier for players, unique for the world's lifetime.
pub type PlayerId = u32;
