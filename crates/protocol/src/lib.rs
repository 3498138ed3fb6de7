//! Shared wire protocol for blobd.
//!
//! Frames are UTF-8 JSON text messages of the shape `{"type": ..., "data": ...}`.
//! This crate contains:
//! - The client -> server and server -> client message catalogs
//! - Snapshot view structs (blobs, food, leaderboard entries)
//! - Shared types (`Color`) and the protocol error type

mod color;
mod error;
pub mod messages;

pub use color::Color;
pub use error::ProtocolError;
pub use messages::{
    BlobView, ClientMessage, FoodView, LeaderboardEntry, ServerMessage, decode_client,
    encode_server,
};

/// Upper bound on a single inbound text frame.
///
/// Anything larger is rejected before JSON parsing; no legitimate command
/// comes close to this.
pub const MAX_FRAME_LEN: usize = 16 * 1024;
