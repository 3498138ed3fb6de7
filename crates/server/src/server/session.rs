//! Session bookkeeping.
//!
//! The engine's view of a connected session. Socket I/O lives in the
//! connection task; this record only tracks the lifecycle and the player
//! binding.

use crate::command::SessionId;
use crate::entity::PlayerId;

/// Session lifecycle: `Connecting -> Joined -> Closing -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport is up, no accepted join yet.
    Connecting,
    /// A join was accepted and a player exists.
    Joined,
    /// Disconnect observed; world cleanup is running.
    Closing,
    /// Cleanup finished; the record is dropped right after.
    Closed,
}

/// Engine-side record of one session.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub state: SessionState,
    /// Set while the session is joined.
    pub player: Option<PlayerId>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: SessionState::Connecting,
            player: None,
        }
    }
}
