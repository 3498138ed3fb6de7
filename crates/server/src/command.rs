//! Command intents and validation.
//!
//! Sessions never touch the world. Inbound messages are translated into
//! [`Intent`]s, queued, and drained by the tick loop; validation that
//! needs world state (name policy, rate limits, stale references) runs
//! at apply time inside the tick.

use protocol::ClientMessage;
use thiserror::Error;

/// Identifier for a connected session, allocated by the acceptor.
pub type SessionId = u32;

/// A validated-enough intent, tagged with its originating session.
///
/// Intents from one session arrive in the order the session sent them;
/// interleaving across sessions within a tick is unspecified.
#[derive(Debug, Clone)]
pub enum Intent {
    /// A session finished the transport handshake.
    Connect { session: SessionId },
    Join { session: SessionId, name: String },
    Target { session: SessionId, x: f32, y: f32 },
    Split { session: SessionId },
    Chat { session: SessionId, text: String },
    /// The session closed; world cleanup happens at the next tick.
    Disconnect { session: SessionId },
}

impl Intent {
    /// Tag a decoded client message with its session.
    pub fn from_message(session: SessionId, msg: ClientMessage) -> Self {
        match msg {
            ClientMessage::Join { name } => Intent::Join { session, name },
            ClientMessage::Target { x, y } => Intent::Target { session, x, y },
            ClientMessage::Split {} => Intent::Split { session },
            ClientMessage::Chat { text } => Intent::Chat { session, text },
        }
    }

    /// The session this intent came from.
    pub fn session(&self) -> SessionId {
        match *self {
            Intent::Connect { session }
            | Intent::Join { session, .. }
            | Intent::Target { session, .. }
            | Intent::Split { session }
            | Intent::Chat { session, .. }
            | Intent::Disconnect { session } => session,
        }
    }
}

/// Why an intent was rejected. Rejections are logged and skipped; they
/// never abort the tick and never produce a reply (the protocol has no
/// error channel).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown session")]
    UnknownSession,
    #[error("session has not joined")]
    NotJoined,
    #[error("session already joined")]
    AlreadyJoined,
    #[error("invalid display name")]
    InvalidName,
    #[error("player no longer exists")]
    StalePlayer,
    #[error("coordinates are not finite")]
    BadCoordinates,
}

/// Validate a display name: trimmed, control characters stripped,
/// 1..=`max_len` characters. Over-long or empty names are rejected, not
/// truncated.
pub fn validate_name(raw: &str, max_len: usize) -> Option<String> {
    let name: String = raw.trim().chars().filter(|c| !c.is_control()).collect();
    if name.is_empty() || name.chars().count() > max_len {
        return None;
    }
    Some(name)
}

/// Sanitize a chat line: trim, strip control characters, truncate to
/// `max_len` characters. Returns `None` when nothing is left to say.
pub fn sanitize_chat(raw: &str, max_len: usize) -> Option<String> {
    let text: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(max_len)
        .collect();
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_trims_and_accepts() {
        assert_eq!(validate_name("  Ann ", 16), Some("Ann".into()));
    }

    #[test]
    fn test_validate_name_rejects_empty() {
        assert_eq!(validate_name("", 16), None);
        assert_eq!(validate_name("   ", 16), None);
        assert_eq!(validate_name("\u{7}\u{8}", 16), None);
    }

    #[test]
    fn test_validate_name_rejects_overlong() {
        assert_eq!(validate_name("abcdefghijklmnopq", 16), None);
        assert!(validate_name("abcdefghijklmnop", 16).is_some());
    }

    #[test]
    fn test_sanitize_chat_strips_and_truncates() {
        assert_eq!(sanitize_chat(" hi\u{0}there ", 120), Some("hithere".into()));
        assert_eq!(sanitize_chat("abcdef", 4), Some("abcd".into()));
        assert_eq!(sanitize_chat(" \t\n ", 120), None);
    }
}
