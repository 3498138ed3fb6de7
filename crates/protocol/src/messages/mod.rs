//! Message catalog for the `{type, data}` JSON protocol.
//!
//! This module contains both client -> server and server -> client messages.

mod client;
mod server;

pub use client::*;
pub use server::*;

use crate::{MAX_FRAME_LEN, ProtocolError};

/// Decode one inbound text frame into a [`ClientMessage`].
///
/// Unknown `type` values and malformed JSON are both reported as
/// [`ProtocolError::InvalidFrame`]; the caller decides whether the
/// connection survives (it does — malformed input is logged and ignored).
pub fn decode_client(text: &str) -> Result<ClientMessage, ProtocolError> {
    if text.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLong(text.len()));
    }
    Ok(serde_json::from_str(text)?)
}

/// Encode one outbound message into a text frame.
pub fn encode_server(msg: &ServerMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(msg)?)
}
