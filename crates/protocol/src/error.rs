//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding or encoding message frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid message frame: {0}")]
    InvalidFrame(#[from] serde_json::Error),

    #[error("frame too long: {0} bytes")]
    FrameTooLong(usize),
}
