//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding or encoding packets.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Empty frame")]
    Empty,

    #[error("Malformed packet: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Failed to encode packet: {0}")]
    Encode(#[source] serde_json::Error),
}
