//! Error types for the protocol crate.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while constructing or classifying protocol types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A channel name was empty.
    #[error("channel name must be a non-empty string")]
    EmptyChannelName,

    /// An inbound value did not parse as an envelope (wrong shape or an
    /// unrecognized message kind).
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
}
