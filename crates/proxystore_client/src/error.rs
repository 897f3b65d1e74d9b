//! Error types for the proxy store.

use proxystore_protocol::ProtocolError;
use serde_json::Value;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Diagnostic prefix carried by every dispatch failure surfaced to callers.
pub const HOST_ERROR_PREFIX: &str = "error in host while handling dispatch";

/// Errors that can occur while constructing or using a proxy store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Invalid construction-time configuration. Fatal; no partial store is
    /// produced.
    #[error("invalid store configuration: {0}")]
    Config(#[from] ProtocolError),

    /// A dispatch got no answer from the transport. Embeds the transport's
    /// last-known error detail.
    #[error("{}: no response from host ({detail})", HOST_ERROR_PREFIX)]
    NoResponse {
        /// Transport-level error detail, if the transport recorded one.
        detail: String,
    },

    /// The host reported an error while handling a dispatch.
    #[error("{}: {detail}", HOST_ERROR_PREFIX)]
    Remote {
        /// The host-reported error value, carried verbatim.
        detail: Value,
    },
}

impl StoreError {
    /// Creates a no-response error from an optional transport error detail.
    pub fn no_response(detail: Option<String>) -> Self {
        Self::NoResponse {
            detail: detail.unwrap_or_else(|| "transport returned no value".into()),
        }
    }
}
