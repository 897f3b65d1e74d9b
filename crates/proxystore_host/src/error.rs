//! Error types for the reference host.

use thiserror::Error;

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;

/// Errors that can occur while operating the reference host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// No channel with this name has been registered.
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    /// A channel with this name already exists.
    #[error("channel already registered: {0}")]
    DuplicateChannel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = HostError::UnknownChannel("main".into());
        assert_eq!(err.to_string(), "unknown channel: main");

        let err = HostError::DuplicateChannel("main".into());
        assert!(err.to_string().contains("already registered"));
    }
}
