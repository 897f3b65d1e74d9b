//! Serialization boundary applied at the transport edge.
//!
//! Outgoing dispatch payloads pass through a [`Serializer`]; incoming state
//! and patch payloads (and dispatch response values) pass through a
//! [`Deserializer`]. Both default to [`Identity`]. They are narrow,
//! single-method capabilities so plain closures work as implementations.

use serde_json::Value;
use thiserror::Error;

/// Error produced by a failing [`Deserializer`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("codec error: {0}")]
pub struct CodecError(pub String);

impl CodecError {
    /// Creates a codec error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Encodes an outgoing payload for the wire.
pub trait Serializer: Send + Sync {
    /// Transforms a payload into its wire form.
    fn serialize(&self, value: Value) -> Value;
}

/// Decodes an incoming wire payload.
pub trait Deserializer: Send + Sync {
    /// Transforms a wire value back into a payload.
    fn deserialize(&self, value: Value) -> Result<Value, CodecError>;
}

/// The default codec: passes values through unchanged and never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Serializer for Identity {
    fn serialize(&self, value: Value) -> Value {
        value
    }
}

impl Deserializer for Identity {
    fn deserialize(&self, value: Value) -> Result<Value, CodecError> {
        Ok(value)
    }
}

impl<F> Serializer for F
where
    F: Fn(Value) -> Value + Send + Sync,
{
    fn serialize(&self, value: Value) -> Value {
        self(value)
    }
}

impl<F> Deserializer for F
where
    F: Fn(Value) -> Result<Value, CodecError> + Send + Sync,
{
    fn deserialize(&self, value: Value) -> Result<Value, CodecError> {
        self(value)
    }
}
