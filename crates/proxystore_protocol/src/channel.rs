//! Channel identity.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The name of a logical conversation multiplexed over a shared transport.
///
/// Validated non-empty at construction; immutable afterwards. A proxy store
/// only reacts to envelopes whose channel name matches its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelName(String);

impl ChannelName {
    /// Creates a channel name, rejecting empty strings.
    pub fn new(name: impl Into<String>) -> ProtocolResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ProtocolError::EmptyChannelName);
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this channel matches the given wire name.
    pub fn matches(&self, wire_name: &str) -> bool {
        self.0 == wire_name
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChannelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
