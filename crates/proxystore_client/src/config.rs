//! Configuration for the proxy store.

use crate::codec::{Deserializer, Identity, Serializer};
use crate::strategy::{PatchStrategy, ShallowMerge};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Construction-time configuration for a [`crate::ProxyStore`].
///
/// The channel name is required and validated non-empty when the store is
/// built. Everything else has a default: an empty object as initial state,
/// identity serialization, and the shallow-merge patch strategy.
pub struct StoreConfig {
    /// Name of the logical channel this store converses on.
    pub channel_name: String,
    /// State the store holds until the first authoritative state arrives.
    pub initial_state: Value,
    /// Codec applied to outgoing dispatch payloads.
    pub serializer: Arc<dyn Serializer>,
    /// Codec applied to incoming payloads and dispatch response values.
    pub deserializer: Arc<dyn Deserializer>,
    /// Strategy applied to incoming diffs.
    pub patch_strategy: Arc<dyn PatchStrategy>,
}

impl StoreConfig {
    /// Creates a configuration for the given channel with all defaults.
    pub fn new(channel_name: impl Into<String>) -> Self {
        Self {
            channel_name: channel_name.into(),
            initial_state: Value::Object(Map::new()),
            serializer: Arc::new(Identity),
            deserializer: Arc::new(Identity),
            patch_strategy: Arc::new(ShallowMerge),
        }
    }

    /// Sets the initial state held before readiness.
    pub fn with_initial_state(mut self, state: Value) -> Self {
        self.initial_state = state;
        self
    }

    /// Sets the serializer for outgoing payloads.
    pub fn with_serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Arc::new(serializer);
        self
    }

    /// Sets the deserializer for incoming payloads.
    pub fn with_deserializer(mut self, deserializer: impl Deserializer + 'static) -> Self {
        self.deserializer = Arc::new(deserializer);
        self
    }

    /// Sets the patch strategy for incoming diffs.
    pub fn with_patch_strategy(mut self, strategy: impl PatchStrategy + 'static) -> Self {
        self.patch_strategy = Arc::new(strategy);
        self
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("channel_name", &self.channel_name)
            .field("initial_state", &self.initial_state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let config = StoreConfig::new("main");
        assert_eq!(config.channel_name, "main");
        assert_eq!(config.initial_state, json!({}));
    }

    #[test]
    fn builder() {
        let config = StoreConfig::new("main")
            .with_initial_state(json!({"count": 0}))
            .with_serializer(Identity)
            .with_deserializer(Identity)
            .with_patch_strategy(ShallowMerge);

        assert_eq!(config.initial_state, json!({"count": 0}));
    }
}
