//! Dispatch handling seam: where mutation logic plugs in.

use serde_json::Value;

/// The result of handling one dispatched action.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// The authoritative state after the action.
    pub state: Value,
    /// The result delivered back to the dispatching client.
    pub result: Value,
}

impl DispatchOutcome {
    /// Creates an outcome from the next state and the action's result.
    pub fn new(state: Value, result: Value) -> Self {
        Self { state, result }
    }
}

/// Applies a dispatched action to a channel's authoritative state.
///
/// The host calls this with the current state and the (already
/// deserialized) action payload. On success the returned state replaces
/// the channel's state and is broadcast to mirrors; the result travels
/// back to the dispatching client. On failure the error value is reported
/// back verbatim and the state is left untouched.
pub trait DispatchHandler: Send + Sync {
    /// Handles one action against the current state.
    fn handle(&self, state: &Value, action: Value) -> Result<DispatchOutcome, Value>;
}

impl<F> DispatchHandler for F
where
    F: Fn(&Value, Value) -> Result<DispatchOutcome, Value> + Send + Sync,
{
    fn handle(&self, state: &Value, action: Value) -> Result<DispatchOutcome, Value> {
        self(state, action)
    }
}

/// A handler that rejects every action. Useful for read-only channels.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl DispatchHandler for RejectAll {
    fn handle(&self, _state: &Value, _action: Value) -> Result<DispatchOutcome, Value> {
        Err(Value::String("channel does not accept dispatches".into()))
    }
}
