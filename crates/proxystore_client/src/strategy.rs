//! Patch strategy: how an incremental diff becomes the next state.

use serde_json::Value;

/// Reconciles the current state with an incremental diff.
///
/// Implementations must be pure: no hidden state, and `current` is never
/// mutated in place (the borrow makes that structural). The diffing
/// algorithm that produced the diff lives on the host side and is not this
/// crate's concern; only the application contract is.
pub trait PatchStrategy: Send + Sync {
    /// Returns the next state incorporating `diff` into `current`.
    fn apply(&self, current: &Value, diff: Value) -> Value;
}

/// The default strategy: a shallow merge operating per top-level key.
///
/// Each key present in the diff overwrites the corresponding key of the
/// current state; keys absent from the diff are kept. When either side is
/// not an object the diff replaces the state wholesale.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShallowMerge;

impl PatchStrategy for ShallowMerge {
    fn apply(&self, current: &Value, diff: Value) -> Value {
        match (current, diff) {
            (Value::Object(current), Value::Object(diff)) => {
                let mut next = current.clone();
                for (key, value) in diff {
                    next.insert(key, value);
                }
                Value::Object(next)
            }
            (_, diff) => diff,
        }
    }
}

impl<F> PatchStrategy for F
where
    F: Fn(&Value, Value) -> Value + Send + Sync,
{
    fn apply(&self, current: &Value, diff: Value) -> Value {
        self(current, diff)
    }
}
