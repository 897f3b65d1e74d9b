//! Request/response reply shape.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The host's answer to a DISPATCH request.
///
/// Carries either a host-reported `error` or a result `value` wrapping the
/// action's outcome under a `payload` key. Both fields are optional on the
/// wire and default to absent. (FETCH_STATE is answered with the bare state
/// value, not a reply.)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Host-reported error, if the request failed on the host side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    /// Result value, if the request succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Reply {
    /// Creates a successful reply wrapping a dispatch result payload.
    pub fn ok(payload: Value) -> Self {
        Self {
            error: None,
            value: Some(json!({ "payload": payload })),
        }
    }

    /// Creates a successful reply whose value is the given raw value.
    pub fn with_value(value: Value) -> Self {
        Self {
            error: None,
            value: Some(value),
        }
    }

    /// Creates a failed reply.
    pub fn err(error: Value) -> Self {
        Self {
            error: Some(error),
            value: None,
        }
    }

    /// Parses a raw wire value leniently: missing fields become `None`,
    /// non-object values produce an empty reply.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Renders the reply as a raw wire value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
