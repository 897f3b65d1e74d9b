//! The message envelope carried by all traffic, in both directions.

use crate::channel::ChannelName;
use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The kind of a protocol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Client asks the host for the full current state. Sent once, at
    /// construction; the reply carries the full state as its value.
    #[serde(rename = "FETCH_STATE")]
    FetchState,
    /// Host sends the full current state, either as the fetch reply or
    /// unsolicited.
    #[serde(rename = "STATE")]
    State,
    /// Host sends an incremental diff to be applied by the client's patch
    /// strategy.
    #[serde(rename = "PATCH_STATE")]
    PatchState,
    /// Client asks the host to run a state mutation; the reply carries the
    /// mutation's result.
    #[serde(rename = "DISPATCH")]
    Dispatch,
}

impl MessageKind {
    /// Returns the wire tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::FetchState => "FETCH_STATE",
            MessageKind::State => "STATE",
            MessageKind::PatchState => "PATCH_STATE",
            MessageKind::Dispatch => "DISPATCH",
        }
    }
}

/// A protocol message: kind, channel name, opaque payload.
///
/// Envelopes with an unrecognized kind or a channel name the receiver does
/// not own are discarded before any payload handling; that is what lets
/// unrelated traffic share one transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message kind.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Name of the logical channel this message belongs to.
    #[serde(rename = "channelName")]
    pub channel: String,
    /// Opaque payload; absent on the wire when null.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl Envelope {
    /// Creates a FETCH_STATE request (no payload).
    pub fn fetch_state(channel: &ChannelName) -> Self {
        Self {
            kind: MessageKind::FetchState,
            channel: channel.as_str().to_owned(),
            payload: Value::Null,
        }
    }

    /// Creates a STATE push carrying the full state.
    pub fn state(channel: &ChannelName, state: Value) -> Self {
        Self {
            kind: MessageKind::State,
            channel: channel.as_str().to_owned(),
            payload: state,
        }
    }

    /// Creates a PATCH_STATE push carrying a diff.
    pub fn patch_state(channel: &ChannelName, diff: Value) -> Self {
        Self {
            kind: MessageKind::PatchState,
            channel: channel.as_str().to_owned(),
            payload: diff,
        }
    }

    /// Creates a DISPATCH request wrapping an action.
    pub fn dispatch(channel: &ChannelName, action: Value) -> Self {
        Self {
            kind: MessageKind::Dispatch,
            channel: channel.as_str().to_owned(),
            payload: action,
        }
    }

    /// Classifies a raw inbound value as an envelope.
    ///
    /// Fails on anything that is not an object with a recognized `type` tag
    /// and a string `channelName`; callers drop such traffic without
    /// touching the payload.
    pub fn from_value(value: Value) -> ProtocolResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| ProtocolError::MalformedEnvelope(e.to_string()))
    }

    /// Renders the envelope as a raw wire value.
    pub fn to_value(&self) -> Value {
        json!({
            "type": self.kind.as_str(),
            "channelName": self.channel,
            "payload": self.payload,
        })
    }
}
