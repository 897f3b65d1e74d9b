//! The reference host: authoritative state plus push broadcasting.

use crate::error::{HostError, HostResult};
use crate::handler::DispatchHandler;
use parking_lot::{Mutex, RwLock};
use proxystore_protocol::{ChannelName, Envelope, MessageKind, Reply};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// An in-memory host owning the authoritative state of named channels.
///
/// Clients talk to it two ways, mirroring the wire protocol:
/// - [`Host::handle_request`] answers FETCH_STATE and DISPATCH envelopes;
///   `None` means the host has no answer (unknown channel, or a kind that
///   is never answered), which a client observes as a missing response.
/// - [`Host::subscribe`] returns a feed carrying every broadcast envelope
///   for every channel; the client side filters by channel name.
pub struct Host {
    channels: RwLock<HashMap<String, ChannelSlot>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<Value>>>,
}

struct ChannelSlot {
    name: ChannelName,
    state: Value,
    handler: Arc<dyn DispatchHandler>,
}

impl Host {
    /// Creates a host with no channels.
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Registers a channel with its initial state and dispatch handler.
    pub fn register(
        &self,
        channel: ChannelName,
        initial_state: Value,
        handler: impl DispatchHandler + 'static,
    ) -> HostResult<()> {
        let mut channels = self.channels.write();
        if channels.contains_key(channel.as_str()) {
            return Err(HostError::DuplicateChannel(channel.as_str().to_owned()));
        }
        channels.insert(
            channel.as_str().to_owned(),
            ChannelSlot {
                name: channel,
                state: initial_state,
                handler: Arc::new(handler),
            },
        );
        Ok(())
    }

    /// Subscribes to the multiplexed push feed.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Answers one client request. `None` means no answer will ever come.
    pub fn handle_request(&self, envelope: Envelope) -> Option<Value> {
        match envelope.kind {
            MessageKind::FetchState => self
                .channels
                .read()
                .get(&envelope.channel)
                .map(|slot| slot.state.clone()),
            MessageKind::Dispatch => self.handle_dispatch(&envelope.channel, envelope.payload),
            // Host-to-client kinds; a host never answers these.
            MessageKind::State | MessageKind::PatchState => {
                debug!(kind = envelope.kind.as_str(), "ignoring host-bound kind");
                None
            }
        }
    }

    /// Replaces a channel's authoritative state and broadcasts STATE.
    pub fn replace_state(&self, channel: &str, state: Value) -> HostResult<()> {
        let envelope = {
            let mut channels = self.channels.write();
            let slot = channels
                .get_mut(channel)
                .ok_or_else(|| HostError::UnknownChannel(channel.to_owned()))?;
            slot.state = state;
            Envelope::state(&slot.name, slot.state.clone())
        };
        self.broadcast(envelope);
        Ok(())
    }

    /// Merges a diff into a channel's state (per top-level key) and
    /// broadcasts the diff as PATCH_STATE.
    pub fn patch_state(&self, channel: &str, diff: Value) -> HostResult<()> {
        let envelope = {
            let mut channels = self.channels.write();
            let slot = channels
                .get_mut(channel)
                .ok_or_else(|| HostError::UnknownChannel(channel.to_owned()))?;
            shallow_merge(&mut slot.state, diff.clone());
            Envelope::patch_state(&slot.name, diff)
        };
        self.broadcast(envelope);
        Ok(())
    }

    /// Returns a channel's current authoritative state.
    pub fn state(&self, channel: &str) -> HostResult<Value> {
        self.channels
            .read()
            .get(channel)
            .map(|slot| slot.state.clone())
            .ok_or_else(|| HostError::UnknownChannel(channel.to_owned()))
    }

    /// Returns the number of live push subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    fn handle_dispatch(&self, channel: &str, action: Value) -> Option<Value> {
        let (reply, envelope) = {
            let mut channels = self.channels.write();
            let slot = channels.get_mut(channel)?;
            match slot.handler.handle(&slot.state, action) {
                Ok(outcome) => {
                    let changed = outcome.state != slot.state;
                    slot.state = outcome.state;
                    let envelope =
                        changed.then(|| Envelope::state(&slot.name, slot.state.clone()));
                    (Reply::ok(outcome.result).to_value(), envelope)
                }
                Err(error) => (Reply::err(error).to_value(), None),
            }
        };

        if let Some(envelope) = envelope {
            self.broadcast(envelope);
        }
        Some(reply)
    }

    /// Sends an envelope to every subscriber, dropping the disconnected.
    fn broadcast(&self, envelope: Envelope) {
        let value = envelope.to_value();
        self.subscribers
            .lock()
            .retain(|tx| tx.send(value.clone()).is_ok());
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-top-level-key merge, the same default the client applies to diffs.
fn shallow_merge(current: &mut Value, diff: Value) {
    match diff {
        Value::Object(patch) => {
            if let Some(map) = current.as_object_mut() {
                for (key, value) in patch {
                    map.insert(key, value);
                }
            } else {
                *current = Value::Object(patch);
            }
        }
        other => *current = other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{DispatchOutcome, RejectAll};
    use serde_json::json;

    fn channel(name: &str) -> ChannelName {
        ChannelName::new(name).unwrap()
    }

    /// Increments `count` and returns the new value as the result.
    fn counter_handler() -> impl DispatchHandler {
        |state: &Value, _action: Value| -> Result<DispatchOutcome, Value> {
            let count = state.get("count").and_then(Value::as_i64).unwrap_or(0) + 1;
            Ok(DispatchOutcome::new(json!({"count": count}), json!(count)))
        }
    }

    #[test]
    fn register_rejects_duplicates() {
        let host = Host::new();
        host.register(channel("main"), json!({}), RejectAll).unwrap();

        let result = host.register(channel("main"), json!({}), RejectAll);
        assert_eq!(
            result.unwrap_err(),
            HostError::DuplicateChannel("main".into())
        );
    }

    #[test]
    fn fetch_state_returns_the_snapshot() {
        let host = Host::new();
        host.register(channel("main"), json!({"count": 0}), RejectAll)
            .unwrap();

        let reply = host
            .handle_request(Envelope::fetch_state(&channel("main")))
            .unwrap();
        assert_eq!(reply, json!({"count": 0}));
    }

    #[test]
    fn unknown_channel_yields_no_answer() {
        let host = Host::new();
        assert!(host
            .handle_request(Envelope::fetch_state(&channel("ghost")))
            .is_none());
        assert!(host
            .handle_request(Envelope::dispatch(&channel("ghost"), json!({})))
            .is_none());
    }

    #[test]
    fn host_bound_kinds_are_never_answered() {
        let host = Host::new();
        host.register(channel("main"), json!({}), RejectAll).unwrap();

        assert!(host
            .handle_request(Envelope::state(&channel("main"), json!({})))
            .is_none());
        assert!(host
            .handle_request(Envelope::patch_state(&channel("main"), json!({})))
            .is_none());
    }

    #[test]
    fn dispatch_runs_the_handler_and_broadcasts_state() {
        let host = Host::new();
        host.register(channel("main"), json!({"count": 0}), counter_handler())
            .unwrap();
        let mut feed = host.subscribe();

        let reply = host
            .handle_request(Envelope::dispatch(&channel("main"), json!("inc")))
            .unwrap();
        assert_eq!(reply, json!({"value": {"payload": 1}}));
        assert_eq!(host.state("main").unwrap(), json!({"count": 1}));

        let pushed = feed.try_recv().unwrap();
        assert_eq!(pushed["type"], "STATE");
        assert_eq!(pushed["payload"], json!({"count": 1}));
    }

    #[test]
    fn failed_dispatch_reports_the_error_and_keeps_state() {
        let host = Host::new();
        host.register(channel("main"), json!({"count": 0}), RejectAll)
            .unwrap();
        let mut feed = host.subscribe();

        let reply = host
            .handle_request(Envelope::dispatch(&channel("main"), json!("inc")))
            .unwrap();
        assert!(reply["error"].as_str().unwrap().contains("does not accept"));
        assert_eq!(host.state("main").unwrap(), json!({"count": 0}));
        assert!(feed.try_recv().is_err());
    }

    #[test]
    fn patch_state_merges_and_broadcasts_the_diff() {
        let host = Host::new();
        host.register(channel("main"), json!({"a": 1}), RejectAll)
            .unwrap();
        let mut feed = host.subscribe();

        host.patch_state("main", json!({"b": 2})).unwrap();
        assert_eq!(host.state("main").unwrap(), json!({"a": 1, "b": 2}));

        let pushed = feed.try_recv().unwrap();
        assert_eq!(pushed["type"], "PATCH_STATE");
        assert_eq!(pushed["payload"], json!({"b": 2}));
    }

    #[test]
    fn replace_state_broadcasts_the_full_state() {
        let host = Host::new();
        host.register(channel("main"), json!({"a": 1}), RejectAll)
            .unwrap();
        let mut feed = host.subscribe();

        host.replace_state("main", json!({"z": 9})).unwrap();
        assert_eq!(host.state("main").unwrap(), json!({"z": 9}));

        let pushed = feed.try_recv().unwrap();
        assert_eq!(pushed["type"], "STATE");
        assert_eq!(pushed["payload"], json!({"z": 9}));
    }

    #[test]
    fn feed_is_multiplexed_across_channels() {
        let host = Host::new();
        host.register(channel("a"), json!({}), RejectAll).unwrap();
        host.register(channel("b"), json!({}), RejectAll).unwrap();
        let mut feed = host.subscribe();

        host.patch_state("a", json!({"x": 1})).unwrap();
        host.patch_state("b", json!({"y": 2})).unwrap();

        assert_eq!(feed.try_recv().unwrap()["channelName"], "a");
        assert_eq!(feed.try_recv().unwrap()["channelName"], "b");
    }

    #[test]
    fn disconnected_subscribers_are_dropped() {
        let host = Host::new();
        host.register(channel("main"), json!({}), RejectAll).unwrap();

        let feed = host.subscribe();
        assert_eq!(host.subscriber_count(), 1);
        drop(feed);

        host.patch_state("main", json!({"x": 1})).unwrap();
        assert_eq!(host.subscriber_count(), 0);
    }

    #[test]
    fn shallow_merge_semantics() {
        let mut state = json!({});
        shallow_merge(&mut state, json!({"count": 1}));
        assert_eq!(state, json!({"count": 1}));

        shallow_merge(&mut state, json!({"count": 2}));
        assert_eq!(state, json!({"count": 2}));

        shallow_merge(&mut state, json!(42));
        assert_eq!(state, json!(42));
    }
}
