//! The proxy store: a local mirror of host-owned state.

use crate::codec::{Deserializer, Serializer};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::listeners::{ListenerRegistry, Subscription};
use crate::strategy::PatchStrategy;
use crate::transport::Transport;
use parking_lot::Mutex;
use proxystore_protocol::{ChannelName, Envelope, MessageKind, Reply};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A client-side mirror of state owned by the host.
///
/// At construction the store sends a FETCH_STATE request and begins
/// consuming pushed messages. The first full state to arrive — whether the
/// fetch reply or an unsolicited STATE push — resolves readiness; the race
/// is deliberately left as "first writer wins" with no ordering assumed
/// between the two sources. Diffs pushed before readiness queue up and are
/// applied in arrival order once the first state lands.
///
/// One store owns one channel identity for its whole lifetime. Dropping the
/// store stops its background tasks.
///
/// Must be constructed within a tokio runtime.
pub struct ProxyStore<T: Transport> {
    inner: Arc<StoreInner>,
    transport: Arc<T>,
    intake: JoinHandle<()>,
    fetch: JoinHandle<()>,
}

struct StoreInner {
    channel: ChannelName,
    shared: Mutex<Shared>,
    listeners: Arc<Mutex<ListenerRegistry>>,
    ready_tx: watch::Sender<bool>,
    ready_rx: watch::Receiver<bool>,
    serializer: Arc<dyn Serializer>,
    deserializer: Arc<dyn Deserializer>,
    patch_strategy: Arc<dyn PatchStrategy>,
}

struct Shared {
    state: Arc<Value>,
    ready: bool,
    pending_patches: VecDeque<Value>,
}

impl<T: Transport> ProxyStore<T> {
    /// Builds a store on the given channel and transport.
    ///
    /// Validates the configuration, subscribes to pushed messages, and
    /// issues the initial FETCH_STATE request. Fails with
    /// [`StoreError::Config`] on an empty channel name; no partial store is
    /// produced.
    pub fn new(config: StoreConfig, transport: T) -> StoreResult<Self> {
        let channel = ChannelName::new(config.channel_name)?;
        let (ready_tx, ready_rx) = watch::channel(false);

        let inner = Arc::new(StoreInner {
            channel,
            shared: Mutex::new(Shared {
                state: Arc::new(config.initial_state),
                ready: false,
                pending_patches: VecDeque::new(),
            }),
            listeners: Arc::new(Mutex::new(ListenerRegistry::new())),
            ready_tx,
            ready_rx,
            serializer: config.serializer,
            deserializer: config.deserializer,
            patch_strategy: config.patch_strategy,
        });
        let transport = Arc::new(transport);

        let mut feed = transport.incoming();
        let intake_inner = Arc::clone(&inner);
        let intake = tokio::spawn(async move {
            while let Some(raw) = feed.recv().await {
                intake_inner.handle_incoming(raw);
            }
        });

        let fetch_rx = transport.request(Envelope::fetch_state(&inner.channel));
        let fetch_inner = Arc::clone(&inner);
        let fetch = tokio::spawn(async move {
            match fetch_rx.await {
                Ok(state) if !state.is_null() => fetch_inner.ingest_state(state),
                // No answer: readiness waits for a pushed STATE instead.
                _ => {}
            }
        });

        Ok(Self {
            inner,
            transport,
            intake,
            fetch,
        })
    }

    /// The channel identity this store converses on.
    pub fn channel(&self) -> &ChannelName {
        &self.inner.channel
    }

    /// Resolves once the first authoritative state has been observed.
    ///
    /// Safe to await any number of times; every await observes the same
    /// one-shot result. Stays pending forever if the host never answers and
    /// never pushes — timeouts are the caller's policy, not the store's.
    pub async fn ready(&self) {
        let mut ready = self.inner.ready_rx.clone();
        // Only fails if the sender is dropped, which cannot happen while
        // `self.inner` is alive.
        let _ = ready.wait_for(|resolved| *resolved).await;
    }

    /// Returns true once readiness has resolved.
    pub fn is_ready(&self) -> bool {
        *self.inner.ready_rx.borrow()
    }

    /// Returns the current state. Callers must treat it as read-only; the
    /// store swaps the whole value on every mutation instead of writing
    /// through it.
    pub fn get_state(&self) -> Arc<Value> {
        Arc::clone(&self.inner.shared.lock().state)
    }

    /// Registers a change listener, invoked after every state mutation.
    ///
    /// Listeners run synchronously with the mutation, in registration
    /// order; duplicates are allowed. The returned handle removes exactly
    /// this registration.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = self.inner.listeners.lock().insert(Arc::new(listener));
        Subscription::new(Arc::downgrade(&self.inner.listeners), id)
    }

    /// Overwrites the state wholesale and notifies every listener once.
    pub fn replace_state(&self, new_state: Value) {
        self.inner.replace_state(new_state);
    }

    /// Applies a diff through the patch strategy, after readiness.
    ///
    /// Suspends until the first authoritative state has been observed, then
    /// computes the next state and notifies listeners. The state is never
    /// patched before readiness resolves.
    pub async fn patch_state(&self, diff: Value) {
        self.ready().await;
        self.inner.apply_patch(diff);
    }

    /// Sends an action to the host for execution and returns its result.
    ///
    /// The action passes through the serializer; the result is the
    /// `payload` of the host's reply value (null when absent). Rejections
    /// carry a diagnostic prefix plus either the transport's last error
    /// detail (no answer) or the host-reported error value.
    pub async fn dispatch(&self, action: Value) -> StoreResult<Value> {
        let payload = self.inner.serializer.serialize(action);
        let rx = self
            .transport
            .request(Envelope::dispatch(&self.inner.channel, payload));

        let response = match rx.await {
            Ok(value) if !value.is_null() => value,
            _ => return Err(StoreError::no_response(self.transport.last_error())),
        };

        let reply = Reply::from_value(response);
        if let Some(detail) = reply.error {
            return Err(StoreError::Remote { detail });
        }

        let raw = reply.value.unwrap_or(Value::Null);
        let value = match self.inner.deserializer.deserialize(raw.clone()) {
            Ok(value) => value,
            // A value the deserializer rejects was never serialized in the
            // first place; use it as-is.
            Err(_) => raw,
        };

        Ok(value.get("payload").cloned().unwrap_or(Value::Null))
    }

    /// No-op, kept for API compatibility with reducer-style state
    /// containers. The reducer lives on the host.
    pub fn replace_reducer(&self) {}
}

impl<T: Transport> Drop for ProxyStore<T> {
    fn drop(&mut self) {
        self.intake.abort();
        self.fetch.abort();
    }
}

impl StoreInner {
    /// Classifies one raw inbound value. Anything that is not an envelope
    /// with a recognized kind and this store's channel name is dropped
    /// before its payload is touched.
    fn handle_incoming(&self, raw: Value) {
        let envelope = match Envelope::from_value(raw) {
            Ok(envelope) => envelope,
            Err(error) => {
                debug!(%error, "discarding unclassifiable message");
                return;
            }
        };
        if !self.channel.matches(&envelope.channel) {
            debug!(
                channel = %envelope.channel,
                own = %self.channel,
                "discarding message for another channel"
            );
            return;
        }

        match envelope.kind {
            MessageKind::State => self.ingest_state(envelope.payload),
            MessageKind::PatchState => self.ingest_patch(envelope.payload),
            // Client-to-host kinds echoed on a shared feed; not ours.
            MessageKind::FetchState | MessageKind::Dispatch => {}
        }
    }

    /// Installs a full state from either the fetch reply or a STATE push.
    fn ingest_state(&self, raw: Value) {
        let state = match self.deserializer.deserialize(raw) {
            Ok(state) => state,
            Err(error) => {
                warn!(%error, "discarding state payload that failed deserialization");
                return;
            }
        };

        let drained = {
            let mut shared = self.shared.lock();
            shared.state = Arc::new(state);
            let first = !shared.ready;
            shared.ready = true;
            if first {
                shared.pending_patches.drain(..).collect()
            } else {
                Vec::new()
            }
        };
        self.notify();

        // Diffs that arrived while awaiting the first state, in arrival
        // order. Each application notifies on its own.
        for diff in drained {
            self.apply_patch(diff);
        }

        self.ready_tx.send_replace(true);
    }

    /// Queues or applies a pushed diff depending on readiness.
    fn ingest_patch(&self, raw: Value) {
        let diff = match self.deserializer.deserialize(raw) {
            Ok(diff) => diff,
            Err(error) => {
                warn!(%error, "discarding patch payload that failed deserialization");
                return;
            }
        };

        let apply_now = {
            let mut shared = self.shared.lock();
            if shared.ready {
                Some(diff)
            } else {
                shared.pending_patches.push_back(diff);
                None
            }
        };
        if let Some(diff) = apply_now {
            self.apply_patch(diff);
        }
    }

    fn replace_state(&self, new_state: Value) {
        {
            let mut shared = self.shared.lock();
            shared.state = Arc::new(new_state);
        }
        self.notify();
    }

    fn apply_patch(&self, diff: Value) {
        {
            let mut shared = self.shared.lock();
            let next = self.patch_strategy.apply(&shared.state, diff);
            shared.state = Arc::new(next);
        }
        self.notify();
    }

    /// Invokes every currently-registered listener once, in registration
    /// order, outside the registry lock so listeners may subscribe,
    /// unsubscribe, or read state re-entrantly.
    fn notify(&self) {
        let listeners = self.listeners.lock().snapshot();
        for listener in listeners {
            listener();
        }
    }
}
