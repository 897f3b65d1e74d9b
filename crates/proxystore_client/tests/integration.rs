//! Integration tests for the proxy store against the reference host.

use parking_lot::Mutex;
use proxystore_client::{ProxyStore, StoreConfig, StoreError, Transport, HOST_ERROR_PREFIX};
use proxystore_host::{DispatchOutcome, Host, RejectAll};
use proxystore_protocol::{ChannelName, Envelope};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// A transport that routes requests directly into an in-memory host.
struct InMemoryTransport {
    host: Arc<Host>,
    last_error: Mutex<Option<String>>,
}

impl InMemoryTransport {
    fn new(host: Arc<Host>) -> Self {
        Self {
            host,
            last_error: Mutex::new(None),
        }
    }
}

impl Transport for InMemoryTransport {
    fn request(&self, envelope: Envelope) -> oneshot::Receiver<Value> {
        let (tx, rx) = oneshot::channel();
        match self.host.handle_request(envelope) {
            Some(reply) => {
                let _ = tx.send(reply);
            }
            // Dropping the sender is how this transport says "no answer".
            None => {
                *self.last_error.lock() = Some("channel is not registered on the host".into());
            }
        }
        rx
    }

    fn incoming(&self) -> mpsc::UnboundedReceiver<Value> {
        self.host.subscribe()
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}

fn channel(name: &str) -> ChannelName {
    ChannelName::new(name).unwrap()
}

/// Increments `count` by the action's `by` field, returning the new count.
fn counter_handler() -> impl proxystore_host::DispatchHandler {
    |state: &Value, action: Value| -> Result<DispatchOutcome, Value> {
        let by = action.get("by").and_then(Value::as_i64).unwrap_or(1);
        let count = state.get("count").and_then(Value::as_i64).unwrap_or(0) + by;
        Ok(DispatchOutcome::new(json!({"count": count}), json!(count)))
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn end_to_end_fetch_patch_dispatch() {
    let host = Arc::new(Host::new());
    host.register(channel("main"), json!({"count": 0}), counter_handler())
        .unwrap();

    let store = ProxyStore::new(
        StoreConfig::new("main"),
        InMemoryTransport::new(Arc::clone(&host)),
    )
    .unwrap();

    // The fetch reply resolves readiness with the host's snapshot.
    store.ready().await;
    assert_eq!(*store.get_state(), json!({"count": 0}));

    let notifications = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notifications);
    let _subscription = store.subscribe(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // Host pushes a diff; the mirror follows with one notification.
    host.patch_state("main", json!({"count": 1})).unwrap();
    settle().await;
    assert_eq!(*store.get_state(), json!({"count": 1}));
    assert_eq!(notifications.load(Ordering::SeqCst), 1);

    // Dispatch runs on the host; the result comes back and the broadcast
    // state catches the mirror up.
    let result = store.dispatch(json!({"type": "add", "by": 2})).await.unwrap();
    assert_eq!(result, json!(3));
    assert_eq!(host.state("main").unwrap(), json!({"count": 3}));

    settle().await;
    assert_eq!(*store.get_state(), json!({"count": 3}));
}

#[tokio::test]
async fn channels_sharing_one_host_stay_isolated() {
    let host = Arc::new(Host::new());
    host.register(channel("a"), json!({"who": "a"}), RejectAll)
        .unwrap();
    host.register(channel("b"), json!({"who": "b"}), RejectAll)
        .unwrap();

    let store_a = ProxyStore::new(
        StoreConfig::new("a"),
        InMemoryTransport::new(Arc::clone(&host)),
    )
    .unwrap();
    let store_b = ProxyStore::new(
        StoreConfig::new("b"),
        InMemoryTransport::new(Arc::clone(&host)),
    )
    .unwrap();

    store_a.ready().await;
    store_b.ready().await;

    // Both feeds carry both channels' traffic; each store only reacts to
    // its own.
    host.patch_state("a", json!({"touched": true})).unwrap();
    settle().await;

    assert_eq!(*store_a.get_state(), json!({"who": "a", "touched": true}));
    assert_eq!(*store_b.get_state(), json!({"who": "b"}));
}

#[tokio::test]
async fn dispatch_to_unregistered_channel_reports_no_response() {
    let host = Arc::new(Host::new());
    let store = ProxyStore::new(
        StoreConfig::new("ghost"),
        InMemoryTransport::new(Arc::clone(&host)),
    )
    .unwrap();

    let err = store.dispatch(json!({"type": "noop"})).await.unwrap_err();
    assert!(matches!(err, StoreError::NoResponse { .. }));
    assert!(err.to_string().starts_with(HOST_ERROR_PREFIX));
    assert!(err.to_string().contains("not registered"));
}

#[tokio::test]
async fn host_error_reaches_the_dispatching_caller() {
    let host = Arc::new(Host::new());
    host.register(channel("main"), json!({}), RejectAll).unwrap();

    let store = ProxyStore::new(
        StoreConfig::new("main"),
        InMemoryTransport::new(Arc::clone(&host)),
    )
    .unwrap();
    store.ready().await;

    let err = store.dispatch(json!({"type": "noop"})).await.unwrap_err();
    match err {
        StoreError::Remote { detail } => {
            assert!(detail.as_str().unwrap().contains("does not accept"));
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn push_arriving_before_the_fetch_reply_still_resolves_readiness() {
    // Register the channel only after the store has issued its fetch, so
    // the fetch goes unanswered and readiness must come from a push.
    let host = Arc::new(Host::new());
    let store = ProxyStore::new(
        StoreConfig::new("late"),
        InMemoryTransport::new(Arc::clone(&host)),
    )
    .unwrap();

    host.register(channel("late"), json!({}), RejectAll).unwrap();
    host.replace_state("late", json!({"late": true})).unwrap();

    store.ready().await;
    assert_eq!(*store.get_state(), json!({"late": true}));
}
