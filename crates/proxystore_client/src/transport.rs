//! Transport seam for host communication.

use parking_lot::Mutex;
use proxystore_protocol::Envelope;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, oneshot};

/// Bidirectional asynchronous message delivery to and from the host.
///
/// The transport owns request/response correlation; the store never
/// fabricates correlation ids. Delivery guarantees, timeouts, and retries
/// are transport policy — the store implements none of them, so an
/// unanswered request leaves its receiver pending indefinitely.
pub trait Transport: Send + Sync + 'static {
    /// Sends a request envelope and returns the one-shot response slot.
    ///
    /// The receiver resolves with the host's raw answer. A null answer, or
    /// a sender dropped without answering, means the host produced no
    /// response.
    fn request(&self, envelope: Envelope) -> oneshot::Receiver<Value>;

    /// Returns a fresh feed of unsolicited messages pushed by the host.
    ///
    /// The feed is raw and may be multiplexed: it can carry traffic for
    /// other channels and values that are not envelopes at all. The store
    /// filters.
    fn incoming(&self) -> mpsc::UnboundedReceiver<Value>;

    /// The transport's last-known error detail, for diagnostics.
    fn last_error(&self) -> Option<String> {
        None
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn request(&self, envelope: Envelope) -> oneshot::Receiver<Value> {
        (**self).request(envelope)
    }

    fn incoming(&self) -> mpsc::UnboundedReceiver<Value> {
        (**self).incoming()
    }

    fn last_error(&self) -> Option<String> {
        (**self).last_error()
    }
}

/// A scripted transport for testing.
///
/// Requests are answered from a FIFO queue of canned replies; a request
/// with no queued reply stays pending forever. Pushed values fan out to
/// every feed handed out by [`Transport::incoming`].
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<Envelope>>,
    replies: Mutex<VecDeque<Value>>,
    pending: Mutex<Vec<oneshot::Sender<Value>>>,
    push_txs: Mutex<Vec<mpsc::UnboundedSender<Value>>>,
    drop_requests: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply for the next unanswered request.
    pub fn enqueue_reply(&self, reply: Value) {
        self.replies.lock().push_back(reply);
    }

    /// When set, new requests have their response slot dropped immediately,
    /// which the store observes as "no answer".
    pub fn set_drop_requests(&self, drop: bool) {
        self.drop_requests.store(drop, Ordering::SeqCst);
    }

    /// Sets the transport error detail reported by `last_error`.
    pub fn set_last_error(&self, detail: impl Into<String>) {
        *self.last_error.lock() = Some(detail.into());
    }

    /// Pushes a raw value onto every incoming feed.
    pub fn push(&self, value: Value) {
        self.push_txs
            .lock()
            .retain(|tx| tx.send(value.clone()).is_ok());
    }

    /// Returns the envelopes sent through `request`, in order.
    pub fn sent(&self) -> Vec<Envelope> {
        self.sent.lock().clone()
    }
}

impl Transport for MockTransport {
    fn request(&self, envelope: Envelope) -> oneshot::Receiver<Value> {
        self.sent.lock().push(envelope);

        let (tx, rx) = oneshot::channel();
        if self.drop_requests.load(Ordering::SeqCst) {
            return rx;
        }
        match self.replies.lock().pop_front() {
            Some(reply) => {
                let _ = tx.send(reply);
            }
            // No script for this request: keep the sender alive so the
            // receiver stays pending rather than observing a closed channel.
            None => self.pending.lock().push(tx),
        }
        rx
    }

    fn incoming(&self) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.push_txs.lock().push(tx);
        rx
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}
