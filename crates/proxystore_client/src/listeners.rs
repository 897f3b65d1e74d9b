//! Listener registry: ordered change callbacks.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// A registered change callback.
pub(crate) type Listener = Arc<dyn Fn() + Send + Sync>;

/// Ordered collection of listeners. Insertion order is preserved,
/// duplicates are permitted, removal is by registration id.
pub(crate) struct ListenerRegistry {
    entries: Vec<(u64, Listener)>,
    next_id: u64,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    pub(crate) fn insert(&mut self, listener: Listener) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// Removes the registration with the given id; a no-op if it is gone.
    pub(crate) fn remove(&mut self, id: u64) {
        self.entries.retain(|(entry_id, _)| *entry_id != id);
    }

    /// Clones the current listeners so they can be invoked without holding
    /// the registry lock.
    pub(crate) fn snapshot(&self) -> Vec<Listener> {
        self.entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Handle returned by [`crate::ProxyStore::subscribe`].
///
/// `unsubscribe` removes exactly the registration that produced this handle;
/// calling it again (or after the store is gone) is a no-op.
pub struct Subscription {
    registry: Weak<Mutex<ListenerRegistry>>,
    id: u64,
}

impl Subscription {
    pub(crate) fn new(registry: Weak<Mutex<ListenerRegistry>>, id: u64) -> Self {
        Self { registry, id }
    }

    /// Removes the listener this subscription registered. Idempotent.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().remove(self.id);
        }
    }
}
