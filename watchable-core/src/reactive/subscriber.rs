//! Subscriber bookkeeping for change sources.
//!
//! A subscriber is a callback registered on a change source. Every source
//! owns one [`SubscriberList`]; subscription handles only hold a weak
//! reference to it so they never keep the source alive.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use smallvec::SmallVec;

/// Unique identifier for a subscriber.
///
/// Each registration gets a fresh ID, so subscribing the same closure twice
/// yields two independent subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A change callback as stored by a source.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Callbacks captured for a single notification round.
///
/// Most cells have a handful of watchers, so the common case stays inline.
pub type Snapshot = SmallVec<[Callback; 4]>;

/// The ordered set of subscribers attached to one change source.
///
/// Iteration order is subscription order. Removing a subscriber keeps the
/// relative order of the others.
#[derive(Default)]
pub struct SubscriberList {
    entries: RwLock<IndexMap<SubscriberId, Callback>>,
}

impl SubscriberList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback and return its ID.
    pub fn insert(&self, callback: Callback) -> SubscriberId {
        let id = SubscriberId::new();
        self.entries.write().insert(id, callback);
        id
    }

    /// Remove a subscriber. Returns `false` if it was not registered.
    pub fn remove(&self, id: SubscriberId) -> bool {
        self.entries.write().shift_remove(&id).is_some()
    }

    /// Whether the given subscriber is currently registered.
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.entries.read().contains_key(&id)
    }

    /// Capture the current callbacks in subscription order.
    ///
    /// The lock is released before this returns, so the caller may invoke
    /// the callbacks while they subscribe or unsubscribe.
    pub fn snapshot(&self) -> Snapshot {
        self.entries.read().values().cloned().collect()
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for SubscriberList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberList")
            .field("len", &self.len())
            .finish()
    }
}

/// Invoke every callback of a snapshot once, in order.
pub(crate) fn deliver(snapshot: &Snapshot) {
    for callback in snapshot.iter() {
        callback();
    }
}
