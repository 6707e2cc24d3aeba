//! Change Sources
//!
//! A change source is anything that can announce "I changed" to interested
//! parties without knowing what they do with it. Cells, notifiers and any
//! user type that wants to drive a [`Watching`](super::Watching) adapter
//! implement [`ChangeSource`].
//!
//! # Subscription Lifecycle
//!
//! Subscribing returns a [`Subscription`] handle. The handle holds only a
//! weak reference to the source's subscriber list:
//!
//! - Dropping the handle unsubscribes.
//! - Unsubscribing twice is a no-op.
//! - Unsubscribing after the source is gone is a no-op.
//! - A live handle never keeps its source alive.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tracing::debug;

use super::subscriber::{deliver, Callback, Snapshot, SubscriberId, SubscriberList};

/// Counter for generating unique source IDs.
static SOURCE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique source ID.
pub(crate) fn next_source_id() -> u64 {
    SOURCE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Something that emits change notifications.
pub trait ChangeSource {
    /// Register a boxed callback to run on every future change.
    fn subscribe_boxed(&self, callback: Callback) -> Subscription;

    /// Remove a subscription made on this source.
    ///
    /// Handles from other sources, and handles already unsubscribed, are
    /// ignored.
    fn unsubscribe(&self, subscription: &Subscription);

    /// Number of live subscriptions.
    fn subscriber_count(&self) -> usize;

    /// Register a callback to run on every future change.
    fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
        Self: Sized,
    {
        self.subscribe_boxed(Arc::new(callback))
    }
}

/// Handle to a registered change callback.
///
/// Dropping this handle unsubscribes the callback.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: SubscriberId,
    source_id: u64,
    list: Weak<SubscriberList>,
    active: AtomicBool,
}

impl Subscription {
    fn new(id: SubscriberId, source_id: u64, list: &Arc<SubscriberList>) -> Self {
        Self {
            id,
            source_id,
            list: Arc::downgrade(list),
            active: AtomicBool::new(true),
        }
    }

    /// The subscriber ID this handle controls.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    /// Whether the callback is still registered on a live source.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
            && self
                .list
                .upgrade()
                .map(|list| list.contains(self.id))
                .unwrap_or(false)
    }

    /// Stop receiving notifications. Idempotent.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        match self.list.upgrade() {
            Some(list) => {
                list.remove(self.id);
                debug!(source = self.source_id, subscriber = ?self.id, "unsubscribed");
            }
            None => {
                debug!(source = self.source_id, subscriber = ?self.id, "source already released");
            }
        }
    }

    fn belongs_to(&self, list: &Arc<SubscriberList>) -> bool {
        std::ptr::eq(self.list.as_ptr(), Arc::as_ptr(list))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("source", &self.source_id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// A change source without a value.
///
/// Calling [`notify`](Self::notify) runs every current subscriber once.
/// Clones share the same subscriber list.
#[derive(Clone)]
pub struct ChangeNotifier {
    id: u64,
    subscribers: Arc<SubscriberList>,
}

impl ChangeNotifier {
    /// Create a notifier with no subscribers.
    pub fn new() -> Self {
        Self {
            id: next_source_id(),
            subscribers: Arc::new(SubscriberList::new()),
        }
    }

    /// Get the notifier's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Notify every current subscriber.
    pub fn notify(&self) {
        deliver(&self.snapshot());
    }

    /// Capture the subscribers that a notification sent now would reach.
    pub(crate) fn snapshot(&self) -> Snapshot {
        self.subscribers.snapshot()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeSource for ChangeNotifier {
    fn subscribe_boxed(&self, callback: Callback) -> Subscription {
        let id = self.subscribers.insert(callback);
        debug!(source = self.id, subscriber = ?id, "subscribed");
        Subscription::new(id, self.id, &self.subscribers)
    }

    fn unsubscribe(&self, subscription: &Subscription) {
        if subscription.belongs_to(&self.subscribers) {
            subscription.unsubscribe();
        }
    }

    fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("id", &self.id)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
