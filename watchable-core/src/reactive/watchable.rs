//! Watchable Implementation
//!
//! A `Watchable` is an observable value cell. It holds one value and tells
//! its subscribers when that value changes.
//!
//! # How Watchables Work
//!
//! 1. A write compares the new value against the stored one using the cell's
//!    [`ChangePolicy`].
//!
//! 2. If the policy reports no change, the write is dropped: nothing is
//!    stored and nobody is notified.
//!
//! 3. Otherwise the value is stored and every subscriber present at that
//!    moment is called once, in subscription order, before the write returns.
//!
//! # Thread Safety
//!
//! The value lives behind an `RwLock`. The compare-and-store step and the
//! capture of the subscriber snapshot happen under the write lock, so
//! concurrent writers are serialized and each qualifying write reaches
//! exactly the subscribers registered when it was stored. Callbacks run
//! after the lock is released and may freely read, write, subscribe or
//! unsubscribe on the same cell. Delivery order between two writers on
//! different threads is not defined.
//!
//! # Ownership
//!
//! Clones share one cell. Subscriptions only hold weak references, so the
//! cell is freed when the last clone is dropped, and any remaining
//! [`Subscription`] handles become inert.

use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::trace;

use super::binding::Binding;
use super::policy::ChangePolicy;
use super::source::{ChangeNotifier, ChangeSource, Subscription};
use super::subscriber::{deliver, Callback, Snapshot};

/// An observable value cell.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use watchable_core::reactive::{ChangeSource, Watchable};
///
/// let count = Watchable::new(5);
/// let fired = Arc::new(AtomicUsize::new(0));
///
/// let fired_clone = fired.clone();
/// let _sub = count.subscribe(move || {
///     fired_clone.fetch_add(1, Ordering::SeqCst);
/// });
///
/// count.set(7);
/// count.set(7); // equal, suppressed
///
/// assert_eq!(count.get(), 7);
/// assert_eq!(fired.load(Ordering::SeqCst), 1);
/// ```
pub struct Watchable<T> {
    /// The current value.
    value: Arc<RwLock<T>>,

    /// Decides which writes notify.
    policy: ChangePolicy<T>,

    /// Subscriber list and notification fan-out.
    notifier: ChangeNotifier,
}

impl<T: PartialEq> Watchable<T> {
    /// Create a cell that notifies only when a write changes the value.
    pub fn new(value: T) -> Self {
        Self::with_policy(value, ChangePolicy::equality())
    }
}

impl<T> Watchable<T> {
    /// Create a cell with an explicit change policy.
    pub fn with_policy(value: T, policy: ChangePolicy<T>) -> Self {
        Self {
            value: Arc::new(RwLock::new(value)),
            policy,
            notifier: ChangeNotifier::new(),
        }
    }

    /// Create a cell that notifies on every write.
    ///
    /// This is the only option for values without `PartialEq`.
    pub fn unconditional(value: T) -> Self {
        Self::with_policy(value, ChangePolicy::Always)
    }

    /// Get the cell's unique ID.
    pub fn id(&self) -> u64 {
        self.notifier.id()
    }

    /// The policy this cell was created with.
    pub fn policy(&self) -> ChangePolicy<T> {
        self.policy
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.read().clone()
    }

    /// Run `f` with a reference to the current value.
    ///
    /// The read lock is held while `f` runs, so `f` must not write to this
    /// cell.
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&*self.value.read())
    }

    /// Set a new value and notify subscribers if it counts as a change.
    pub fn set(&self, value: T) {
        self.replace(value);
    }

    /// Set a new value, returning the previous one.
    ///
    /// Returns `None` when the policy suppressed the write; in that case the
    /// stored value is untouched and `value` is dropped.
    pub fn replace(&self, value: T) -> Option<T> {
        let (previous, snapshot) = {
            let mut guard = self.value.write();
            if !self.policy.is_changed(&guard, &value) {
                trace!(cell = self.id(), "write suppressed, value unchanged");
                return None;
            }
            let previous = std::mem::replace(&mut *guard, value);
            (previous, self.notifier.snapshot())
        };

        self.publish(&snapshot);
        Some(previous)
    }

    /// Update the value using a function of the current one.
    ///
    /// The read, the comparison and the store happen under one write lock,
    /// so `f` must not touch this cell.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let snapshot = {
            let mut guard = self.value.write();
            let next = f(&*guard);
            if !self.policy.is_changed(&guard, &next) {
                trace!(cell = self.id(), "update suppressed, value unchanged");
                return;
            }
            *guard = next;
            self.notifier.snapshot()
        };

        self.publish(&snapshot);
    }

    /// Notify a captured set of subscribers about a stored write.
    fn publish(&self, snapshot: &Snapshot) {
        trace!(cell = self.id(), subscribers = snapshot.len(), "value changed");
        deliver(snapshot);
    }
}

impl<T> Watchable<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Subscribe a callback that receives the value after each change.
    ///
    /// The callback reads the cell when it runs, so with concurrent writers
    /// it sees the latest value rather than the one that triggered it. It
    /// holds only a weak reference to the value.
    pub fn on_change<F>(&self, f: F) -> Subscription
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let value = Arc::downgrade(&self.value);
        self.notifier.subscribe(move || {
            if let Some(value) = value.upgrade() {
                let current = value.read().clone();
                f(current);
            }
        })
    }

    /// A two-way binding that reads and writes this cell.
    ///
    /// Writes through the binding follow the cell's policy.
    pub fn binding(&self) -> Binding<T> {
        let reader = self.clone();
        let writer = self.clone();
        Binding::new(move || reader.get(), move |value| writer.set(value))
    }
}

impl<U: PartialEq> Watchable<Option<U>> {
    /// Create a cell holding `None`.
    pub fn empty() -> Self {
        Self::new(None)
    }
}

impl<T> ChangeSource for Watchable<T> {
    fn subscribe_boxed(&self, callback: Callback) -> Subscription {
        self.notifier.subscribe_boxed(callback)
    }

    fn unsubscribe(&self, subscription: &Subscription) {
        self.notifier.unsubscribe(subscription)
    }

    fn subscriber_count(&self) -> usize {
        self.notifier.subscriber_count()
    }
}

impl<T> Clone for Watchable<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            policy: self.policy,
            notifier: self.notifier.clone(),
        }
    }
}

impl<T: Default + PartialEq> Default for Watchable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: PartialEq> From<T> for Watchable<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

// Equality and hashing look at the held value, never at cell identity.

impl<T: PartialEq> PartialEq for Watchable<T> {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.value, &other.value) {
            let value = self.value.read();
            return *value == *value;
        }

        // Lock in address order so `a == b` and `b == a` on two threads
        // cannot wait on each other behind queued writers.
        let self_first = Arc::as_ptr(&self.value) < Arc::as_ptr(&other.value);
        let (first, second) = if self_first {
            (&self.value, &other.value)
        } else {
            (&other.value, &self.value)
        };
        let first = first.read();
        let second = second.read();
        if self_first {
            *first == *second
        } else {
            *second == *first
        }
    }
}

impl<T: Eq> Eq for Watchable<T> {}

impl<T: Hash> Hash for Watchable<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.read().hash(state)
    }
}

// Serialization is the held value's own encoding, with no envelope.

impl<T: Serialize> Serialize for Watchable<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.value.read().serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Watchable<T>
where
    T: Deserialize<'de> + PartialEq,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Watchable::new)
    }
}

impl<T: Debug> Debug for Watchable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watchable")
            .field("id", &self.id())
            .field("value", &*self.value.read())
            .field("policy", &self.policy)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::hash_map::DefaultHasher;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn count_notifications<T>(cell: &Watchable<T>) -> (Arc<AtomicUsize>, Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let sub = cell.subscribe(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        (count, sub)
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn watchable_get_and_set() {
        let cell = Watchable::new(0);
        assert_eq!(cell.get(), 0);

        cell.set(42);
        assert_eq!(cell.get(), 42);
    }

    #[test]
    fn watchable_update() {
        let cell = Watchable::new(10);
        cell.update(|v| v + 5);
        assert_eq!(cell.get(), 15);
    }

    #[test]
    fn equal_write_is_suppressed() {
        let cell = Watchable::new(5);
        let (count, _sub) = count_notifications(&cell);

        cell.set(7);
        cell.set(7);
        cell.update(|v| *v);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(cell.get(), 7);
    }

    #[test]
    fn unconditional_cell_notifies_every_write() {
        let cell = Watchable::unconditional(1);
        let (count, _sub) = count_notifications(&cell);

        cell.set(1);
        cell.set(1);

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn values_without_equality_can_be_watched() {
        struct Opaque(u8);

        let cell = Watchable::unconditional(Opaque(1));
        let (count, _sub) = count_notifications(&cell);

        cell.set(Opaque(2));
        assert_eq!(cell.with(|v| v.0), 2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn replace_returns_previous_only_on_change() {
        let cell = Watchable::new("a".to_string());

        assert_eq!(cell.replace("b".to_string()), Some("a".to_string()));
        assert_eq!(cell.replace("b".to_string()), None);
        assert_eq!(cell.get(), "b");
    }

    #[test]
    fn watchable_unsubscribe() {
        let cell = Watchable::new(0);
        let (count, sub) = count_notifications(&cell);

        cell.set(1);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        cell.unsubscribe(&sub);
        cell.set(2);
        // Should not have been called again
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn watchable_clone_shares_state() {
        let cell1 = Watchable::new(0);
        let cell2 = cell1.clone();
        let (count, _sub) = count_notifications(&cell1);

        cell1.set(42);
        assert_eq!(cell2.get(), 42);

        cell2.set(100);
        assert_eq!(cell1.get(), 100);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(cell1.id(), cell2.id());
    }

    #[test]
    fn watchable_ids_are_unique() {
        let c1 = Watchable::new(0);
        let c2 = Watchable::new(0);
        let c3 = Watchable::new(0);

        assert_ne!(c1.id(), c2.id());
        assert_ne!(c2.id(), c3.id());
        assert_ne!(c1.id(), c3.id());
    }

    #[test]
    fn subscribers_run_in_subscription_order() {
        let cell = Watchable::new(0);
        let log = Arc::new(Mutex::new(Vec::new()));

        let subs: Vec<_> = (0..3)
            .map(|tag| {
                let log = log.clone();
                cell.subscribe(move || log.lock().push(tag))
            })
            .collect();

        cell.set(1);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
        drop(subs);
    }

    #[test]
    fn callback_may_write_back() {
        let cell = Watchable::new(0);
        let writer = cell.clone();
        // Clamp: anything above 10 is written back as 10.
        let _sub = cell.subscribe(move || {
            if writer.get() > 10 {
                writer.set(10);
            }
        });

        cell.set(50);
        assert_eq!(cell.get(), 10);
    }

    #[test]
    fn on_change_receives_new_value() {
        let cell = Watchable::new(String::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let _sub = cell.on_change(move |value| seen_clone.lock().push(value));
        cell.set("x".to_string());
        cell.set("x".to_string());
        cell.set("y".to_string());

        assert_eq!(*seen.lock(), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn on_change_does_not_keep_cell_alive() {
        let cell = Watchable::new(1);
        let weak = Arc::downgrade(&cell.value);
        let sub = cell.on_change(|_| {});

        drop(cell);
        assert!(weak.upgrade().is_none());
        assert!(!sub.is_active());
    }

    #[test]
    fn binding_writes_through_policy() {
        let cell = Watchable::new(3);
        let (count, _sub) = count_notifications(&cell);
        let binding = cell.binding();

        binding.set(3);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        binding.set(4);
        assert_eq!(cell.get(), 4);
        assert_eq!(binding.get(), 4);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_and_default() {
        let cell: Watchable<Option<u32>> = Watchable::empty();
        assert_eq!(cell.get(), None);

        let cell: Watchable<Vec<u8>> = Watchable::default();
        assert!(cell.with(|v| v.is_empty()));
    }

    #[test]
    fn equality_and_hash_follow_value() {
        let a = Watchable::new(7);
        let b = Watchable::new(7);
        let c = Watchable::from(8);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, a.clone());
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(hash_of(&a), hash_of(&7));
    }

    #[test]
    fn crossed_comparisons_with_writers_finish() {
        let a = Watchable::new(0u64);
        let b = Watchable::new(0u64);
        let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));

        let writers: Vec<_> = [a.clone(), b.clone()]
            .into_iter()
            .map(|cell| {
                let stop = stop.clone();
                std::thread::spawn(move || {
                    let mut next = 0;
                    while !stop.load(Ordering::SeqCst) {
                        next += 1;
                        cell.set(next);
                    }
                })
            })
            .collect();

        let comparers: Vec<_> = [(a.clone(), b.clone()), (b.clone(), a.clone())]
            .into_iter()
            .map(|(lhs, rhs)| {
                std::thread::spawn(move || {
                    for _ in 0..2_000 {
                        let _ = lhs == rhs;
                    }
                })
            })
            .collect();

        for handle in comparers {
            handle.join().unwrap();
        }
        stop.store(true, Ordering::SeqCst);
        for handle in writers {
            handle.join().unwrap();
        }

        a.set(9);
        b.set(9);
        assert_eq!(a, b);
        assert_eq!(b, a);
    }

    #[test]
    fn debug_shows_value() {
        let cell = Watchable::new(3);
        let text = format!("{:?}", cell);
        assert!(text.contains("value: 3"));
        assert!(text.contains("Compare"));
    }
}
