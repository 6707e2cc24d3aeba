//! Watching Adapter
//!
//! A `Watching` is the glue between a change source and whatever renders
//! from it. It runs a content closure once when created and again after
//! every qualifying change, keeping the most recent output as its body.
//!
//! # How Watching Works
//!
//! 1. On creation, the content closure runs and its output becomes the body.
//!
//! 2. The adapter subscribes to the source. Each notification re-runs the
//!    content closure and replaces the body.
//!
//!    Every render draws a ticket before it runs the content. A finished
//!    render is stored only if no render with a later ticket has been
//!    stored already, so a slow render racing a newer one cannot leave an
//!    older body behind.
//!
//! 3. Dropping the adapter drops its [`Subscription`], which unsubscribes.
//!
//! The adapter keeps the source alive through the content closure (for
//! [`value_of`](Watching::value_of) and [`binding_of`](Watching::binding_of)
//! it holds a clone of the cell), while the source only holds the
//! adapter's callback, never the adapter itself.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::binding::Binding;
use super::source::{ChangeSource, Subscription};
use super::watchable::Watchable;

/// The stored output together with the ticket of the render that made it.
struct Frame<V> {
    ticket: u64,
    body: V,
}

/// Shared render state, reachable from the subscription callback.
struct RenderState<V> {
    content: Box<dyn Fn() -> V + Send + Sync>,
    frame: Mutex<Frame<V>>,
    tickets: AtomicU64,
    renders: AtomicUsize,
}

impl<V> RenderState<V> {
    fn render(&self) {
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst);
        // Run the content outside the lock so it may touch the source.
        let next = (self.content)();
        let renders = self.renders.fetch_add(1, Ordering::SeqCst) + 1;

        let mut frame = self.frame.lock();
        if ticket < frame.ticket {
            trace!(renders, ticket, "discarded render superseded by a newer one");
            return;
        }
        *frame = Frame { ticket, body: next };
        trace!(renders, ticket, "re-rendered");
    }
}

/// An adapter that re-renders its content whenever a source changes.
///
/// # Example
///
/// ```rust
/// use watchable_core::reactive::{Watchable, Watching};
///
/// let name = Watchable::new("world".to_string());
/// let greeting = Watching::value_of(&name, |name| format!("hello, {name}"));
///
/// assert_eq!(greeting.body(), "hello, world");
///
/// name.set("there".to_string());
/// assert_eq!(greeting.body(), "hello, there");
/// assert_eq!(greeting.render_count(), 2);
/// ```
pub struct Watching<V> {
    state: Arc<RenderState<V>>,
    subscription: Subscription,
}

impl<V> Watching<V>
where
    V: Send + 'static,
{
    /// Watch any change source, re-running `content` on each change.
    pub fn new<S, F>(source: &S, content: F) -> Self
    where
        S: ChangeSource + ?Sized,
        F: Fn() -> V + Send + Sync + 'static,
    {
        let body = content();
        let state = Arc::new(RenderState {
            content: Box::new(content),
            frame: Mutex::new(Frame { ticket: 0, body }),
            tickets: AtomicU64::new(1),
            renders: AtomicUsize::new(1),
        });

        // The callback only holds a weak reference, so the source never
        // keeps a dropped adapter's state alive.
        let weak = Arc::downgrade(&state);
        let subscription = source.subscribe_boxed(Arc::new(move || {
            if let Some(state) = weak.upgrade() {
                state.render();
            }
        }));

        Self {
            state,
            subscription,
        }
    }

    /// Watch a cell, passing its current value to `content`.
    pub fn value_of<T, F>(cell: &Watchable<T>, content: F) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(T) -> V + Send + Sync + 'static,
    {
        let reader = cell.clone();
        Self::new(cell, move || content(reader.get()))
    }

    /// Watch a cell, passing a two-way binding to `content`.
    pub fn binding_of<T, F>(cell: &Watchable<T>, content: F) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(Binding<T>) -> V + Send + Sync + 'static,
    {
        let binding = cell.binding();
        Self::new(cell, move || content(binding.clone()))
    }
}

impl<V> Watching<V> {
    /// A clone of the most recent render.
    pub fn body(&self) -> V
    where
        V: Clone,
    {
        self.state.frame.lock().body.clone()
    }

    /// Run `f` with a reference to the most recent render.
    ///
    /// The body is locked while `f` runs, so `f` must not change the
    /// watched source.
    pub fn with_body<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&V) -> R,
    {
        f(&self.state.frame.lock().body)
    }

    /// How many times the content has run, including the initial render.
    ///
    /// Renders overtaken by a newer one still count.
    pub fn render_count(&self) -> usize {
        self.state.renders.load(Ordering::SeqCst)
    }

    /// Whether the adapter is still attached to a live source.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for Watching<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watching")
            .field("body", &self.state.frame.lock().body)
            .field("render_count", &self.render_count())
            .field("subscription", &self.subscription)
            .finish()
    }
}
