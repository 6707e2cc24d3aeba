//! Reactive Primitives
//!
//! This module implements the observable value cell and the pieces UI code
//! needs around it: change sources, subscriptions, bindings, and a watching
//! adapter.
//!
//! # Concepts
//!
//! ## Watchables
//!
//! A [`Watchable`] is a container for one mutable value. Writing a value
//! that differs from the current one (per the cell's [`ChangePolicy`])
//! stores it and synchronously notifies every subscriber.
//!
//! ## Change Sources
//!
//! [`ChangeSource`] is the subscription contract: subscribe a callback, get
//! back a [`Subscription`] that unsubscribes when dropped. Cells implement
//! it, and so does the value-less [`ChangeNotifier`].
//!
//! ## Bindings
//!
//! A [`Binding`] is a getter/setter pair. It lets a view read and write a
//! cell's value without owning the cell.
//!
//! ## Watching
//!
//! A [`Watching`] adapter re-runs a content closure each time its source
//! changes, keeping the latest output.
//!
//! # Implementation Notes
//!
//! Notification is a plain synchronous fan-out over a snapshot of the
//! subscriber list. There is no scheduler, batching, or dependency graph:
//! each qualifying write reaches each subscriber exactly once before the
//! write returns.

mod binding;
mod policy;
mod source;
mod subscriber;
mod watchable;
mod watching;

pub use binding::Binding;
pub use policy::ChangePolicy;
pub use source::{ChangeNotifier, ChangeSource, Subscription};
pub use subscriber::{Callback, SubscriberId, SubscriberList};
pub use watchable::Watchable;
pub use watching::Watching;
