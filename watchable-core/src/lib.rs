//! Watchable Core
//!
//! This crate provides an observable value cell for declarative UI code.
//! It implements:
//!
//! - `Watchable<T>`, a shared value cell with equality-gated change
//!   notification
//! - The `ChangeSource` subscription contract with RAII handles
//! - Two-way bindings over a cell
//! - A `Watching` adapter that re-renders when its source changes
//! - Serialization by delegation to the held value
//!
//! # Architecture
//!
//! - `reactive`: cells, change sources, bindings and the watching adapter
//! - `codec`: JSON and MessagePack helpers built on the serde passthrough
//! - `error`: the error type for those helpers
//!
//! # Example
//!
//! ```rust
//! use watchable_core::reactive::{Watchable, Watching};
//!
//! // Create a cell
//! let count = Watchable::new(0);
//!
//! // Render from it
//! let label = Watching::value_of(&count, |n| format!("Count: {n}"));
//!
//! // Update the cell
//! count.set(5);
//! assert_eq!(label.body(), "Count: 5");
//!
//! // Writing the same value again does not re-render
//! count.set(5);
//! assert_eq!(label.render_count(), 2);
//! ```

pub mod codec;
pub mod error;
pub mod reactive;

pub use error::{Error, Result};
