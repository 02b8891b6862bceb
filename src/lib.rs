//! # rxkit: a thread-safe reactive-stream engine
//!
//! Push-based sequences in the ReactiveX style, built around three
//! guarantees: every subscription honors the `Next* (Error | Completed)?`
//! grammar, nothing is delivered after `dispose()` returns, and every owned
//! resource is released exactly once, whatever the thread interleaving.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use rxkit::prelude::*;
//!
//! let seen = Arc::new(Mutex::new(vec![]));
//! let c_seen = seen.clone();
//!
//! Observable::range(0, 10, CurrentThreadScheduler)
//!   .unwrap()
//!   .map(|v| v * 2)
//!   .subscribe_next(move |v| c_seen.lock().unwrap().push(v));
//!
//! assert_eq!(seen.lock().unwrap().len(), 10);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | A cloneable description of a sequence |
//! | [`Observer`] | Consumes `Next`, `Error` and `Completed` events |
//! | [`AnyDisposable`] | Handle to tear down a subscription |
//! | [`Scheduler`] | Decides where and when work runs |
//! | [`PublishSubject`] | Both an observer and an observable |
//! | [`ConnectableObservable`] | One shared source subscription, started by `connect()` |
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): the serial-queue scheduler, backed by
//!   a single-thread `futures` pool.
//! - **`timer`** (default): timed scheduling on the serial queue.
//! - **`tokio-scheduler`**: a scheduler on top of a Tokio runtime handle.
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`AnyDisposable`]: disposable::AnyDisposable
//! [`Scheduler`]: scheduler::Scheduler
//! [`PublishSubject`]: subject::PublishSubject
//! [`ConnectableObservable`]: observable::ConnectableObservable

mod atomic;

pub mod bag;
pub mod config;
pub mod disposable;
pub mod error;
pub mod event;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod scheduler;
pub mod subject;

// Re-export the prelude module
pub use prelude::*;

// Bring the README into Cargo-driven doctests. This module is only compiled
// for rustdoc doctest builds.
#[cfg(doctest)]
mod __markdown_doctests {
  mod readme {
    #![doc = include_str!("../README.md")]
  }
}
