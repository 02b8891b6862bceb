//! Operators on [`Observable`](crate::observable::Observable) and
//! [`ConnectableObservable`](crate::observable::ConnectableObservable).
//!
//! Every operator is an inherent method, so importing the observable type is
//! enough to use them.
//!
//! | Operator | Module |
//! |----------|--------|
//! | `map`, `try_map` | [`map`] |
//! | `start_with` | [`start_with`] |
//! | `multicast`, `multicast_with`, `multicast_selector` | [`multicast`] |
//! | `publish`, `replay`, `replay_all`, `share` | [`publish`] |
//! | `ref_count` | [`ref_count`] |
pub mod map;
pub mod multicast;
pub mod publish;
pub mod ref_count;
pub mod start_with;

pub use publish::SubjectLifetimeScope;
