//! Subjects: values that are both an observable and an observer.
//!
//! A subject fans every event it receives out to the observers currently
//! subscribed to it. The variants differ in what a new subscriber receives
//! before the live events:
//!
//! | Subject | Late subscriber receives |
//! |---------|--------------------------|
//! | [`PublishSubject`] | nothing, only live events |
//! | [`BehaviorSubject`] | the current value |
//! | [`ReplaySubject`] | the buffered values |
//! | [`AsyncSubject`] | only the last value, once completed |
//!
//! Every subject latches its stop event: once it has seen `Error` or
//! `Completed` it drops its observers and replays the stop event to anyone
//! subscribing afterwards.
//!
//! Subjects are cheap-to-clone handles; clones share one subject.
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::{
  bag::{Bag, BagKey},
  disposable::{Cancelable, Disposable},
  event::Event,
  observable::{Observable, ObservableType},
  observer::{AnyObserver, Observer},
};

mod async_subject;
mod behavior_subject;
mod publish_subject;
mod replay_subject;

pub use async_subject::AsyncSubject;
pub use behavior_subject::BehaviorSubject;
pub use publish_subject::PublishSubject;
pub use replay_subject::ReplaySubject;

// ==================== Subject Trait ====================

/// An observable that is also an observer.
pub trait Subject<T: 'static>: Observer<T> + ObservableType<T> + Clone + 'static {
  /// The subject seen only as an observable.
  fn as_observable(&self) -> Observable<T> { Observable::new(self.clone()) }

  /// The subject seen only as an observer.
  fn as_observer(&self) -> AnyObserver<T> { AnyObserver::new(self.clone()) }
}

// ==================== Shared Plumbing ====================

/// Observers of a subject. Mutated through `Arc::make_mut`, so a dispatch
/// snapshot is a reference copy that later mutations never touch.
pub(crate) type Observers<T> = Arc<Bag<AnyObserver<T>>>;

/// Delivers `event` to every observer of a snapshot.
pub(crate) fn dispatch<T: Clone>(observers: &Observers<T>, event: &Event<T>) {
  observers.for_each(|observer| observer.on(event.clone()));
}

/// A subject that can remove an observer by key.
pub(crate) trait Unsubscribe: Send + Sync {
  fn unsubscribe(&self, key: BagKey);
}

/// Removes one observer from a subject when disposed.
///
/// Holds the subject weakly: removing an observer never keeps a subject
/// alive and never disposes it.
pub(crate) struct SubscriptionDisposable {
  owner: Mutex<Option<Weak<dyn Unsubscribe>>>,
  key: BagKey,
}

impl SubscriptionDisposable {
  pub(crate) fn new<U: Unsubscribe + 'static>(owner: &Arc<U>, key: BagKey) -> Self {
    let owner: Weak<dyn Unsubscribe> = Arc::downgrade(owner) as Weak<dyn Unsubscribe>;
    Self { owner: Mutex::new(Some(owner)), key }
  }
}

impl Disposable for SubscriptionDisposable {
  fn dispose(&self) {
    let owner = self.owner.lock().take();
    if let Some(owner) = owner.and_then(|owner| owner.upgrade()) {
      owner.unsubscribe(self.key);
    }
  }
}

impl Cancelable for SubscriptionDisposable {
  fn is_disposed(&self) -> bool { self.owner.lock().is_none() }
}
