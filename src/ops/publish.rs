use crate::{
  observable::{ConnectableObservable, Observable},
  subject::{PublishSubject, ReplaySubject},
};

/// How long the subject behind [`share`](Observable::share) lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubjectLifetimeScope {
  /// A fresh subject per connection. Once every subscriber is gone, or the
  /// source terminates, the next subscriber starts the source over with an
  /// empty replay buffer.
  #[default]
  WhileConnected,
  /// One subject for the lifetime of the observable. Later subscribers see
  /// its buffer, and its stop event once the source has terminated.
  Forever,
}

impl<T: Clone + Send + 'static> Observable<T> {
  /// A connectable observable multicasting through a [`PublishSubject`].
  pub fn publish(self) -> ConnectableObservable<T> { self.multicast_with(PublishSubject::new) }

  /// A connectable observable that replays up to `buffer_size` values to
  /// every subscriber.
  pub fn replay(self, buffer_size: usize) -> ConnectableObservable<T> {
    self.multicast_with(move || ReplaySubject::with_buffer_size(buffer_size))
  }

  /// A connectable observable that replays every value.
  pub fn replay_all(self) -> ConnectableObservable<T> { self.multicast_with(ReplaySubject::unbounded) }

  /// Shares one subscription to the source among all subscribers, replaying
  /// the last `replay` values to late ones.
  ///
  /// The source is connected on the first subscription and disconnected
  /// after the last one is disposed.
  ///
  /// ```rust
  /// use std::sync::{
  ///   atomic::{AtomicUsize, Ordering},
  ///   Arc,
  /// };
  ///
  /// use rxkit::prelude::*;
  ///
  /// let subscriptions = Arc::new(AtomicUsize::new(0));
  /// let c_subscriptions = subscriptions.clone();
  /// let source = PublishSubject::<i32>::new();
  /// let c_source = source.clone();
  /// let shared = Observable::create(move |observer| {
  ///   c_subscriptions.fetch_add(1, Ordering::SeqCst);
  ///   c_source.as_observable().subscribe_observer(observer)
  /// })
  /// .share(1, SubjectLifetimeScope::WhileConnected);
  ///
  /// let first = shared.subscribe_next(|_| {});
  /// source.on_next(1);
  /// let second = shared.subscribe_next(|v| assert_eq!(v, 1));
  /// assert_eq!(subscriptions.load(Ordering::SeqCst), 1);
  ///
  /// first.dispose();
  /// second.dispose();
  /// assert!(!source.has_observers());
  /// ```
  pub fn share(self, replay: usize, scope: SubjectLifetimeScope) -> Observable<T> {
    let connectable = match (replay, scope) {
      (0, SubjectLifetimeScope::WhileConnected) => self.multicast_with(PublishSubject::new),
      (0, SubjectLifetimeScope::Forever) => self.multicast(PublishSubject::new()),
      (n, SubjectLifetimeScope::WhileConnected) => self.replay(n),
      (n, SubjectLifetimeScope::Forever) => self.multicast(ReplaySubject::with_buffer_size(n)),
    };
    connectable.ref_count()
  }
}
