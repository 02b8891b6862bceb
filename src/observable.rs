//! Observables: descriptions of push-based sequences.
//!
//! An [`Observable<T>`] is a cheap-to-clone handle over an
//! [`ObservableType<T>`] trait object. Nothing happens until someone
//! subscribes; every subscription runs the sequence anew and owns the
//! resources it allocates until it is disposed or the sequence terminates.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use rxkit::prelude::*;
//!
//! let seen = Arc::new(Mutex::new(vec![]));
//! let c_seen = seen.clone();
//!
//! Observable::range(1, 4, CurrentThreadScheduler)
//!   .unwrap()
//!   .map(|v| v * 10)
//!   .subscribe_next(move |v| c_seen.lock().unwrap().push(v));
//!
//! assert_eq!(*seen.lock().unwrap(), vec![10, 20, 30, 40]);
//! ```
//!
//! ## Creation operators
//!
//! | Operator | Emits |
//! |----------|-------|
//! | [`create`](Observable::create) | whatever the closure pushes |
//! | [`just`](Observable::just) | one value, then completes |
//! | [`of`](Observable::of) / [`from_iter`](Observable::from_iter) | each item, then completes |
//! | [`empty`](Observable::empty) / [`never`](Observable::never) / [`fail`](Observable::fail) | nothing |
//! | [`range`](Observable::range) | a run of integers |
//! | [`generate`](Observable::generate) | states of a loop |
//! | [`timer`](Observable::timer) / [`interval`](Observable::interval) | ticks |
use std::{fmt, sync::Arc};

use crate::{
  disposable::AnyDisposable,
  error::RxError,
  event::Event,
  observer::{AnonymousObserver, AnyObserver, Observer},
};

mod connectable;
mod create;
mod generate;
mod producer;
mod range;
mod sequence;
mod sink;
mod timer;

pub use connectable::{ConnectableObservable, ConnectableObservableType};
pub(crate) use connectable::MulticastAdapter;
pub use range::RangeInteger;
pub(crate) use producer::Producer;
pub(crate) use sink::Sink;

// ==================== ObservableType ====================

/// Anything that can be subscribed to.
pub trait ObservableType<T>: Send + Sync {
  /// Starts delivering the sequence to `observer`.
  ///
  /// Disposing the returned handle tears the subscription down; once
  /// `dispose` returns no further event reaches `observer`.
  fn subscribe_observer(&self, observer: AnyObserver<T>) -> AnyDisposable;
}

impl<T, O: ObservableType<T> + ?Sized> ObservableType<T> for Arc<O> {
  #[inline]
  fn subscribe_observer(&self, observer: AnyObserver<T>) -> AnyDisposable {
    (**self).subscribe_observer(observer)
  }
}

// ==================== Observable ====================

/// A type-erased, cloneable observable sequence.
pub struct Observable<T>(Arc<dyn ObservableType<T>>);

impl<T> Clone for Observable<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> fmt::Debug for Observable<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("Observable") }
}

impl<T: 'static> Observable<T> {
  pub fn new(source: impl ObservableType<T> + 'static) -> Self { Self(Arc::new(source)) }

  pub(crate) fn from_producer(producer: impl Producer<T> + 'static) -> Self
  where
    T: Send,
  {
    Self::new(producer::ProducerObservable::new(producer))
  }

  /// Subscribes `observer`.
  #[inline]
  pub fn subscribe(&self, observer: impl Observer<T> + 'static) -> AnyDisposable {
    self.0.subscribe_observer(AnyObserver::new(observer))
  }

  /// Subscribes an already type-erased observer.
  #[inline]
  pub fn subscribe_observer(&self, observer: AnyObserver<T>) -> AnyDisposable {
    self.0.subscribe_observer(observer)
  }

  /// Subscribes a closure receiving every event.
  ///
  /// The closure sees at most one stop event and nothing after it.
  pub fn subscribe_event(
    &self,
    on_event: impl Fn(Event<T>) + Send + Sync + 'static,
  ) -> AnyDisposable {
    self.subscribe(AnonymousObserver::new(on_event))
  }

  /// Subscribes a closure receiving the values. Errors are logged.
  pub fn subscribe_next(&self, on_next: impl Fn(T) + Send + Sync + 'static) -> AnyDisposable {
    self.subscribe_event(move |event| match event {
      Event::Next(value) => on_next(value),
      Event::Error(err) => tracing::warn!(error = %err, "unhandled error in subscription"),
      Event::Completed => {}
    })
  }

  /// Subscribes one closure per event kind.
  pub fn subscribe_with(
    &self,
    on_next: impl Fn(T) + Send + Sync + 'static,
    on_error: impl Fn(RxError) + Send + Sync + 'static,
    on_completed: impl Fn() + Send + Sync + 'static,
  ) -> AnyDisposable {
    self.subscribe_event(move |event| match event {
      Event::Next(value) => on_next(value),
      Event::Error(err) => on_error(err),
      Event::Completed => on_completed(),
    })
  }

  /// Hides the concrete source behind a plain observable.
  #[inline]
  pub fn as_observable(&self) -> Observable<T> { self.clone() }
}

impl<T: 'static> ObservableType<T> for Observable<T> {
  #[inline]
  fn subscribe_observer(&self, observer: AnyObserver<T>) -> AnyDisposable {
    self.0.subscribe_observer(observer)
  }
}
