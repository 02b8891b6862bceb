//! Connectable observables: one source subscription shared through a
//! subject.
//!
//! # Key Concepts
//!
//! - **Subscribing does not start the source**: observers attach to the
//!   internal subject only.
//! - **Connect**: `connect()` subscribes the subject to the source. Calling
//!   it again while connected returns the live connection.
//! - **Reconnect**: once a connection is disposed, or the source terminates,
//!   the next `connect()` starts over with a fresh subject.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use rxkit::prelude::*;
//!
//! let connectable = Observable::of(vec![1, 2, 3]).publish();
//!
//! let seen = Arc::new(Mutex::new(vec![]));
//! let (first, second) = (seen.clone(), seen.clone());
//! connectable.as_observable().subscribe_next(move |v| first.lock().unwrap().push(v));
//! connectable.as_observable().subscribe_next(move |v| second.lock().unwrap().push(v * 10));
//! assert!(seen.lock().unwrap().is_empty());
//!
//! connectable.connect();
//! assert_eq!(*seen.lock().unwrap(), vec![1, 10, 2, 20, 3, 30]);
//! ```
use std::{
  ptr,
  sync::{Arc, Weak},
};

use parking_lot::Mutex;

use crate::{
  atomic::{AtomicFlags, DISPOSED},
  disposable::{AnyDisposable, Cancelable, Disposable, SingleAssignmentDisposable},
  event::Event,
  observable::{Observable, ObservableType},
  observer::{AnyObserver, Observer},
  subject::Subject,
};

// ==================== Traits & Handle ====================

/// An observable whose source runs only between `connect()` and disposal of
/// the returned connection.
pub trait ConnectableObservableType<T>: ObservableType<T> {
  /// Subscribes the shared subject to the source.
  ///
  /// Returns the current connection when already connected.
  fn connect(&self) -> AnyDisposable;
}

/// A type-erased, cloneable connectable observable.
pub struct ConnectableObservable<T>(Arc<dyn ConnectableObservableType<T>>);

impl<T> Clone for ConnectableObservable<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T: 'static> ConnectableObservable<T> {
  pub fn new(source: impl ConnectableObservableType<T> + 'static) -> Self { Self(Arc::new(source)) }

  #[inline]
  pub fn connect(&self) -> AnyDisposable { self.0.connect() }

  /// The subscriber side, without access to `connect`.
  pub fn as_observable(&self) -> Observable<T> { Observable::new(self.clone()) }
}

impl<T> ObservableType<T> for ConnectableObservable<T> {
  #[inline]
  fn subscribe_observer(&self, observer: AnyObserver<T>) -> AnyDisposable {
    self.0.subscribe_observer(observer)
  }
}

impl<T> ConnectableObservableType<T> for ConnectableObservable<T> {
  #[inline]
  fn connect(&self) -> AnyDisposable { self.0.connect() }
}

// ==================== Subject Adapter ====================

/// Connects `source` through subjects built by `make_subject`, one subject
/// per connection.
pub(crate) struct MulticastAdapter<T, S>(Arc<AdapterInner<T, S>>);

struct AdapterInner<T, S> {
  source: Observable<T>,
  make_subject: Box<dyn Fn() -> S + Send + Sync>,
  state: Mutex<AdapterState<T, S>>,
}

struct AdapterState<T, S> {
  subject: Option<S>,
  connection: Option<Arc<Connection<T, S>>>,
}

impl<T: 'static, S: Subject<T>> MulticastAdapter<T, S> {
  pub(crate) fn new(source: Observable<T>, make_subject: impl Fn() -> S + Send + Sync + 'static) -> Self {
    Self(Arc::new(AdapterInner {
      source,
      make_subject: Box::new(make_subject),
      state: Mutex::new(AdapterState { subject: None, connection: None }),
    }))
  }
}

impl<T, S: Clone> AdapterInner<T, S> {
  fn lazy_subject(&self, state: &mut AdapterState<T, S>) -> S {
    state.subject.get_or_insert_with(|| (self.make_subject)()).clone()
  }
}

impl<T: 'static, S: Subject<T>> ObservableType<T> for MulticastAdapter<T, S> {
  fn subscribe_observer(&self, observer: AnyObserver<T>) -> AnyDisposable {
    let subject = self.0.lazy_subject(&mut self.0.state.lock());
    subject.subscribe_observer(observer)
  }
}

impl<T: 'static, S: Subject<T>> ConnectableObservableType<T> for MulticastAdapter<T, S> {
  fn connect(&self) -> AnyDisposable {
    let connection = {
      let mut state = self.0.state.lock();
      if let Some(connection) = &state.connection {
        return AnyDisposable::from_arc(connection.clone());
      }
      let connection = Arc::new(Connection {
        parent: Mutex::new(Some(Arc::downgrade(&self.0))),
        subject: self.0.lazy_subject(&mut state),
        subscription: SingleAssignmentDisposable::new(),
        disposed: AtomicFlags::new(),
      });
      state.connection = Some(connection.clone());
      connection
    };

    tracing::debug!("multicast source connected");
    let subscription = self.0.source.subscribe_observer(AnyObserver::from_arc(connection.clone()));
    connection.subscription.set_disposable(subscription);
    AnyDisposable::from_arc(connection)
  }
}

// ==================== Connection ====================

/// One source subscription feeding one subject.
///
/// Disposing it, or the source terminating, detaches it from the adapter so
/// the next `connect()` builds a new subject.
struct Connection<T, S> {
  parent: Mutex<Option<Weak<AdapterInner<T, S>>>>,
  subject: S,
  subscription: SingleAssignmentDisposable,
  disposed: AtomicFlags,
}

impl<T: 'static, S: Subject<T>> Observer<T> for Connection<T, S> {
  fn on(&self, event: Event<T>) {
    if self.disposed.is_set(DISPOSED) {
      return;
    }
    if event.is_stop_event() {
      self.dispose();
    }
    self.subject.on(event);
  }
}

impl<T: 'static, S: Subject<T>> Disposable for Connection<T, S> {
  fn dispose(&self) {
    if !self.disposed.set_once(DISPOSED) {
      return;
    }
    let parent = self.parent.lock().take();
    if let Some(parent) = parent.and_then(|parent| parent.upgrade()) {
      let released = {
        let mut state = parent.state.lock();
        let is_current =
          state.connection.as_ref().is_some_and(|current| ptr::eq(Arc::as_ptr(current), self));
        if is_current {
          tracing::debug!("multicast source disconnected");
          Some((state.connection.take(), state.subject.take()))
        } else {
          None
        }
      };
      drop(released);
    }
    self.subscription.dispose();
  }
}

impl<T: 'static, S: Subject<T>> Cancelable for Connection<T, S> {
  fn is_disposed(&self) -> bool { self.disposed.is_set(DISPOSED) }
}
