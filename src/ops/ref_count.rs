use std::{cell::RefCell, sync::Arc};

use parking_lot::{Mutex, ReentrantMutex};

use crate::{
  disposable::{AnyDisposable, CancelToken, Disposable},
  error::fatal_error,
  event::Event,
  observable::{ConnectableObservable, Observable, ObservableType, Producer, Sink},
  observer::{AnyObserver, Observer},
};

/// Subscriber accounting shared by every subscription of one `ref_count()`
/// observable.
struct RefCountState {
  count: usize,
  /// Bumped every time the connection is released, so disposal callbacks of
  /// an older connection become no-ops.
  connection_id: u64,
  connection: Option<AnyDisposable>,
}

type SharedState = Arc<ReentrantMutex<RefCell<RefCountState>>>;

struct RefCount<T> {
  source: ConnectableObservable<T>,
  state: SharedState,
}

impl<T: Send + 'static> ConnectableObservable<T> {
  /// Connects on the first subscription and disconnects once the last
  /// subscription is disposed or the source terminates.
  ///
  /// ```rust
  /// use rxkit::prelude::*;
  ///
  /// let source = PublishSubject::<i32>::new();
  /// let shared = source.as_observable().publish().ref_count();
  ///
  /// let first = shared.subscribe_next(|_| {});
  /// let second = shared.subscribe_next(|_| {});
  /// assert!(source.has_observers());
  ///
  /// first.dispose();
  /// assert!(source.has_observers());
  /// second.dispose();
  /// assert!(!source.has_observers());
  /// ```
  pub fn ref_count(&self) -> Observable<T> {
    let state = RefCountState { count: 0, connection_id: 0, connection: None };
    Observable::from_producer(RefCount {
      source: self.clone(),
      state: Arc::new(ReentrantMutex::new(RefCell::new(state))),
    })
  }
}

impl<T: Send + 'static> Producer<T> for RefCount<T> {
  fn run(&self, observer: AnyObserver<T>, cancel: CancelToken) -> (AnyDisposable, AnyDisposable) {
    let sink = Arc::new(RefCountSink {
      sink: Sink::new(observer, cancel),
      state: self.state.clone(),
      id_snapshot: Mutex::new(None),
    });
    let subscription = sink.run(&self.source);
    (AnyDisposable::from_arc(sink), subscription)
  }
}

struct RefCountSink<T> {
  sink: Sink<T>,
  state: SharedState,
  id_snapshot: Mutex<Option<u64>>,
}

impl<T: Send + 'static> RefCountSink<T> {
  fn run(self: &Arc<Self>, source: &ConnectableObservable<T>) -> AnyDisposable {
    let subscription = source.subscribe_observer(AnyObserver::from_arc(self.clone()));

    let guard = self.state.lock();
    let (snapshot, should_connect) = {
      let mut state = guard.borrow_mut();
      let snapshot = state.connection_id;
      *self.id_snapshot.lock() = Some(snapshot);
      if self.sink.is_disposed() {
        (snapshot, None)
      } else {
        state.count += 1;
        (snapshot, Some(state.count == 1))
      }
    };
    let Some(should_connect) = should_connect else {
      drop(guard);
      subscription.dispose();
      return AnyDisposable::empty();
    };

    if should_connect {
      tracing::debug!(connection_id = snapshot, "ref_count connecting");
      // A terminal event raised synchronously by `connect` re-enters the
      // lock and bumps the id.
      let connection = source.connect();
      let stale = {
        let mut state = guard.borrow_mut();
        if state.connection_id == snapshot {
          state.connection.replace(connection)
        } else {
          Some(connection)
        }
      };
      drop(guard);
      if let Some(stale) = stale {
        stale.dispose();
      }
    } else {
      drop(guard);
    }

    let sink = self.clone();
    AnyDisposable::create(move || {
      subscription.dispose();
      sink.release(snapshot);
    })
  }

  /// Gives up this subscriber's share of connection `snapshot`.
  fn release(&self, snapshot: u64) {
    let released = {
      let guard = self.state.lock();
      let mut state = guard.borrow_mut();
      if state.connection_id != snapshot {
        return;
      }
      let count = state.count;
      match count {
        0 => {
          drop(state);
          drop(guard);
          fatal_error("RefCount: subscriber count is already zero");
          return;
        }
        1 => {
          state.count = 0;
          state.connection_id = state.connection_id.wrapping_add(1);
          state.connection.take()
        }
        _ => {
          state.count -= 1;
          None
        }
      }
    };
    if let Some(connection) = released {
      tracing::debug!(connection_id = snapshot, "ref_count disconnecting");
      connection.dispose();
    }
  }
}

impl<T: Send + 'static> Observer<T> for RefCountSink<T> {
  fn on(&self, event: Event<T>) {
    if !event.is_stop_event() {
      self.sink.forward_on(event);
      return;
    }
    let released = {
      let guard = self.state.lock();
      let mut state = guard.borrow_mut();
      if Some(state.connection_id) == *self.id_snapshot.lock() {
        state.count = 0;
        state.connection_id = state.connection_id.wrapping_add(1);
        state.connection.take()
      } else {
        None
      }
    };
    if let Some(connection) = released {
      connection.dispose();
    }
    self.sink.forward_stop(event);
  }
}

impl<T> Disposable for RefCountSink<T> {
  fn dispose(&self) { self.sink.dispose() }
}
