use std::sync::Arc;

use crate::{
  atomic::{AtomicFlags, STOPPED},
  disposable::{AnyDisposable, CancelToken, Disposable},
  event::Event,
  observable::{Observable, Producer, Sink},
  observer::{AnyObserver, Observer},
};

type Subscribe<T> = dyn Fn(AnyObserver<T>) -> AnyDisposable + Send + Sync;

struct Create<T>(Arc<Subscribe<T>>);

impl<T: Send + 'static> Observable<T> {
  /// Creates an observable from a subscribe function.
  ///
  /// The function receives an observer and returns the disposable that
  /// releases whatever it set up. The observer it receives enforces the
  /// sequence grammar: values after a stop event, and any second stop
  /// event, are dropped.
  ///
  /// ```rust
  /// use std::sync::{Arc, Mutex};
  ///
  /// use rxkit::prelude::*;
  ///
  /// let seen = Arc::new(Mutex::new(vec![]));
  /// let c_seen = seen.clone();
  /// Observable::create(|observer: AnyObserver<i32>| {
  ///   observer.on_next(1);
  ///   observer.on_completed();
  ///   observer.on_next(2);
  ///   AnyDisposable::empty()
  /// })
  /// .subscribe_next(move |v| c_seen.lock().unwrap().push(v));
  ///
  /// assert_eq!(*seen.lock().unwrap(), vec![1]);
  /// ```
  pub fn create(subscribe: impl Fn(AnyObserver<T>) -> AnyDisposable + Send + Sync + 'static) -> Self {
    Self::from_producer(Create(Arc::new(subscribe)))
  }
}

impl<T: Send + 'static> Producer<T> for Create<T> {
  fn run(&self, observer: AnyObserver<T>, cancel: CancelToken) -> (AnyDisposable, AnyDisposable) {
    let sink = Arc::new(AnonymousSink { sink: Sink::new(observer, cancel), stopped: AtomicFlags::new() });
    let subscription = (self.0)(AnyObserver::from_arc(sink.clone()));
    (AnyDisposable::from_arc(sink), subscription)
  }
}

struct AnonymousSink<T> {
  sink: Sink<T>,
  stopped: AtomicFlags,
}

impl<T: Send> Observer<T> for AnonymousSink<T> {
  fn on(&self, event: Event<T>) {
    match event {
      Event::Next(_) => {
        if !self.stopped.is_set(STOPPED) {
          self.sink.forward_on(event);
        }
      }
      Event::Error(_) | Event::Completed => {
        if self.stopped.set_once(STOPPED) {
          self.sink.forward_stop(event);
        }
      }
    }
  }
}

impl<T: Send> Disposable for AnonymousSink<T> {
  fn dispose(&self) { self.sink.dispose() }
}
