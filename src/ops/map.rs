use std::sync::Arc;

use crate::{
  disposable::{AnyDisposable, CancelToken, Disposable},
  error::RxError,
  event::Event,
  observable::{Observable, Producer, Sink},
  observer::{AnyObserver, Observer},
};

type Transform<T, R> = dyn Fn(T) -> Result<R, RxError> + Send + Sync;

struct Map<T, R> {
  source: Observable<T>,
  transform: Arc<Transform<T, R>>,
}

impl<T: Send + 'static> Observable<T> {
  /// Creates a new stream which calls a closure on each element and uses
  /// its return as the value.
  pub fn map<R: Send + 'static>(self, f: impl Fn(T) -> R + Send + Sync + 'static) -> Observable<R> {
    self.try_map(move |value| Ok(f(value)))
  }

  /// Like [`map`](Observable::map), but the closure may fail. A failure
  /// terminates the sequence with that error and unsubscribes from the
  /// source.
  ///
  /// ```rust
  /// use std::sync::{Arc, Mutex};
  ///
  /// use rxkit::prelude::*;
  ///
  /// let seen = Arc::new(Mutex::new(vec![]));
  /// let failed = Arc::new(Mutex::new(None));
  /// let (c_seen, c_failed) = (seen.clone(), failed.clone());
  ///
  /// Observable::of(vec![1u8, 100, 200])
  ///   .try_map(|v| v.checked_mul(2).ok_or(RxError::Overflow))
  ///   .subscribe_with(
  ///     move |v| c_seen.lock().unwrap().push(v),
  ///     move |err| *c_failed.lock().unwrap() = Some(err.to_string()),
  ///     || {},
  ///   );
  ///
  /// assert_eq!(*seen.lock().unwrap(), vec![2, 200]);
  /// assert_eq!(failed.lock().unwrap().as_deref(), Some("arithmetic overflow"));
  /// ```
  pub fn try_map<R: Send + 'static>(
    self,
    f: impl Fn(T) -> Result<R, RxError> + Send + Sync + 'static,
  ) -> Observable<R> {
    Observable::from_producer(Map { source: self, transform: Arc::new(f) })
  }
}

impl<T: Send + 'static, R: Send + 'static> Producer<R> for Map<T, R> {
  fn run(&self, observer: AnyObserver<R>, cancel: CancelToken) -> (AnyDisposable, AnyDisposable) {
    let sink = Arc::new(MapSink { sink: Sink::new(observer, cancel), transform: self.transform.clone() });
    let subscription = self.source.subscribe_observer(AnyObserver::from_arc(sink.clone()));
    (AnyDisposable::from_arc(sink), subscription)
  }
}

struct MapSink<T, R> {
  sink: Sink<R>,
  transform: Arc<Transform<T, R>>,
}

impl<T, R> Observer<T> for MapSink<T, R> {
  fn on(&self, event: Event<T>) {
    match event.into_stop() {
      Ok(stop) => self.sink.forward_stop(stop),
      Err(value) => match (self.transform)(value) {
        Ok(mapped) => self.sink.forward_on(Event::Next(mapped)),
        Err(err) => self.sink.forward_stop(Event::Error(err)),
      },
    }
  }
}

impl<T, R> Disposable for MapSink<T, R> {
  fn dispose(&self) { self.sink.dispose() }
}
