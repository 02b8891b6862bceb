use std::sync::Arc;

use crate::{
  disposable::{AnyDisposable, CancelToken, Disposable},
  error::RxError,
  event::Event,
  observable::{ConnectableObservable, MulticastAdapter, Observable, Producer, Sink},
  observer::{AnyObserver, Observer},
  subject::Subject,
};

type SubjectFactory<S> = dyn Fn() -> Result<S, RxError> + Send + Sync;
type Selector<T, R> = dyn Fn(Observable<T>) -> Result<Observable<R>, RxError> + Send + Sync;

impl<T: Send + 'static> Observable<T> {
  /// Shares one subscription to this source through `subject`.
  ///
  /// The same subject is reused by every connection, so once it has
  /// terminated later connections only replay its stop event.
  pub fn multicast<S: Subject<T>>(self, subject: S) -> ConnectableObservable<T> {
    ConnectableObservable::new(MulticastAdapter::new(self, move || subject.clone()))
  }

  /// Shares one subscription to this source through a subject built by
  /// `make_subject`.
  ///
  /// The subject is created lazily and dropped when its connection ends, so
  /// every connection starts with a fresh one.
  pub fn multicast_with<S: Subject<T>>(
    self,
    make_subject: impl Fn() -> S + Send + Sync + 'static,
  ) -> ConnectableObservable<T> {
    ConnectableObservable::new(MulticastAdapter::new(self, make_subject))
  }

  /// Multicasts the source within `selector`.
  ///
  /// Every subscription builds its own subject, passes the connectable
  /// source to `selector` as a plain observable, subscribes the result and
  /// then connects. An error from either closure is delivered as the
  /// sequence's error.
  ///
  /// ```rust
  /// use std::sync::{Arc, Mutex};
  ///
  /// use rxkit::prelude::*;
  ///
  /// let seen = Arc::new(Mutex::new(vec![]));
  /// let c_seen = seen.clone();
  /// Observable::of(vec![1, 2])
  ///   .multicast_selector(
  ///     || Ok(PublishSubject::new()),
  ///     |shared| Ok(shared.clone().map(|v| v * 10).start_with([0])),
  ///   )
  ///   .subscribe_next(move |v| c_seen.lock().unwrap().push(v));
  ///
  /// assert_eq!(*seen.lock().unwrap(), vec![0, 10, 20]);
  /// ```
  pub fn multicast_selector<S, R>(
    self,
    make_subject: impl Fn() -> Result<S, RxError> + Send + Sync + 'static,
    selector: impl Fn(Observable<T>) -> Result<Observable<R>, RxError> + Send + Sync + 'static,
  ) -> Observable<R>
  where
    S: Subject<T>,
    R: Send + 'static,
  {
    Observable::from_producer(MulticastSelector {
      source: self,
      make_subject: Arc::new(make_subject),
      selector: Arc::new(selector),
    })
  }
}

struct MulticastSelector<T, S, R> {
  source: Observable<T>,
  make_subject: Arc<SubjectFactory<S>>,
  selector: Arc<Selector<T, R>>,
}

impl<T, S, R> MulticastSelector<T, S, R>
where
  T: Send + 'static,
  S: Subject<T>,
  R: Send + 'static,
{
  fn subscribe_selected(&self, sink: &Arc<MulticastSink<R>>) -> Result<AnyDisposable, RxError> {
    let subject = (self.make_subject)()?;
    let connectable =
      ConnectableObservable::new(MulticastAdapter::new(self.source.clone(), move || subject.clone()));
    let selected = (self.selector)(connectable.as_observable())?;

    let subscription = selected.subscribe_observer(AnyObserver::from_arc(sink.clone()));
    let connection = connectable.connect();
    Ok(AnyDisposable::binary(subscription, connection))
  }
}

impl<T, S, R> Producer<R> for MulticastSelector<T, S, R>
where
  T: Send + 'static,
  S: Subject<T>,
  R: Send + 'static,
{
  fn run(&self, observer: AnyObserver<R>, cancel: CancelToken) -> (AnyDisposable, AnyDisposable) {
    let sink = Arc::new(MulticastSink(Sink::new(observer, cancel)));
    let subscription = match self.subscribe_selected(&sink) {
      Ok(subscription) => subscription,
      Err(err) => {
        sink.0.forward_stop(Event::Error(err));
        AnyDisposable::empty()
      }
    };
    (AnyDisposable::from_arc(sink), subscription)
  }
}

struct MulticastSink<R>(Sink<R>);

impl<R> Observer<R> for MulticastSink<R> {
  fn on(&self, event: Event<R>) {
    if event.is_stop_event() {
      self.0.forward_stop(event);
    } else {
      self.0.forward_on(event);
    }
  }
}

impl<R> Disposable for MulticastSink<R> {
  fn dispose(&self) { self.0.dispose() }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;
  use crate::{
    observable::ObservableType,
    observer::test_util::{Recorded, Recorder},
    subject::{PublishSubject, ReplaySubject},
  };

  #[test]
  fn fixed_subject_survives_reconnects() {
    let source = PublishSubject::new();
    let subject = ReplaySubject::unbounded();
    let connectable = source.as_observable().multicast(subject.clone());

    connectable.connect();
    source.on_next(1);
    connectable.connect().dispose();
    connectable.connect();
    source.on_next(2);

    let recorder = Recorder::new();
    connectable.subscribe_observer(recorder.observer());
    assert_eq!(recorder.values(), vec![1, 2]);
  }

  #[test]
  fn factory_subject_is_fresh_per_connection() {
    let source = PublishSubject::new();
    let connectable = source.as_observable().multicast_with(ReplaySubject::unbounded);

    connectable.connect();
    source.on_next(1);
    connectable.connect().dispose();
    connectable.connect();
    source.on_next(2);

    let recorder = Recorder::new();
    connectable.subscribe_observer(recorder.observer());
    assert_eq!(recorder.values(), vec![2]);
  }

  #[test]
  fn selector_sees_one_shared_subscription() {
    let subscriptions = Arc::new(AtomicUsize::new(0));
    let c_subscriptions = subscriptions.clone();
    let source = Observable::create(move |observer: AnyObserver<i32>| {
      c_subscriptions.fetch_add(1, Ordering::SeqCst);
      observer.on_next(1);
      observer.on_completed();
      AnyDisposable::empty()
    });

    let recorder = Recorder::new();
    source
      .multicast_selector(
        || Ok(PublishSubject::new()),
        |shared| Ok(Observable::new(Both(shared.clone(), shared))),
      )
      .subscribe(recorder.clone());

    assert_eq!(subscriptions.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.values(), vec![1, 1]);
  }

  #[test]
  fn factory_error_is_delivered() {
    let recorder = Recorder::<i32>::new();
    Observable::just(1)
      .multicast_selector(
        || Err::<PublishSubject<i32>, _>(RxError::msg("no subject")),
        |shared| Ok(shared),
      )
      .subscribe(recorder.clone());
    assert_eq!(recorder.events(), vec![Recorded::Error("no subject".into())]);
  }

  #[test]
  fn selector_error_is_delivered() {
    let recorder = Recorder::<i32>::new();
    Observable::just(1)
      .multicast_selector(|| Ok(PublishSubject::new()), |_| Err::<Observable<i32>, _>(RxError::Timeout))
      .subscribe(recorder.clone());
    assert_eq!(recorder.events(), vec![Recorded::Error("sequence timeout".into())]);
  }

  /// Subscribes one observer to two sources, taking the stop event from
  /// the second only.
  struct Both(Observable<i32>, Observable<i32>);

  impl ObservableType<i32> for Both {
    fn subscribe_observer(&self, observer: AnyObserver<i32>) -> AnyDisposable {
      let values_only = AnyObserver::from_fn({
        let observer = observer.clone();
        move |event: Event<i32>| {
          if let Event::Next(v) = event {
            observer.on_next(v);
          }
        }
      });
      AnyDisposable::binary(
        self.0.subscribe_observer(values_only),
        self.1.subscribe_observer(observer),
      )
    }
  }
}
