use std::{marker::PhantomData, sync::Arc};

use crate::{
  disposable::{AnyDisposable, CancelToken, Disposable},
  error::RxError,
  event::Event,
  observable::{Observable, ObservableType, Producer, Sink},
  observer::{AnyObserver, Observer},
  scheduler::{CurrentThreadScheduler, Scheduler, SchedulerExt},
};

// ==================== Trivial sources ====================

struct Just<T>(T);

impl<T: Clone + Send + Sync> ObservableType<T> for Just<T> {
  fn subscribe_observer(&self, observer: AnyObserver<T>) -> AnyDisposable {
    observer.on_next(self.0.clone());
    observer.on_completed();
    AnyDisposable::empty()
  }
}

enum Trivial<T> {
  Empty,
  Never,
  Fail(RxError, PhantomData<fn() -> T>),
}

impl<T> ObservableType<T> for Trivial<T> {
  fn subscribe_observer(&self, observer: AnyObserver<T>) -> AnyDisposable {
    match self {
      Trivial::Empty => observer.on_completed(),
      Trivial::Never => {}
      Trivial::Fail(err, _) => observer.on_error(err.clone()),
    }
    AnyDisposable::empty()
  }
}

impl<T: 'static> Observable<T> {
  /// Emits `value` and completes.
  pub fn just(value: T) -> Self
  where
    T: Clone + Send + Sync,
  {
    Self::new(Just(value))
  }

  /// Completes without emitting anything.
  pub fn empty() -> Self { Self::new(Trivial::Empty) }

  /// Never emits and never terminates.
  pub fn never() -> Self { Self::new(Trivial::Never) }

  /// Terminates immediately with `err`.
  pub fn fail(err: RxError) -> Self { Self::new(Trivial::Fail(err, PhantomData)) }
}

// ==================== Sequence ====================

struct Sequence<I> {
  items: I,
  scheduler: Arc<dyn Scheduler>,
}

impl<T: Send + 'static> Observable<T> {
  /// Emits each of `values` on the [`CurrentThreadScheduler`], then
  /// completes.
  pub fn of(values: impl IntoIterator<Item = T>) -> Self
  where
    T: Clone + Sync,
  {
    let values: Vec<T> = values.into_iter().collect();
    Self::from_iter(values, CurrentThreadScheduler)
  }

  /// Emits every item of `items` on `scheduler`, one scheduled step per
  /// item, then completes.
  ///
  /// `items` is cloned for every subscription, so each subscriber sees the
  /// whole sequence.
  pub fn from_iter<I>(items: I, scheduler: impl Scheduler + 'static) -> Self
  where
    I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
    I::IntoIter: Send + 'static,
  {
    Self::from_producer(Sequence { items, scheduler: Arc::new(scheduler) })
  }
}

impl<T, I> Producer<T> for Sequence<I>
where
  T: Send + 'static,
  I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
  I::IntoIter: Send + 'static,
{
  fn run(&self, observer: AnyObserver<T>, cancel: CancelToken) -> (AnyDisposable, AnyDisposable) {
    let sink = Arc::new(SequenceSink(Sink::new(observer, cancel)));
    let c_sink = sink.clone();
    let subscription =
      self.scheduler.schedule_recursive(self.items.clone().into_iter(), move |mut items, recurse| {
        match items.next() {
          Some(item) => {
            c_sink.0.forward_on(Event::Next(item));
            recurse.schedule(items);
          }
          None => c_sink.0.forward_stop(Event::Completed),
        }
      });
    (AnyDisposable::from_arc(sink), subscription)
  }
}

struct SequenceSink<T>(Sink<T>);

impl<T> Disposable for SequenceSink<T> {
  fn dispose(&self) { self.0.dispose() }
}
