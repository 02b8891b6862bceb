use std::sync::Arc;

use crate::{
  disposable::{AnyDisposable, CancelToken, Disposable},
  error::RxError,
  event::Event,
  observable::{Observable, Producer, Sink},
  observer::AnyObserver,
  scheduler::{Scheduler, SchedulerExt},
};

type Condition<S> = dyn Fn(&S) -> Result<bool, RxError> + Send + Sync;
type Iterate<S> = dyn Fn(S) -> Result<S, RxError> + Send + Sync;

struct Generate<S> {
  initial: S,
  condition: Arc<Condition<S>>,
  iterate: Arc<Iterate<S>>,
  scheduler: Arc<dyn Scheduler>,
}

impl<S: Clone + Send + Sync + 'static> Observable<S> {
  /// Runs a loop and emits each state for which `condition` holds.
  ///
  /// The first state is `initial`; each following one is `iterate` applied
  /// to the previous. The sequence completes the first time `condition`
  /// fails. An error from either closure terminates the sequence with that
  /// error.
  ///
  /// ```rust
  /// use std::sync::{Arc, Mutex};
  ///
  /// use rxkit::prelude::*;
  ///
  /// let seen = Arc::new(Mutex::new(vec![]));
  /// let c_seen = seen.clone();
  /// Observable::generate(1, |v| Ok(*v < 100), |v| Ok(v * 3), CurrentThreadScheduler)
  ///   .subscribe_next(move |v| c_seen.lock().unwrap().push(v));
  ///
  /// assert_eq!(*seen.lock().unwrap(), vec![1, 3, 9, 27, 81]);
  /// ```
  pub fn generate(
    initial: S,
    condition: impl Fn(&S) -> Result<bool, RxError> + Send + Sync + 'static,
    iterate: impl Fn(S) -> Result<S, RxError> + Send + Sync + 'static,
    scheduler: impl Scheduler + 'static,
  ) -> Self {
    Self::from_producer(Generate {
      initial,
      condition: Arc::new(condition),
      iterate: Arc::new(iterate),
      scheduler: Arc::new(scheduler),
    })
  }
}

impl<S: Clone + Send + Sync + 'static> Producer<S> for Generate<S> {
  fn run(&self, observer: AnyObserver<S>, cancel: CancelToken) -> (AnyDisposable, AnyDisposable) {
    let sink = Arc::new(GenerateSink(Sink::new(observer, cancel)));
    let c_sink = sink.clone();
    let (condition, iterate) = (self.condition.clone(), self.iterate.clone());

    let subscription =
      self.scheduler.schedule_recursive((self.initial.clone(), true), move |(state, is_first), recurse| {
        let step = if is_first { Ok(state) } else { iterate(state) };
        match step.and_then(|state| condition(&state).map(|keep| (state, keep))) {
          Ok((state, true)) => {
            c_sink.0.forward_on(Event::Next(state.clone()));
            recurse.schedule((state, false));
          }
          Ok((_, false)) => c_sink.0.forward_stop(Event::Completed),
          Err(err) => c_sink.0.forward_stop(Event::Error(err)),
        }
      });
    (AnyDisposable::from_arc(sink), subscription)
  }
}

struct GenerateSink<S>(Sink<S>);

impl<S> Disposable for GenerateSink<S> {
  fn dispose(&self) { self.0.dispose() }
}
