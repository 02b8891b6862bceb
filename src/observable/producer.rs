use std::sync::Arc;

use crate::{
  atomic::{Assign, AssignOnce},
  disposable::{AnyDisposable, CancelToken, Cancelable, Disposable},
  error::fatal_error,
  observable::ObservableType,
  observer::AnyObserver,
  scheduler::{CurrentThreadScheduler, Scheduler},
};

/// A stateful operator.
///
/// `run` wires a fresh sink between `observer` and the operator's upstream.
/// It returns the sink and the upstream subscription; both are disposed
/// together, exactly once, when `cancel` is disposed.
pub(crate) trait Producer<T>: Send + Sync {
  fn run(&self, observer: AnyObserver<T>, cancel: CancelToken) -> (AnyDisposable, AnyDisposable);
}

/// Adapts a [`Producer`] to [`ObservableType`].
pub(crate) struct ProducerObservable<P>(Arc<P>);

impl<P> ProducerObservable<P> {
  pub(crate) fn new(producer: P) -> Self { Self(Arc::new(producer)) }
}

impl<T, P> ObservableType<T> for ProducerObservable<P>
where
  T: Send + 'static,
  P: Producer<T> + 'static,
{
  fn subscribe_observer(&self, observer: AnyObserver<T>) -> AnyDisposable {
    let disposer = Arc::new(SinkDisposer::new());
    let body = {
      let producer = self.0.clone();
      let disposer = disposer.clone();
      move || {
        let (sink, subscription) = producer.run(observer, disposer.clone());
        disposer.set_sink_and_subscription(sink, subscription);
        AnyDisposable::empty()
      }
    };

    // Without an active drain, run inside one so everything `run` schedules
    // on the current thread is flattened into a queue instead of recursing.
    if CurrentThreadScheduler::is_schedule_required() {
      CurrentThreadScheduler.schedule_action(Box::new(body));
    } else {
      body();
    }
    AnyDisposable::from_arc(disposer)
  }
}

// ==================== SinkDisposer ====================

/// Owns the sink and upstream subscription of one producer subscription.
///
/// Reachable states of the underlying word: initial, assigned, disposed and
/// disposed-after-assigned. A second assignment is rejected and never
/// overwrites the published pair.
pub(crate) struct SinkDisposer {
  state: AssignOnce<(AnyDisposable, AnyDisposable)>,
}

impl SinkDisposer {
  pub(crate) fn new() -> Self { Self { state: AssignOnce::new() } }

  pub(crate) fn set_sink_and_subscription(&self, sink: AnyDisposable, subscription: AnyDisposable) {
    match self.state.assign((sink, subscription)) {
      Assign::Stored => {}
      Assign::AlreadyDisposed((sink, subscription)) => {
        sink.dispose();
        subscription.dispose();
      }
      Assign::Reassigned((sink, subscription)) => {
        fatal_error("SinkDisposer: sink and subscription are already set");
        sink.dispose();
        subscription.dispose();
      }
    }
  }

  #[cfg(test)]
  pub(crate) fn raw_state(&self) -> i32 { self.state.state() }
}

impl Disposable for SinkDisposer {
  fn dispose(&self) {
    if let Some((sink, subscription)) = self.state.dispose() {
      sink.dispose();
      subscription.dispose();
    }
  }
}

impl Cancelable for SinkDisposer {
  #[inline]
  fn is_disposed(&self) -> bool { self.state.is_disposed() }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{
      atomic::{AtomicUsize, Ordering},
      Barrier,
    },
    thread,
  };

  use super::*;
  use crate::{
    atomic::{ASSIGNED, DISPOSED},
    disposable::test_util::CountingDisposable,
  };

  fn pair() -> (CountingDisposable, CountingDisposable) {
    (CountingDisposable::default(), CountingDisposable::default())
  }

  #[test]
  fn dispose_after_assignment_releases_both() {
    let disposer = SinkDisposer::new();
    let (sink, subscription) = pair();
    disposer
      .set_sink_and_subscription(AnyDisposable::new(sink.clone()), AnyDisposable::new(subscription.clone()));
    assert_eq!(disposer.raw_state(), ASSIGNED);

    disposer.dispose();
    disposer.dispose();
    assert_eq!((sink.count(), subscription.count()), (1, 1));
    assert_eq!(disposer.raw_state(), ASSIGNED | DISPOSED);
  }

  #[test]
  fn assignment_after_dispose_releases_immediately() {
    let disposer = SinkDisposer::new();
    disposer.dispose();
    assert!(disposer.is_disposed());

    let (sink, subscription) = pair();
    disposer
      .set_sink_and_subscription(AnyDisposable::new(sink.clone()), AnyDisposable::new(subscription.clone()));
    assert_eq!((sink.count(), subscription.count()), (1, 1));
  }

  #[cfg(debug_assertions)]
  #[test]
  #[should_panic(expected = "already set")]
  fn second_assignment_is_fatal() {
    let disposer = SinkDisposer::new();
    disposer.set_sink_and_subscription(AnyDisposable::empty(), AnyDisposable::empty());
    disposer.set_sink_and_subscription(AnyDisposable::empty(), AnyDisposable::empty());
  }

  #[test]
  fn racing_assign_and_dispose_release_exactly_once() {
    for _ in 0..200 {
      let disposer = Arc::new(SinkDisposer::new());
      let released = Arc::new(AtomicUsize::new(0));
      let barrier = Arc::new(Barrier::new(3));

      let assign = {
        let (disposer, released, barrier) = (disposer.clone(), released.clone(), barrier.clone());
        thread::spawn(move || {
          let sink = AnyDisposable::create({
            let released = released.clone();
            move || {
              released.fetch_add(1, Ordering::SeqCst);
            }
          });
          let subscription = AnyDisposable::create(move || {
            released.fetch_add(1, Ordering::SeqCst);
          });
          barrier.wait();
          disposer.set_sink_and_subscription(sink, subscription);
        })
      };
      let disposers: Vec<_> = (0..2)
        .map(|_| {
          let (disposer, barrier) = (disposer.clone(), barrier.clone());
          thread::spawn(move || {
            barrier.wait();
            disposer.dispose();
          })
        })
        .collect();

      assign.join().unwrap();
      disposers.into_iter().for_each(|h| h.join().unwrap());
      assert_eq!(released.load(Ordering::SeqCst), 2);
      assert_eq!(disposer.raw_state(), ASSIGNED | DISPOSED);
    }
  }
}
