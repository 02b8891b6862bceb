use std::time::{Duration, Instant};

use tokio::runtime::Handle;

use super::{Action, Scheduler, TimedScheduler};
use crate::disposable::{AnyDisposable, Cancelable, SingleAssignmentDisposable};

/// Runs work as tasks on a tokio runtime.
///
/// Units are not serialized: two units scheduled back to back may run
/// concurrently on a multi-threaded runtime.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
  handle: Handle,
}

impl TokioScheduler {
  pub fn new(handle: Handle) -> Self { Self { handle } }

  /// Uses the runtime the caller is running on.
  ///
  /// # Panics
  ///
  /// When called outside a tokio runtime.
  pub fn current() -> Self { Self::new(Handle::current()) }

  fn spawn(&self, due: Duration, action: Action) -> AnyDisposable {
    let cancel = SingleAssignmentDisposable::new();
    let c_cancel = cancel.clone();
    let task = self.handle.spawn(async move {
      if !due.is_zero() {
        tokio::time::sleep(due).await;
      }
      if !c_cancel.is_disposed() {
        c_cancel.set_disposable(action());
      }
    });
    let abort = task.abort_handle();
    AnyDisposable::binary(AnyDisposable::new(cancel), AnyDisposable::create(move || abort.abort()))
  }
}

impl Scheduler for TokioScheduler {
  fn schedule_action(&self, action: Action) -> AnyDisposable { self.spawn(Duration::ZERO, action) }
}

impl TimedScheduler for TokioScheduler {
  #[inline]
  fn now(&self) -> Instant { Instant::now() }

  fn schedule_relative_action(&self, due: Duration, action: Action) -> AnyDisposable {
    self.spawn(due, action)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use super::*;
  use crate::{disposable::Disposable, scheduler::TimedSchedulerExt};

  #[tokio::test(flavor = "multi_thread")]
  async fn delayed_and_cancelled_work() {
    let scheduler = TokioScheduler::current();
    let hits = Arc::new(AtomicUsize::new(0));

    let c_hits = hits.clone();
    let cancelled = scheduler.schedule_relative((), Duration::from_millis(10), move |_| {
      c_hits.fetch_add(100, Ordering::SeqCst);
      AnyDisposable::empty()
    });
    cancelled.dispose();

    let (tx, rx) = tokio::sync::oneshot::channel();
    let c_hits = hits.clone();
    scheduler.schedule_relative(tx, Duration::from_millis(20), move |tx| {
      c_hits.fetch_add(1, Ordering::SeqCst);
      let _ = tx.send(());
      AnyDisposable::empty()
    });

    rx.await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }
}
