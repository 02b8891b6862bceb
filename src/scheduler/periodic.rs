use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;

use super::{RecursiveScheduler, TimedScheduler};
use crate::disposable::AnyDisposable;

/// Periodic scheduling expressed as relative recursion.
///
/// Each tick first reschedules the next tick one `period` later and then runs
/// the action, so the action's own running time does not stretch the period.
/// The evolving state lives next to the action; the action runs under that
/// lock, so ticks of a concurrent scheduler never overlap.
pub(crate) fn schedule_periodic<S, F>(
  scheduler: Arc<dyn TimedScheduler>,
  state: S,
  start_after: Duration,
  period: Duration,
  action: F,
) -> AnyDisposable
where
  S: Send + 'static,
  F: FnMut(S) -> S + Send + 'static,
{
  let ticker = Mutex::new((Some(state), action));
  let recursive = RecursiveScheduler::timed(scheduler, move |_: (), recurse| {
    recurse.schedule_after((), period);

    let mut ticker = ticker.lock();
    let (state, action) = &mut *ticker;
    if let Some(current) = state.take() {
      *state = Some(action(current));
    }
  });
  recursive.schedule_after((), start_after);
  AnyDisposable::new(recursive)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    disposable::Disposable,
    scheduler::{TestScheduler, TimedSchedulerExt},
  };

  #[test]
  fn threads_state_through_ticks() {
    let scheduler = TestScheduler::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let handle = scheduler.schedule_periodic(
      0,
      Duration::from_millis(50),
      Duration::from_millis(20),
      move |count| {
        c_seen.lock().push(count);
        count + 1
      },
    );

    scheduler.advance_by(Duration::from_millis(49));
    assert!(seen.lock().is_empty());

    scheduler.advance_by(Duration::from_millis(41));
    assert_eq!(*seen.lock(), vec![0, 1, 2]);

    handle.dispose();
    scheduler.advance_by(Duration::from_secs(1));
    assert_eq!(*seen.lock(), vec![0, 1, 2]);
  }
}
