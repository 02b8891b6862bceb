use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;

use super::{Action, Scheduler, TimedScheduler};
use crate::{
  disposable::{AnyDisposable, Cancelable, CompositeDisposable, Disposable, DisposeKey},
  error::fatal_error,
};

type RecursiveAction<S> = dyn Fn(S, &RecursiveScheduler<S>) + Send + Sync;

enum Target {
  Immediate(Arc<dyn Scheduler>),
  Timed(Arc<dyn TimedScheduler>),
}

/// Where a single scheduled step is in its lifecycle.
enum ScheduleState {
  /// Scheduled, handle not yet stored in the group.
  Initial,
  /// Handle stored in the group under this key.
  Added(DisposeKey),
  /// The step already ran, or the group was disposed.
  Done,
}

struct Inner<S> {
  target: Target,
  group: CompositeDisposable,
  action: Mutex<Option<Arc<RecursiveAction<S>>>>,
}

/// Drives an action that reschedules itself.
///
/// Each pending step's handle lives in a [`CompositeDisposable`] group until
/// the step runs. Disposing the recursive scheduler drops the action and
/// disposes the group, so no pending step runs afterwards.
pub struct RecursiveScheduler<S> {
  inner: Arc<Inner<S>>,
}

impl<S> Clone for RecursiveScheduler<S> {
  fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<S: Send + 'static> RecursiveScheduler<S> {
  pub(crate) fn immediate(
    scheduler: Arc<dyn Scheduler>,
    action: impl Fn(S, &RecursiveScheduler<S>) + Send + Sync + 'static,
  ) -> Self {
    Self::with_target(Target::Immediate(scheduler), Arc::new(action))
  }

  pub(crate) fn timed(
    scheduler: Arc<dyn TimedScheduler>,
    action: impl Fn(S, &RecursiveScheduler<S>) + Send + Sync + 'static,
  ) -> Self {
    Self::with_target(Target::Timed(scheduler), Arc::new(action))
  }

  fn with_target(target: Target, action: Arc<RecursiveAction<S>>) -> Self {
    Self {
      inner: Arc::new(Inner {
        target,
        group: CompositeDisposable::new(),
        action: Mutex::new(Some(action)),
      }),
    }
  }

  /// Schedules the next step as soon as the scheduler allows.
  pub fn schedule(&self, state: S) { self.schedule_step(state, None) }

  /// Schedules the next step after `due`.
  ///
  /// Only valid when the recursion was started on a timed scheduler.
  pub fn schedule_after(&self, state: S, due: Duration) { self.schedule_step(state, Some(due)) }

  fn schedule_step(&self, state: S, due: Option<Duration>) {
    let schedule_state = Arc::new(Mutex::new(ScheduleState::Initial));

    let step: Action = {
      let this = self.clone();
      let schedule_state = schedule_state.clone();
      Box::new(move || {
        if this.inner.group.is_disposed() {
          return AnyDisposable::empty();
        }

        let added = std::mem::replace(&mut *schedule_state.lock(), ScheduleState::Done);
        if let ScheduleState::Added(key) = added {
          this.inner.group.remove(key);
        }

        let action = this.inner.action.lock().clone();
        if let Some(action) = action {
          action(state, &this);
        }
        AnyDisposable::empty()
      })
    };

    let handle = match (&self.inner.target, due) {
      (Target::Timed(scheduler), Some(due)) => scheduler.schedule_relative_action(due, step),
      (Target::Timed(scheduler), None) => scheduler.schedule_action(step),
      (Target::Immediate(scheduler), None) => scheduler.schedule_action(step),
      (Target::Immediate(scheduler), Some(_)) => {
        fatal_error("RecursiveScheduler: delayed recursion needs a timed scheduler");
        scheduler.schedule_action(step)
      }
    };

    let mut schedule_state = schedule_state.lock();
    match *schedule_state {
      ScheduleState::Initial => {
        *schedule_state = match self.inner.group.insert(handle) {
          Some(key) => ScheduleState::Added(key),
          None => ScheduleState::Done,
        };
      }
      ScheduleState::Done => {}
      ScheduleState::Added(_) => {
        drop(schedule_state);
        fatal_error("RecursiveScheduler: step handle stored twice");
      }
    }
  }

  /// Number of steps scheduled but not yet run.
  pub fn pending_count(&self) -> usize { self.inner.group.count() }
}

impl<S> Disposable for RecursiveScheduler<S> {
  fn dispose(&self) {
    self.inner.action.lock().take();
    self.inner.group.dispose();
  }
}

impl<S> Cancelable for RecursiveScheduler<S> {
  fn is_disposed(&self) -> bool { self.inner.group.is_disposed() }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;
  use crate::scheduler::{
    CurrentThreadScheduler, SchedulerExt, TestScheduler, TimedSchedulerExt,
  };

  #[test]
  fn dispose_stops_pending_steps() {
    let scheduler = TestScheduler::new();
    let runs = Arc::new(AtomicUsize::new(0));
    let c_runs = runs.clone();
    let handle = scheduler.schedule_recursive_after((), Duration::from_millis(10), move |_, recurse| {
      c_runs.fetch_add(1, Ordering::SeqCst);
      recurse.schedule_after((), Duration::from_millis(10));
    });

    scheduler.advance_by(Duration::from_millis(35));
    assert_eq!(runs.load(Ordering::SeqCst), 3);

    handle.dispose();
    scheduler.advance_by(Duration::from_millis(100));
    assert_eq!(runs.load(Ordering::SeqCst), 3);
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[test]
  fn completed_steps_leave_the_group() {
    let recursive = RecursiveScheduler::immediate(Arc::new(CurrentThreadScheduler), |v: u32, r| {
      if v < 50 {
        r.schedule(v + 1);
      }
    });
    recursive.schedule(0);
    assert_eq!(recursive.pending_count(), 0);
    assert!(!recursive.is_disposed());
  }

  #[test]
  fn disposing_from_inside_the_action_ends_recursion() {
    let runs = Arc::new(AtomicUsize::new(0));
    let c_runs = runs.clone();
    CurrentThreadScheduler.schedule_recursive(0u32, move |v, recurse| {
      c_runs.fetch_add(1, Ordering::SeqCst);
      recurse.schedule(v + 1);
      if v == 4 {
        recurse.dispose();
      }
    });
    assert_eq!(runs.load(Ordering::SeqCst), 5);
  }
}
