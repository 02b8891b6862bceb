//! Schedulers decide *where* and *when* operator work runs.
//!
//! Two traits describe the capabilities:
//!
//! - [`Scheduler`]: run a unit of work "now", inline or queued.
//! - [`TimedScheduler`]: additionally knows the time and can run work after a
//!   relative delay.
//!
//! Both are object safe; the state-passing, recursive and periodic forms live
//! in the [`SchedulerExt`] and [`TimedSchedulerExt`] extension traits.
//!
//! Every scheduling call returns an [`AnyDisposable`]. Disposing it prevents
//! the action from running if it has not started yet; an action already
//! running is never interrupted.
//!
//! | Scheduler | Runs work |
//! |-----------|-----------|
//! | [`ImmediateScheduler`] | inline, on the calling thread |
//! | [`CurrentThreadScheduler`] | on the calling thread, flattened into a FIFO trampoline |
//! | [`SerialQueueScheduler`] | on a dedicated background worker, one unit at a time |
//! | [`ConcurrentQueueScheduler`] | on a pool of background workers, possibly in parallel |
//! | [`MainScheduler`] | on the thread that owns the paired [`MainLoop`] |
//! | [`TestScheduler`] | in virtual time, when a test advances the clock |
use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use crate::disposable::AnyDisposable;

#[cfg(all(feature = "futures-scheduler", feature = "timer"))]
mod concurrent_queue;
mod current_thread;
mod immediate;
mod main;
mod periodic;
mod recursive;
#[cfg(all(feature = "futures-scheduler", feature = "timer"))]
mod serial_queue;
mod test_scheduler;
#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;

#[cfg(all(feature = "futures-scheduler", feature = "timer"))]
pub use concurrent_queue::ConcurrentQueueScheduler;
pub use current_thread::{CurrentThreadScheduler, Trampoline};
pub use immediate::ImmediateScheduler;
pub use main::{MainLoop, MainScheduler};
pub use recursive::RecursiveScheduler;
#[cfg(all(feature = "futures-scheduler", feature = "timer"))]
pub use serial_queue::SerialQueueScheduler;
pub use test_scheduler::TestScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// A unit of work. The returned disposable is owned by the schedule handle
/// and released when that handle is disposed.
pub type Action = Box<dyn FnOnce() -> AnyDisposable + Send>;

// ==================== Traits ====================

/// Runs units of work.
pub trait Scheduler: Send + Sync {
  /// Schedules `action` to run as soon as the scheduler allows.
  fn schedule_action(&self, action: Action) -> AnyDisposable;
}

/// A [`Scheduler`] with a notion of time.
pub trait TimedScheduler: Scheduler {
  /// Current time according to this scheduler.
  fn now(&self) -> Instant;

  /// Schedules `action` to run once `due` has elapsed.
  fn schedule_relative_action(&self, due: Duration, action: Action) -> AnyDisposable;
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
  #[inline]
  fn schedule_action(&self, action: Action) -> AnyDisposable { (**self).schedule_action(action) }
}

impl<S: TimedScheduler + ?Sized> TimedScheduler for Arc<S> {
  #[inline]
  fn now(&self) -> Instant { (**self).now() }

  #[inline]
  fn schedule_relative_action(&self, due: Duration, action: Action) -> AnyDisposable {
    (**self).schedule_relative_action(due, action)
  }
}

// ==================== Extension Traits ====================

/// State-passing and recursive scheduling for every cloneable scheduler.
pub trait SchedulerExt: Scheduler + Clone + 'static {
  /// Schedules `action` with `state`.
  fn schedule<S, F>(&self, state: S, action: F) -> AnyDisposable
  where
    S: Send + 'static,
    F: FnOnce(S) -> AnyDisposable + Send + 'static,
  {
    self.schedule_action(Box::new(move || action(state)))
  }

  /// Schedules `action`, which may schedule itself again through the
  /// [`RecursiveScheduler`] it receives.
  ///
  /// On a [`CurrentThreadScheduler`] every recursive step is queued instead
  /// of nested, so the stack stays flat however long the recursion runs.
  /// Disposing the returned handle stops the recursion; a step that was
  /// already queued will not run.
  fn schedule_recursive<S, F>(&self, state: S, action: F) -> AnyDisposable
  where
    S: Send + 'static,
    F: Fn(S, &RecursiveScheduler<S>) + Send + Sync + 'static,
  {
    let recursive = RecursiveScheduler::immediate(Arc::new(self.clone()), action);
    recursive.schedule(state);
    AnyDisposable::new(recursive)
  }
}

impl<T: Scheduler + Clone + 'static> SchedulerExt for T {}

/// Relative, periodic and delayed-recursive scheduling for every cloneable
/// timed scheduler.
pub trait TimedSchedulerExt: TimedScheduler + Clone + 'static {
  /// Schedules `action` with `state` once `due` has elapsed.
  fn schedule_relative<S, F>(&self, state: S, due: Duration, action: F) -> AnyDisposable
  where
    S: Send + 'static,
    F: FnOnce(S) -> AnyDisposable + Send + 'static,
  {
    self.schedule_relative_action(due, Box::new(move || action(state)))
  }

  /// Runs `action` after `start_after` and then every `period`, threading the
  /// state returned by one run into the next.
  ///
  /// Built on relative recursion rather than a native periodic timer, so it
  /// behaves the same on every scheduler.
  fn schedule_periodic<S, F>(
    &self,
    state: S,
    start_after: Duration,
    period: Duration,
    action: F,
  ) -> AnyDisposable
  where
    S: Send + 'static,
    F: FnMut(S) -> S + Send + 'static,
  {
    periodic::schedule_periodic(Arc::new(self.clone()), state, start_after, period, action)
  }

  /// Like [`SchedulerExt::schedule_recursive`], but the first step runs after
  /// `due` and later steps may use [`RecursiveScheduler::schedule_after`].
  fn schedule_recursive_after<S, F>(&self, state: S, due: Duration, action: F) -> AnyDisposable
  where
    S: Send + 'static,
    F: Fn(S, &RecursiveScheduler<S>) + Send + Sync + 'static,
  {
    let recursive = RecursiveScheduler::timed(Arc::new(self.clone()), action);
    recursive.schedule_after(state, due);
    AnyDisposable::new(recursive)
  }
}

impl<T: TimedScheduler + Clone + 'static> TimedSchedulerExt for T {}
