//! Virtual-time scheduler for deterministic tests of time-based operators.
//!
//! Time only moves when the test says so:
//!
//! ```rust
//! use std::{sync::{Arc, Mutex}, time::Duration};
//!
//! use rxkit::prelude::*;
//!
//! let scheduler = TestScheduler::new();
//! let ticks = Arc::new(Mutex::new(vec![]));
//! let c_ticks = ticks.clone();
//!
//! Observable::<u64>::interval(Duration::from_millis(100), scheduler.clone())
//!   .subscribe_next(move |v| c_ticks.lock().unwrap().push(v));
//!
//! scheduler.advance_by(Duration::from_millis(250));
//! assert_eq!(*ticks.lock().unwrap(), vec![0, 1]);
//! ```
//!
//! Unlike a thread-local clock, every `TestScheduler` value is an explicit
//! handle: clones share one clock and queue, separate instances are fully
//! independent, so tests never interfere with each other.

use std::{
  cmp::Ordering,
  collections::BinaryHeap,
  sync::Arc,
  time::{Duration, Instant},
};

use parking_lot::Mutex;

use super::{Action, Scheduler, TimedScheduler};
use crate::disposable::{AnyDisposable, Cancelable, SingleAssignmentDisposable};

// ==================== Internal State ====================

struct ScheduledTask {
  due: Duration,
  task_id: usize,
  action: Action,
  cancel: SingleAssignmentDisposable,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.task_id == other.task_id }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by task_id
    other.due.cmp(&self.due).then_with(|| other.task_id.cmp(&self.task_id))
  }
}

#[derive(Default)]
struct TestSchedulerState {
  clock: Duration,
  queue: BinaryHeap<ScheduledTask>,
  next_task_id: usize,
}

// ==================== TestScheduler ====================

/// A scheduler whose clock only advances when instructed.
///
/// Actions scheduled "now" are queued at the current virtual time and run on
/// the next [`advance_by`](Self::advance_by), [`advance_to`](Self::advance_to)
/// or [`start`](Self::start).
#[derive(Clone)]
pub struct TestScheduler {
  state: Arc<Mutex<TestSchedulerState>>,
  epoch: Instant,
}

impl Default for TestScheduler {
  fn default() -> Self { Self::new() }
}

impl TestScheduler {
  pub fn new() -> Self { Self { state: Arc::default(), epoch: Instant::now() } }

  /// Virtual time elapsed since creation.
  pub fn clock(&self) -> Duration { self.state.lock().clock }

  /// Number of scheduled actions that are still going to run.
  pub fn pending_count(&self) -> usize {
    self.state.lock().queue.iter().filter(|t| !t.cancel.is_disposed()).count()
  }

  /// Moves the clock forward by `delta`, running everything due on the way.
  pub fn advance_by(&self, delta: Duration) {
    let target = self.clock() + delta;
    self.advance_to(target);
  }

  /// Moves the clock to `target`, running everything due on the way.
  ///
  /// Actions scheduled while advancing run too if they fall due before
  /// `target`. The clock never moves backwards.
  pub fn advance_to(&self, target: Duration) {
    while let Some(task) = self.pop_due(Some(target)) {
      Self::run(task);
    }
    let mut state = self.state.lock();
    state.clock = state.clock.max(target);
  }

  /// Runs every scheduled action, advancing the clock as far as needed.
  pub fn start(&self) {
    while let Some(task) = self.pop_due(None) {
      Self::run(task);
    }
  }

  fn pop_due(&self, limit: Option<Duration>) -> Option<ScheduledTask> {
    let mut state = self.state.lock();
    loop {
      let next_due = state.queue.peek()?.due;
      if limit.is_some_and(|limit| next_due > limit) {
        return None;
      }
      let task = state.queue.pop()?;
      if task.cancel.is_disposed() {
        continue;
      }
      state.clock = state.clock.max(task.due);
      return Some(task);
    }
  }

  fn run(task: ScheduledTask) {
    let ScheduledTask { action, cancel, .. } = task;
    // Run outside the lock so the action can schedule more work.
    cancel.set_disposable(action());
  }

  fn enqueue(&self, delay: Duration, action: Action) -> AnyDisposable {
    let cancel = SingleAssignmentDisposable::new();
    let mut state = self.state.lock();
    let task_id = state.next_task_id;
    state.next_task_id += 1;
    let due = state.clock + delay;
    state.queue.push(ScheduledTask { due, task_id, action, cancel: cancel.clone() });
    AnyDisposable::new(cancel)
  }
}

impl Scheduler for TestScheduler {
  fn schedule_action(&self, action: Action) -> AnyDisposable { self.enqueue(Duration::ZERO, action) }
}

impl TimedScheduler for TestScheduler {
  fn now(&self) -> Instant { self.epoch + self.clock() }

  fn schedule_relative_action(&self, due: Duration, action: Action) -> AnyDisposable {
    self.enqueue(due, action)
  }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    disposable::Disposable,
    scheduler::{SchedulerExt, TimedSchedulerExt},
  };

  fn log(scheduler: &TestScheduler, seen: &Arc<Mutex<Vec<(u64, &'static str)>>>) -> impl Fn(&'static str) {
    let (scheduler, seen) = (scheduler.clone(), seen.clone());
    move |label| seen.lock().push((scheduler.clock().as_millis() as u64, label))
  }

  #[test]
  fn runs_in_time_then_fifo_order() {
    let scheduler = TestScheduler::new();
    let seen = Arc::new(Mutex::new(vec![]));

    for (delay, label) in [(30, "c"), (10, "a"), (10, "b"), (0, "now")] {
      let record = log(&scheduler, &seen);
      scheduler.schedule_relative((), Duration::from_millis(delay), move |_| {
        record(label);
        AnyDisposable::empty()
      });
    }
    assert_eq!(scheduler.pending_count(), 4);

    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(*seen.lock(), vec![(0, "now"), (10, "a"), (10, "b")]);

    scheduler.start();
    assert_eq!(seen.lock().last(), Some(&(30, "c")));
    assert_eq!(scheduler.clock(), Duration::from_millis(30));
  }

  #[test]
  fn disposed_actions_never_run() {
    let scheduler = TestScheduler::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let record = log(&scheduler, &seen);
    let handle = scheduler.schedule((), move |_| {
      record("ran");
      AnyDisposable::empty()
    });
    handle.dispose();
    assert_eq!(scheduler.pending_count(), 0);
    scheduler.start();
    assert!(seen.lock().is_empty());
  }

  #[test]
  fn work_scheduled_while_advancing_runs_if_due() {
    let scheduler = TestScheduler::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let record = Arc::new(log(&scheduler, &seen));
    let inner_scheduler = scheduler.clone();
    scheduler.schedule_relative((), Duration::from_millis(5), move |_| {
      record("outer");
      let record = record.clone();
      inner_scheduler.schedule_relative((), Duration::from_millis(5), move |_| {
        record("inner");
        AnyDisposable::empty()
      })
    });

    scheduler.advance_to(Duration::from_millis(20));
    assert_eq!(*seen.lock(), vec![(5, "outer"), (10, "inner")]);
    assert_eq!(scheduler.clock(), Duration::from_millis(20));
  }

  #[test]
  fn clones_share_the_clock() {
    let scheduler = TestScheduler::new();
    let other = scheduler.clone();
    let before = other.now();
    scheduler.advance_by(Duration::from_secs(3));
    assert_eq!(other.clock(), Duration::from_secs(3));
    assert_eq!(other.now() - before, Duration::from_secs(3));
    assert_eq!(TestScheduler::new().clock(), Duration::ZERO);
  }
}
