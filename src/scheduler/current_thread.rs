use std::{
  cell::{Cell, RefCell},
  collections::VecDeque,
  sync::Arc,
};

use parking_lot::Mutex;

use super::{Action, Scheduler};
use crate::disposable::{AnyDisposable, Cancelable, Disposable, SingleAssignmentDisposable};

thread_local! {
  static CURRENT: Trampoline = Trampoline::new();
}

// ==================== ScheduledItem ====================

/// An action waiting in a trampoline queue.
struct ScheduledItem {
  action: Mutex<Option<Action>>,
  disposable: SingleAssignmentDisposable,
}

impl ScheduledItem {
  fn new(action: Action) -> Self {
    Self { action: Mutex::new(Some(action)), disposable: SingleAssignmentDisposable::new() }
  }

  fn invoke(&self) {
    let action = self.action.lock().take();
    if let Some(action) = action {
      self.disposable.set_disposable(action());
    }
  }
}

impl Disposable for ScheduledItem {
  fn dispose(&self) {
    self.disposable.dispose();
    // Dropping the action releases whatever it captured.
    self.action.lock().take();
  }
}

impl Cancelable for ScheduledItem {
  fn is_disposed(&self) -> bool { self.disposable.is_disposed() }
}

// ==================== Trampoline ====================

/// A FIFO of pending actions plus the flag telling whether a drain loop is
/// running.
///
/// Every thread owns one, reachable through [`Trampoline::with_current`];
/// [`CurrentThreadScheduler`] is a thin handle over it. A standalone
/// trampoline can be created for tests.
pub struct Trampoline {
  draining: Cell<bool>,
  queue: RefCell<VecDeque<Arc<ScheduledItem>>>,
}

impl Default for Trampoline {
  fn default() -> Self { Self::new() }
}

impl Trampoline {
  pub fn new() -> Self { Self { draining: Cell::new(false), queue: RefCell::new(VecDeque::new()) } }

  /// Runs `f` with the calling thread's trampoline.
  pub fn with_current<R>(f: impl FnOnce(&Trampoline) -> R) -> R { CURRENT.with(f) }

  /// `true` when no drain loop is running, i.e. the next scheduled action
  /// will run immediately.
  #[inline]
  pub fn is_schedule_required(&self) -> bool { !self.draining.get() }

  /// Number of queued actions.
  pub fn pending_count(&self) -> usize { self.queue.borrow().len() }

  /// Runs `action` now if idle and then drains everything it queued;
  /// otherwise queues it behind the work already pending.
  pub fn schedule(&self, action: Action) -> AnyDisposable {
    if !self.is_schedule_required() {
      let item = Arc::new(ScheduledItem::new(action));
      self.queue.borrow_mut().push_back(item.clone());
      return AnyDisposable::from_arc(item);
    }

    self.draining.set(true);
    let _reset = DrainReset(self);
    let disposable = action();
    self.drain();
    disposable
  }

  fn drain(&self) {
    loop {
      // The borrow ends before the item runs, so it can queue more work.
      let next = self.queue.borrow_mut().pop_front();
      let Some(item) = next else { break };
      if !item.is_disposed() {
        item.invoke();
      }
    }
  }
}

/// Leaves the trampoline idle and empty, also when an action panics.
struct DrainReset<'a>(&'a Trampoline);

impl Drop for DrainReset<'_> {
  fn drop(&mut self) {
    self.0.draining.set(false);
    self.0.queue.borrow_mut().clear();
  }
}

// ==================== CurrentThreadScheduler ====================

/// Schedules work on the current thread, flattening recursion into a queue.
///
/// The first action scheduled on an idle thread runs immediately; anything
/// it schedules (directly or through nested subscriptions) is queued and run
/// in FIFO order once it returns. This bounds stack depth for sources that
/// reschedule themselves, like `range` or `generate`.
///
/// # Examples
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use rxkit::prelude::*;
///
/// let messages = Arc::new(Mutex::new(vec![]));
/// let outer = messages.clone();
/// CurrentThreadScheduler.schedule((), move |_| {
///   outer.lock().unwrap().push(1);
///   let inner = outer.clone();
///   CurrentThreadScheduler.schedule((), move |_| {
///     inner.lock().unwrap().push(3);
///     AnyDisposable::empty()
///   });
///   outer.lock().unwrap().push(2);
///   AnyDisposable::empty()
/// });
/// assert_eq!(*messages.lock().unwrap(), vec![1, 2, 3]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentThreadScheduler;

impl CurrentThreadScheduler {
  /// `true` when the calling thread is not draining a trampoline.
  #[inline]
  pub fn is_schedule_required() -> bool { Trampoline::with_current(Trampoline::is_schedule_required) }
}

impl Scheduler for CurrentThreadScheduler {
  fn schedule_action(&self, action: Action) -> AnyDisposable {
    Trampoline::with_current(|trampoline| trampoline.schedule(action))
  }
}
