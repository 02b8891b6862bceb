use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
  thread::{self, ThreadId},
};

use futures::{
  channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
  FutureExt, StreamExt,
};

use super::{Action, Scheduler};
use crate::{
  disposable::{AnyDisposable, Cancelable, SingleAssignmentDisposable},
  error::fatal_error,
};

/// Runs work on one designated thread, typically the UI or event-loop thread.
///
/// A scheduler is created together with its [`MainLoop`] on the owning
/// thread. Work scheduled from that thread while nothing else is queued runs
/// inline; everything else is queued and runs the next time the owning
/// thread calls [`MainLoop::run_pending`].
///
/// ```rust
/// use std::thread;
///
/// use rxkit::prelude::*;
///
/// let (scheduler, mut main_loop) = MainScheduler::new();
/// let worker = scheduler.clone();
/// thread::spawn(move || {
///   let check = worker.clone();
///   worker.schedule((), move |_| {
///     assert!(check.is_main_thread());
///     AnyDisposable::empty()
///   });
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(main_loop.run_pending(), 1);
/// ```
#[derive(Clone)]
pub struct MainScheduler {
  owner: ThreadId,
  number_enqueued: Arc<AtomicUsize>,
  sender: UnboundedSender<Action>,
}

/// The owning thread's side of a [`MainScheduler`].
pub struct MainLoop {
  receiver: UnboundedReceiver<Action>,
}

struct EnqueuedGuard<'a>(&'a AtomicUsize);

impl Drop for EnqueuedGuard<'_> {
  fn drop(&mut self) { self.0.fetch_sub(1, Ordering::AcqRel); }
}

impl MainScheduler {
  /// Creates a scheduler bound to the calling thread.
  pub fn new() -> (Self, MainLoop) {
    let (sender, receiver) = mpsc::unbounded();
    let scheduler =
      Self { owner: thread::current().id(), number_enqueued: Arc::default(), sender };
    (scheduler, MainLoop { receiver })
  }

  /// Is the calling thread the one this scheduler runs work on.
  #[inline]
  pub fn is_main_thread(&self) -> bool { thread::current().id() == self.owner }

  /// Reports a fatal error when called off the owning thread.
  #[track_caller]
  pub fn ensure_executing_on_scheduler(&self) {
    if !self.is_main_thread() {
      fatal_error("executing on a background thread, expected the main thread");
    }
  }

  fn enqueue(&self, action: Action) -> AnyDisposable {
    let cancel = SingleAssignmentDisposable::new();
    let c_cancel = cancel.clone();
    let number_enqueued = self.number_enqueued.clone();
    let queued: Action = Box::new(move || {
      let _guard = EnqueuedGuard(&number_enqueued);
      if !c_cancel.is_disposed() {
        c_cancel.set_disposable(action());
      }
      AnyDisposable::empty()
    });

    if self.sender.unbounded_send(queued).is_err() {
      // The rejected action never runs, so its guard never releases the count.
      self.number_enqueued.fetch_sub(1, Ordering::AcqRel);
      tracing::warn!("main loop is gone, scheduled work dropped");
    }
    AnyDisposable::new(cancel)
  }
}

impl Scheduler for MainScheduler {
  fn schedule_action(&self, action: Action) -> AnyDisposable {
    let previous = self.number_enqueued.fetch_add(1, Ordering::AcqRel);
    if previous == 0 && self.is_main_thread() {
      let _guard = EnqueuedGuard(&self.number_enqueued);
      return action();
    }
    self.enqueue(action)
  }
}

impl MainLoop {
  /// Runs every queued action, including ones queued while running, and
  /// returns how many ran. Never blocks.
  pub fn run_pending(&mut self) -> usize {
    let mut ran = 0;
    while let Some(Some(action)) = self.receiver.next().now_or_never() {
      let _ = action();
      ran += 1;
    }
    ran
  }
}
