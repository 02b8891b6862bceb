use std::{
  io,
  time::{Duration, Instant},
};

use futures::{executor::ThreadPool, future};
use futures_timer::Delay;
use once_cell::sync::OnceCell;

use super::{Action, Scheduler, TimedScheduler};
use crate::{
  config::QueueConfig,
  disposable::{AnyDisposable, Cancelable, SingleAssignmentDisposable},
};

/// Runs work on one dedicated background thread, one unit at a time.
///
/// Units scheduled without delay run in the order they were scheduled. A
/// delayed unit waits on a timer without blocking the worker, so other
/// units keep running in the meantime.
#[derive(Clone)]
pub struct SerialQueueScheduler {
  pool: ThreadPool,
}

static SHARED: OnceCell<SerialQueueScheduler> = OnceCell::new();

impl SerialQueueScheduler {
  /// Starts a worker thread configured by `config`.
  pub fn with_config(config: QueueConfig) -> io::Result<Self> {
    let mut builder = ThreadPool::builder();
    builder.pool_size(1).name_prefix(config.thread_name_prefix());
    if let Some(stack_size) = config.stack_size {
      builder.stack_size(stack_size);
    }
    let pool = builder.create()?;
    tracing::debug!(name = %config.name, "serial queue started");
    Ok(Self { pool })
  }

  /// A process-wide queue with the default configuration, started on first
  /// use.
  pub fn shared() -> io::Result<Self> {
    SHARED.get_or_try_init(|| Self::with_config(QueueConfig::default())).cloned()
  }

  fn spawn(&self, due: Duration, action: Action) -> AnyDisposable {
    let cancel = SingleAssignmentDisposable::new();
    let c_cancel = cancel.clone();
    let (task, abort) = future::abortable(async move {
      if !due.is_zero() {
        Delay::new(due).await;
      }
      if !c_cancel.is_disposed() {
        c_cancel.set_disposable(action());
      }
    });
    self.pool.spawn_ok(async move {
      let _ = task.await;
    });
    AnyDisposable::binary(AnyDisposable::new(cancel), AnyDisposable::create(move || abort.abort()))
  }
}

impl Scheduler for SerialQueueScheduler {
  fn schedule_action(&self, action: Action) -> AnyDisposable { self.spawn(Duration::ZERO, action) }
}

impl TimedScheduler for SerialQueueScheduler {
  #[inline]
  fn now(&self) -> Instant { Instant::now() }

  fn schedule_relative_action(&self, due: Duration, action: Action) -> AnyDisposable {
    self.spawn(due, action)
  }
}
