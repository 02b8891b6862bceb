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

/// Runs work on a pool of background threads.
///
/// Units may run in parallel and in any order, so operators that need
/// serialized delivery should observe on a [`SerialQueueScheduler`] instead.
///
/// [`SerialQueueScheduler`]: super::SerialQueueScheduler
#[derive(Clone)]
pub struct ConcurrentQueueScheduler {
  pool: ThreadPool,
}

static SHARED: OnceCell<ConcurrentQueueScheduler> = OnceCell::new();

impl ConcurrentQueueScheduler {
  /// Starts `config.workers()` threads.
  pub fn with_config(config: QueueConfig) -> io::Result<Self> {
    let workers = config.workers();
    let mut builder = ThreadPool::builder();
    builder.pool_size(workers).name_prefix(config.thread_name_prefix());
    if let Some(stack_size) = config.stack_size {
      builder.stack_size(stack_size);
    }
    let pool = builder.create()?;
    tracing::debug!(name = %config.name, workers, "concurrent queue started");
    Ok(Self { pool })
  }

  /// A process-wide pool with one worker per CPU, started on first use.
  pub fn shared() -> io::Result<Self> {
    SHARED.get_or_try_init(|| Self::with_config(QueueConfig::new("rxkit-concurrent"))).cloned()
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

impl Scheduler for ConcurrentQueueScheduler {
  fn schedule_action(&self, action: Action) -> AnyDisposable { self.spawn(Duration::ZERO, action) }
}

impl TimedScheduler for ConcurrentQueueScheduler {
  #[inline]
  fn now(&self) -> Instant { Instant::now() }

  fn schedule_relative_action(&self, due: Duration, action: Action) -> AnyDisposable {
    self.spawn(due, action)
  }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{mpsc, Arc},
    thread,
  };

  use parking_lot::{Condvar, Mutex};

  use super::*;
  use crate::{
    disposable::Disposable,
    scheduler::{SchedulerExt, TimedSchedulerExt},
  };

  fn pool(workers: usize) -> ConcurrentQueueScheduler {
    ConcurrentQueueScheduler::with_config(QueueConfig::new("rxkit-pool-test").with_pool_size(workers))
      .unwrap()
  }

  #[test]
  fn units_run_in_parallel() {
    let scheduler = pool(2);
    let running = Arc::new((Mutex::new(0usize), Condvar::new()));
    let (tx, rx) = mpsc::channel();

    for _ in 0..2 {
      let (running, tx) = (running.clone(), tx.clone());
      scheduler.schedule((), move |_| {
        let (count, both) = &*running;
        let mut count = count.lock();
        *count += 1;
        both.notify_all();
        // Only reachable with both units in flight at once.
        let timed_out = both
          .wait_while_for(&mut count, |count| *count < 2, Duration::from_secs(5))
          .timed_out();
        tx.send((!timed_out, thread::current().id())).unwrap();
        AnyDisposable::empty()
      });
    }

    let first = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    let second = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(first.0 && second.0);
    assert_ne!(first.1, second.1);
  }

  #[test]
  fn disposing_a_queued_unit_prevents_it_from_running() {
    let scheduler = pool(1);
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (tx, rx) = mpsc::channel();

    // Occupies the only worker until released.
    scheduler.schedule((), move |_| {
      release_rx.recv_timeout(Duration::from_secs(5)).ok();
      AnyDisposable::empty()
    });

    let c_tx = tx.clone();
    let queued = scheduler.schedule((), move |_| {
      c_tx.send("queued").unwrap();
      AnyDisposable::empty()
    });
    queued.dispose();

    scheduler.schedule((), move |_| {
      tx.send("after").unwrap();
      AnyDisposable::empty()
    });
    release_tx.send(()).unwrap();

    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "after");
    assert!(rx.try_recv().is_err());
  }

  #[test]
  fn delayed_unit_can_be_cancelled() {
    let scheduler = pool(2);
    let (tx, rx) = mpsc::channel();
    let start = Instant::now();

    let c_tx = tx.clone();
    scheduler
      .schedule_relative((), Duration::from_millis(20), move |_| {
        c_tx.send("cancelled").unwrap();
        AnyDisposable::empty()
      })
      .dispose();
    scheduler.schedule_relative((), Duration::from_millis(40), move |_| {
      tx.send("delayed").unwrap();
      AnyDisposable::empty()
    });

    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "delayed");
    assert!(start.elapsed() >= Duration::from_millis(40));
    assert!(rx.try_recv().is_err());
  }

  #[test]
  fn periodic_work_stops_on_dispose() {
    let scheduler = pool(2);
    let (tx, rx) = mpsc::channel();
    let ticks = scheduler.schedule_periodic(0, Duration::ZERO, Duration::from_millis(5), move |n| {
      let _ = tx.send(n);
      n + 1
    });

    let seen: Vec<_> = (0..3).map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap()).collect();
    assert_eq!(seen, vec![0, 1, 2]);
    ticks.dispose();
    thread::sleep(Duration::from_millis(30));
    while rx.try_recv().is_ok() {}
    thread::sleep(Duration::from_millis(30));
    assert!(rx.try_recv().is_err());
  }

  #[test]
  fn shared_pool_threads_are_named() {
    let (tx, rx) = mpsc::channel();
    ConcurrentQueueScheduler::shared().unwrap().schedule((), move |_| {
      tx.send(thread::current().name().map(str::to_owned)).unwrap();
      AnyDisposable::empty()
    });
    let name = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
    assert!(name.starts_with("rxkit-concurrent-"), "{name}");
  }
}
