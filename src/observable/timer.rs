use std::{sync::Arc, time::Duration};

use crate::{
  disposable::{AnyDisposable, CancelToken, Disposable},
  event::Event,
  observable::{Observable, Producer, Sink},
  observer::AnyObserver,
  scheduler::{TimedScheduler, TimedSchedulerExt},
};

struct Timer {
  due: Duration,
  period: Option<Duration>,
  scheduler: Arc<dyn TimedScheduler>,
}

impl Observable<u64> {
  /// Emits `0` after `due`.
  ///
  /// Without a `period` the sequence then completes. With one it keeps
  /// emitting `1, 2, ...` every `period` until disposed.
  pub fn timer(
    due: Duration,
    period: Option<Duration>,
    scheduler: impl TimedScheduler + 'static,
  ) -> Self {
    Self::from_producer(Timer { due, period, scheduler: Arc::new(scheduler) })
  }

  /// Emits `0, 1, 2, ...`, one value every `period`.
  pub fn interval(period: Duration, scheduler: impl TimedScheduler + 'static) -> Self {
    Self::timer(period, Some(period), scheduler)
  }
}

impl Producer<u64> for Timer {
  fn run(&self, observer: AnyObserver<u64>, cancel: CancelToken) -> (AnyDisposable, AnyDisposable) {
    let sink = Arc::new(TimerSink(Sink::new(observer, cancel)));
    let c_sink = sink.clone();
    let subscription = match self.period {
      Some(period) => self.scheduler.schedule_periodic(0u64, self.due, period, move |tick| {
        c_sink.0.forward_on(Event::Next(tick));
        tick.wrapping_add(1)
      }),
      None => self.scheduler.schedule_relative((), self.due, move |_| {
        c_sink.0.forward_on(Event::Next(0));
        c_sink.0.forward_stop(Event::Completed);
        AnyDisposable::empty()
      }),
    };
    (AnyDisposable::from_arc(sink), subscription)
  }
}

struct TimerSink(Sink<u64>);

impl Disposable for TimerSink {
  fn dispose(&self) { self.0.dispose() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    observer::test_util::{Recorded, Recorder},
    scheduler::TestScheduler,
  };

  #[test]
  fn one_shot_timer() {
    let scheduler = TestScheduler::new();
    let recorder = Recorder::new();
    Observable::timer(Duration::from_secs(1), None, scheduler.clone()).subscribe(recorder.clone());

    scheduler.advance_by(Duration::from_millis(999));
    assert!(recorder.events().is_empty());
    scheduler.advance_by(Duration::from_millis(1));
    assert_eq!(recorder.events(), vec![Recorded::Next(0), Recorded::Completed]);
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[test]
  fn periodic_timer_counts_from_zero() {
    let scheduler = TestScheduler::new();
    let recorder = Recorder::new();
    let subscription =
      Observable::timer(Duration::from_millis(50), Some(Duration::from_millis(10)), scheduler.clone())
        .subscribe(recorder.clone());

    scheduler.advance_by(Duration::from_millis(75));
    assert_eq!(recorder.values(), vec![0, 1, 2]);

    subscription.dispose();
    scheduler.advance_by(Duration::from_secs(1));
    assert_eq!(recorder.values(), vec![0, 1, 2]);
    assert!(!recorder.is_completed());
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[test]
  fn interval_first_tick_after_one_period() {
    let scheduler = TestScheduler::new();
    let recorder = Recorder::new();
    Observable::interval(Duration::from_millis(100), scheduler.clone()).subscribe(recorder.clone());
    scheduler.advance_by(Duration::from_millis(99));
    assert!(recorder.values().is_empty());
    scheduler.advance_by(Duration::from_millis(301));
    assert_eq!(recorder.values(), vec![0, 1, 2, 3]);
  }
}
