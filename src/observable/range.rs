use std::sync::Arc;

use crate::{
  disposable::{AnyDisposable, CancelToken, Disposable},
  error::RxError,
  event::Event,
  observable::{Observable, Producer, Sink},
  observer::AnyObserver,
  scheduler::{Scheduler, SchedulerExt},
};

/// Primitive integers usable with [`Observable::range`].
pub trait RangeInteger: Copy + PartialOrd + Send + Sync + 'static {
  const ZERO: Self;
  const ONE: Self;

  fn checked_add(self, rhs: Self) -> Option<Self>;
  fn checked_sub(self, rhs: Self) -> Option<Self>;
}

macro_rules! impl_range_integer {
  ($($t:ty),*) => {
    $(
      impl RangeInteger for $t {
        const ZERO: Self = 0;
        const ONE: Self = 1;

        #[inline]
        fn checked_add(self, rhs: Self) -> Option<Self> { <$t>::checked_add(self, rhs) }

        #[inline]
        fn checked_sub(self, rhs: Self) -> Option<Self> { <$t>::checked_sub(self, rhs) }
      }
    )*
  };
}

impl_range_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

struct Range<I> {
  start: I,
  count: I,
  scheduler: Arc<dyn Scheduler>,
}

impl<I: RangeInteger> Observable<I> {
  /// Emits `count` consecutive integers starting at `start`, then completes.
  ///
  /// The bounds are checked here, before anything is subscribed.
  ///
  /// # Errors
  ///
  /// - [`RxError::ArgumentOutOfRange`] when `count` is negative.
  /// - [`RxError::Overflow`] when the last value, `start + (count - 1)`,
  ///   does not fit in `I`.
  ///
  /// ```rust
  /// use rxkit::prelude::*;
  ///
  /// assert!(Observable::range(0, -1, CurrentThreadScheduler).is_err());
  /// assert!(Observable::range(i32::MAX - 1, 3, CurrentThreadScheduler).is_err());
  /// assert!(Observable::range(i32::MAX - 1, 2, CurrentThreadScheduler).is_ok());
  /// ```
  pub fn range(start: I, count: I, scheduler: impl Scheduler + 'static) -> Result<Self, RxError> {
    if count < I::ZERO {
      return Err(RxError::ArgumentOutOfRange);
    }
    if count > I::ZERO {
      let last_offset = count.checked_sub(I::ONE).ok_or(RxError::Overflow)?;
      start.checked_add(last_offset).ok_or(RxError::Overflow)?;
    }
    Ok(Self::from_producer(Range { start, count, scheduler: Arc::new(scheduler) }))
  }
}

impl<I: RangeInteger> Producer<I> for Range<I> {
  fn run(&self, observer: AnyObserver<I>, cancel: CancelToken) -> (AnyDisposable, AnyDisposable) {
    let sink = Arc::new(RangeSink(Sink::new(observer, cancel)));
    let (c_sink, start, count) = (sink.clone(), self.start, self.count);
    let subscription = self.scheduler.schedule_recursive(I::ZERO, move |offset: I, recurse| {
      // Validated at construction: every offset below `count` fits.
      match (offset < count).then(|| start.checked_add(offset)).flatten() {
        Some(value) => {
          c_sink.0.forward_on(Event::Next(value));
          if let Some(next) = offset.checked_add(I::ONE) {
            recurse.schedule(next);
          }
        }
        None => c_sink.0.forward_stop(Event::Completed),
      }
    });
    (AnyDisposable::from_arc(sink), subscription)
  }
}

struct RangeSink<I>(Sink<I>);

impl<I> Disposable for RangeSink<I> {
  fn dispose(&self) { self.0.dispose() }
}
