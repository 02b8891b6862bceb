use std::sync::{Arc, Weak};

use crate::{
  disposable::AnyDisposable,
  error::fatal_error,
  event::Event,
  observer::Observer,
  scheduler::{CurrentThreadScheduler, Scheduler},
};

type Binding<T> = dyn Fn(T) + Send + Sync;

/// An observer that binds values onto a target without keeping it alive.
///
/// Every `Next` is scheduled on the binder's scheduler and applied to the
/// target if it still exists; once the target is gone values are dropped.
/// Bindings are not meant to fail: an error event is a fatal error. A
/// completion is ignored, the binding simply stops receiving values.
///
/// ```rust
/// use std::sync::Arc;
///
/// use parking_lot::Mutex;
/// use rxkit::prelude::*;
///
/// struct Label {
///   text: Mutex<String>,
/// }
///
/// let label = Arc::new(Label { text: Mutex::new(String::new()) });
/// let binder = Binder::new(&label, |label: &Label, text: String| *label.text.lock() = text);
///
/// Observable::just("hello".to_string()).subscribe(binder);
/// assert_eq!(*label.text.lock(), "hello");
/// ```
pub struct Binder<T> {
  binding: Arc<Binding<T>>,
  scheduler: Arc<dyn Scheduler>,
}

impl<T> Clone for Binder<T> {
  fn clone(&self) -> Self { Self { binding: self.binding.clone(), scheduler: self.scheduler.clone() } }
}

impl<T: Send + 'static> Binder<T> {
  /// Binds on the [`CurrentThreadScheduler`].
  pub fn new<Target>(target: &Arc<Target>, binding: impl Fn(&Target, T) + Send + Sync + 'static) -> Self
  where
    Target: Send + Sync + 'static,
  {
    Self::with_scheduler(target, CurrentThreadScheduler, binding)
  }

  /// Binds on `scheduler`, for targets that must only be touched from a
  /// particular thread.
  pub fn with_scheduler<Target>(
    target: &Arc<Target>,
    scheduler: impl Scheduler + 'static,
    binding: impl Fn(&Target, T) + Send + Sync + 'static,
  ) -> Self
  where
    Target: Send + Sync + 'static,
  {
    let weak: Weak<Target> = Arc::downgrade(target);
    let binding = move |value: T| match weak.upgrade() {
      Some(target) => binding(&*target, value),
      None => tracing::trace!("binder target released, value dropped"),
    };
    Self { binding: Arc::new(binding), scheduler: Arc::new(scheduler) }
  }
}

impl<T: Send + 'static> Observer<T> for Binder<T> {
  fn on(&self, event: Event<T>) {
    match event {
      Event::Next(value) => {
        let binding = self.binding.clone();
        self.scheduler.schedule_action(Box::new(move || {
          binding(value);
          AnyDisposable::empty()
        }));
      }
      Event::Error(err) => fatal_error(format_args!("binding error: {err}")),
      Event::Completed => {}
    }
  }
}

#[cfg(test)]
mod tests {
  use parking_lot::Mutex;

  use super::*;
  use crate::{error::RxError, scheduler::TestScheduler};

  #[derive(Default)]
  struct Target {
    values: Mutex<Vec<i32>>,
  }

  #[test]
  fn applies_values_on_the_scheduler() {
    let scheduler = TestScheduler::new();
    let target = Arc::new(Target::default());
    let binder =
      Binder::with_scheduler(&target, scheduler.clone(), |t: &Target, v| t.values.lock().push(v));

    binder.on_next(1);
    binder.on_next(2);
    assert!(target.values.lock().is_empty());

    scheduler.start();
    assert_eq!(*target.values.lock(), vec![1, 2]);

    binder.on_completed();
    binder.on_next(3);
    scheduler.start();
    assert_eq!(*target.values.lock(), vec![1, 2, 3]);
  }

  #[test]
  fn does_not_keep_target_alive() {
    let target = Arc::new(Target::default());
    let binder = Binder::new(&target, |t: &Target, v| t.values.lock().push(v));
    let weak = Arc::downgrade(&target);
    drop(target);
    assert!(weak.upgrade().is_none());
    binder.on_next(1);
  }

  #[cfg(debug_assertions)]
  #[test]
  #[should_panic(expected = "binding error")]
  fn errors_are_fatal() {
    let target = Arc::new(Target::default());
    Binder::new(&target, |t: &Target, v| t.values.lock().push(v)).on_error(RxError::Timeout);
  }
}
