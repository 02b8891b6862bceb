use std::{cell::RefCell, mem, sync::Arc};

use parking_lot::ReentrantMutex;

use crate::{
  bag::BagKey,
  disposable::{AnyDisposable, Cancelable, Disposable},
  error::RxError,
  event::Event,
  observable::ObservableType,
  observer::{AnyObserver, Observer},
  subject::{dispatch, Observers, Subject, SubscriptionDisposable, Unsubscribe},
};

/// A subject holding a current value.
///
/// Every new subscriber first receives the current value, then the live
/// events. The replay happens under the subject's lock, so no concurrent
/// `on_next` can overtake it.
///
/// ```rust
/// use rxkit::prelude::*;
///
/// let subject = BehaviorSubject::new(0);
/// subject.on_next(1);
/// assert_eq!(subject.value().unwrap(), 1);
/// ```
pub struct BehaviorSubject<T>(Arc<Inner<T>>);

struct Inner<T> {
  state: ReentrantMutex<RefCell<State<T>>>,
}

struct State<T> {
  value: T,
  observers: Observers<T>,
  stopped: Option<Event<T>>,
  disposed: bool,
}

impl<T> Clone for BehaviorSubject<T> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T: Clone> BehaviorSubject<T> {
  pub fn new(value: T) -> Self {
    Self(Arc::new(Inner {
      state: ReentrantMutex::new(RefCell::new(State {
        value,
        observers: Arc::default(),
        stopped: None,
        disposed: false,
      })),
    }))
  }

  /// The current value.
  ///
  /// # Errors
  ///
  /// [`RxError::Disposed`] once the subject is disposed, or the error the
  /// subject terminated with.
  pub fn value(&self) -> Result<T, RxError> {
    let guard = self.0.state.lock();
    let state = guard.borrow();
    if state.disposed {
      return Err(RxError::Disposed { object: "BehaviorSubject" });
    }
    match &state.stopped {
      Some(Event::Error(err)) => Err(err.clone()),
      _ => Ok(state.value.clone()),
    }
  }

  pub fn has_observers(&self) -> bool { !self.0.state.lock().borrow().observers.is_empty() }
}

impl<T: Clone + Send + 'static> Observer<T> for BehaviorSubject<T> {
  fn on(&self, event: Event<T>) {
    let observers = {
      let guard = self.0.state.lock();
      let mut state = guard.borrow_mut();
      if state.disposed || state.stopped.is_some() {
        return;
      }
      match &event {
        Event::Next(value) => {
          state.value = value.clone();
          state.observers.clone()
        }
        _ => {
          state.stopped = Some(event.clone());
          mem::take(&mut state.observers)
        }
      }
    };
    dispatch(&observers, &event);
  }
}

impl<T: Clone + Send + 'static> ObservableType<T> for BehaviorSubject<T> {
  fn subscribe_observer(&self, observer: AnyObserver<T>) -> AnyDisposable {
    let guard = self.0.state.lock();
    let (replay, key) = {
      let mut state = guard.borrow_mut();
      if state.disposed {
        (Event::Error(RxError::Disposed { object: "BehaviorSubject" }), None)
      } else if let Some(stop) = &state.stopped {
        (stop.clone(), None)
      } else {
        let key = Arc::make_mut(&mut state.observers).insert(observer.clone());
        (Event::Next(state.value.clone()), Some(key))
      }
    };
    observer.on(replay);
    drop(guard);

    match key {
      Some(key) => AnyDisposable::new(SubscriptionDisposable::new(&self.0, key)),
      None => AnyDisposable::empty(),
    }
  }
}

impl<T: Clone + Send + 'static> Subject<T> for BehaviorSubject<T> {}

impl<T: Send> Unsubscribe for Inner<T> {
  fn unsubscribe(&self, key: BagKey) {
    let guard = self.state.lock();
    let removed = {
      let mut state = guard.borrow_mut();
      if state.disposed {
        return;
      }
      Arc::make_mut(&mut state.observers).remove_key(key)
    };
    drop(guard);
    drop(removed);
  }
}

impl<T: Send> Disposable for BehaviorSubject<T> {
  fn dispose(&self) {
    let guard = self.0.state.lock();
    let released = {
      let mut state = guard.borrow_mut();
      state.disposed = true;
      (mem::take(&mut state.observers), state.stopped.take())
    };
    drop(guard);
    drop(released);
  }
}

impl<T: Send> Cancelable for BehaviorSubject<T> {
  fn is_disposed(&self) -> bool { self.0.state.lock().borrow().disposed }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::observer::test_util::{Recorded, Recorder};

  #[test]
  fn subscriber_starts_with_current_value() {
    let subject = BehaviorSubject::new(1);
    subject.on_next(2);
    let recorder = Recorder::new();
    subject.subscribe_observer(recorder.observer());
    subject.on_next(3);
    assert_eq!(recorder.values(), vec![2, 3]);
  }

  #[test]
  fn terminated_subject_replays_only_the_stop_event() {
    let subject = BehaviorSubject::new("a");
    subject.on_completed();
    subject.on_next("b");

    let recorder = Recorder::new();
    subject.subscribe_observer(recorder.observer());
    assert_eq!(recorder.events(), vec![Recorded::Completed]);
    assert_eq!(subject.value().unwrap(), "a");
  }

  #[test]
  fn value_reports_error_and_disposal() {
    let subject = BehaviorSubject::new(0);
    subject.on_error(RxError::Timeout);
    assert!(matches!(subject.value(), Err(RxError::Timeout)));

    subject.dispose();
    assert!(matches!(subject.value(), Err(RxError::Disposed { object: "BehaviorSubject" })));
  }

  #[test]
  fn observer_may_push_during_its_replay() {
    let subject = BehaviorSubject::new(0);
    let recorder = Recorder::new();
    let (c_subject, c_recorder) = (subject.clone(), recorder.clone());
    subject.subscribe_observer(AnyObserver::from_fn(move |event: Event<i32>| {
      if event.element() == Some(&0) {
        c_subject.on_next(1);
      }
      c_recorder.on(event);
    }));
    assert_eq!(recorder.values(), vec![1, 0]);
    assert_eq!(subject.value().unwrap(), 1);
  }

  #[test]
  fn unsubscribe_stops_delivery() {
    let subject = BehaviorSubject::new(0);
    let recorder = Recorder::new();
    let subscription = subject.subscribe_observer(recorder.observer());
    subscription.dispose();
    subject.on_next(1);
    assert_eq!(recorder.values(), vec![0]);
    assert!(!subject.has_observers());
  }
}
