use std::{mem, sync::Arc};

use parking_lot::Mutex;

use crate::{
  bag::BagKey,
  disposable::AnyDisposable,
  event::Event,
  observable::ObservableType,
  observer::{AnyObserver, Observer},
  subject::{dispatch, Observers, Subject, SubscriptionDisposable, Unsubscribe},
};

/// Emits only the last value it received, and only once it completes.
///
/// Completing without any value forwards a bare `Completed`. An error is
/// forwarded as is and the last value is dropped. Subscribers arriving after
/// termination receive the same outcome.
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use rxkit::prelude::*;
///
/// let subject = AsyncSubject::new();
/// subject.on_next(1);
/// subject.on_next(2);
/// subject.on_completed();
///
/// let seen = Arc::new(Mutex::new(vec![]));
/// let c_seen = seen.clone();
/// subject.as_observable().subscribe_next(move |v| c_seen.lock().unwrap().push(v));
/// assert_eq!(*seen.lock().unwrap(), vec![2]);
/// ```
pub struct AsyncSubject<T>(Arc<Inner<T>>);

struct Inner<T> {
  state: Mutex<State<T>>,
}

struct State<T> {
  observers: Observers<T>,
  last: Option<T>,
  /// `Next(last)` stands for "last value, then completed".
  stopped: Option<Event<T>>,
}

impl<T> Clone for AsyncSubject<T> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Default for AsyncSubject<T> {
  fn default() -> Self {
    Self(Arc::new(Inner {
      state: Mutex::new(State { observers: Arc::default(), last: None, stopped: None }),
    }))
  }
}

impl<T> AsyncSubject<T> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  pub fn has_observers(&self) -> bool { !self.0.state.lock().observers.is_empty() }
}

/// Sends the terminal outcome `stop` to `observer`.
fn replay<T: Clone>(stop: &Event<T>, observer: &AnyObserver<T>) {
  observer.on(stop.clone());
  if !stop.is_stop_event() {
    observer.on(Event::Completed);
  }
}

impl<T: Clone + Send + 'static> Observer<T> for AsyncSubject<T> {
  fn on(&self, event: Event<T>) {
    let (observers, outcome) = {
      let mut state = self.0.state.lock();
      if state.stopped.is_some() {
        return;
      }
      let outcome = match event {
        Event::Next(value) => {
          state.last = Some(value);
          return;
        }
        Event::Error(err) => Event::Error(err),
        Event::Completed => state.last.take().map_or(Event::Completed, Event::Next),
      };
      state.stopped = Some(outcome.clone());
      (mem::take(&mut state.observers), outcome)
    };
    dispatch(&observers, &outcome);
    if !outcome.is_stop_event() {
      dispatch(&observers, &Event::Completed);
    }
  }
}

impl<T: Clone + Send + 'static> ObservableType<T> for AsyncSubject<T> {
  fn subscribe_observer(&self, observer: AnyObserver<T>) -> AnyDisposable {
    let mut state = self.0.state.lock();
    if let Some(stop) = state.stopped.clone() {
      drop(state);
      replay(&stop, &observer);
      return AnyDisposable::empty();
    }
    let key = Arc::make_mut(&mut state.observers).insert(observer);
    drop(state);
    AnyDisposable::new(SubscriptionDisposable::new(&self.0, key))
  }
}

impl<T: Clone + Send + 'static> Subject<T> for AsyncSubject<T> {}

impl<T: Send> Unsubscribe for Inner<T> {
  fn unsubscribe(&self, key: BagKey) {
    let removed = Arc::make_mut(&mut self.state.lock().observers).remove_key(key);
    drop(removed);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    error::RxError,
    observer::test_util::{Recorded, Recorder},
  };

  #[test]
  fn emits_last_value_on_completion() {
    let subject = AsyncSubject::new();
    let early = Recorder::new();
    subject.subscribe_observer(early.observer());
    subject.on_next(1);
    subject.on_next(2);
    assert!(early.events().is_empty());
    subject.on_completed();

    let late = Recorder::new();
    subject.subscribe_observer(late.observer());
    let expected = vec![Recorded::Next(2), Recorded::Completed];
    assert_eq!(early.events(), expected);
    assert_eq!(late.events(), expected);
  }

  #[test]
  fn completes_bare_without_values() {
    let subject = AsyncSubject::<i32>::new();
    subject.on_completed();
    let recorder = Recorder::new();
    subject.subscribe_observer(recorder.observer());
    assert_eq!(recorder.events(), vec![Recorded::Completed]);
  }

  #[test]
  fn error_drops_the_last_value() {
    let subject = AsyncSubject::new();
    let recorder = Recorder::new();
    subject.subscribe_observer(recorder.observer());
    subject.on_next(1);
    subject.on_error(RxError::msg("failed"));
    subject.on_completed();
    assert_eq!(recorder.events(), vec![Recorded::Error("failed".into())]);
    assert!(!subject.has_observers());
  }
}
