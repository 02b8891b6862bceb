use std::{cell::RefCell, collections::VecDeque, mem, sync::Arc};

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

/// Replays buffered values to every new subscriber, then forwards live
/// events.
///
/// A bounded subject keeps the most recent `buffer_size` values; an
/// unbounded one keeps them all. After termination late subscribers receive
/// the buffer followed by the stop event.
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use rxkit::prelude::*;
///
/// let subject = ReplaySubject::with_buffer_size(2);
/// (1..=3).for_each(|v| subject.on_next(v));
///
/// let seen = Arc::new(Mutex::new(vec![]));
/// let c_seen = seen.clone();
/// subject.as_observable().subscribe_next(move |v| c_seen.lock().unwrap().push(v));
/// assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
/// ```
pub struct ReplaySubject<T>(Arc<Inner<T>>);

struct Inner<T> {
  buffer_size: Option<usize>,
  state: ReentrantMutex<RefCell<State<T>>>,
}

struct State<T> {
  buffer: VecDeque<T>,
  observers: Observers<T>,
  stopped: Option<Event<T>>,
  disposed: bool,
}

impl<T> Clone for ReplaySubject<T> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> ReplaySubject<T> {
  fn with_limit(buffer_size: Option<usize>) -> Self {
    let state = State {
      buffer: VecDeque::new(),
      observers: Arc::default(),
      stopped: None,
      disposed: false,
    };
    Self(Arc::new(Inner { buffer_size, state: ReentrantMutex::new(RefCell::new(state)) }))
  }

  /// Keeps the last `buffer_size` values. A size of zero replays nothing
  /// but the stop event.
  pub fn with_buffer_size(buffer_size: usize) -> Self { Self::with_limit(Some(buffer_size)) }

  /// Keeps every value.
  pub fn unbounded() -> Self { Self::with_limit(None) }

  pub fn has_observers(&self) -> bool { !self.0.state.lock().borrow().observers.is_empty() }
}

impl<T: Clone + Send + 'static> Observer<T> for ReplaySubject<T> {
  fn on(&self, event: Event<T>) {
    let observers = {
      let guard = self.0.state.lock();
      let mut state = guard.borrow_mut();
      if state.disposed || state.stopped.is_some() {
        return;
      }
      match &event {
        Event::Next(value) => {
          if self.0.buffer_size != Some(0) {
            state.buffer.push_back(value.clone());
          }
          if let Some(limit) = self.0.buffer_size {
            while state.buffer.len() > limit {
              state.buffer.pop_front();
            }
          }
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

impl<T: Clone + Send + 'static> ObservableType<T> for ReplaySubject<T> {
  fn subscribe_observer(&self, observer: AnyObserver<T>) -> AnyDisposable {
    let guard = self.0.state.lock();
    let (buffered, stopped) = {
      let state = guard.borrow();
      if state.disposed {
        drop(state);
        observer.on_error(RxError::Disposed { object: "ReplaySubject" });
        return AnyDisposable::empty();
      }
      (state.buffer.clone(), state.stopped.clone())
    };
    buffered.into_iter().for_each(|value| observer.on_next(value));

    if let Some(stop) = stopped {
      observer.on(stop);
      return AnyDisposable::empty();
    }

    let key = {
      let mut state = guard.borrow_mut();
      if state.disposed {
        return AnyDisposable::empty();
      }
      match state.stopped.clone() {
        // Terminated by the observer itself during the replay.
        Some(stop) => {
          drop(state);
          observer.on(stop);
          return AnyDisposable::empty();
        }
        None => Arc::make_mut(&mut state.observers).insert(observer),
      }
    };
    drop(guard);
    AnyDisposable::new(SubscriptionDisposable::new(&self.0, key))
  }
}

impl<T: Clone + Send + 'static> Subject<T> for ReplaySubject<T> {}

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

impl<T: Send> Disposable for ReplaySubject<T> {
  fn dispose(&self) {
    let guard = self.0.state.lock();
    let released = {
      let mut state = guard.borrow_mut();
      state.disposed = true;
      (mem::take(&mut state.observers), mem::take(&mut state.buffer), state.stopped.take())
    };
    drop(guard);
    drop(released);
  }
}

impl<T: Send> Cancelable for ReplaySubject<T> {
  fn is_disposed(&self) -> bool { self.0.state.lock().borrow().disposed }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::observer::test_util::{Recorded, Recorder};

  #[test]
  fn bounded_buffer_keeps_the_latest_values() {
    let subject = ReplaySubject::with_buffer_size(2);
    (1..=5).for_each(|v| subject.on_next(v));
    let recorder = Recorder::new();
    subject.subscribe_observer(recorder.observer());
    subject.on_next(6);
    assert_eq!(recorder.values(), vec![4, 5, 6]);
  }

  #[test]
  fn unbounded_buffer_then_stop_event() {
    let subject = ReplaySubject::unbounded();
    (1..=3).for_each(|v| subject.on_next(v));
    subject.on_completed();

    let recorder = Recorder::new();
    let subscription = subject.subscribe_observer(recorder.observer());
    assert!(subscription.is_empty());
    assert_eq!(
      recorder.events(),
      vec![Recorded::Next(1), Recorded::Next(2), Recorded::Next(3), Recorded::Completed]
    );
  }

  #[test]
  fn zero_sized_buffer_behaves_like_publish() {
    let subject = ReplaySubject::with_buffer_size(0);
    subject.on_next(1);
    let recorder = Recorder::new();
    subject.subscribe_observer(recorder.observer());
    subject.on_next(2);
    assert_eq!(recorder.values(), vec![2]);
  }

  #[test]
  fn disposed_subject_rejects_subscribers() {
    let subject = ReplaySubject::unbounded();
    subject.on_next(1);
    subject.dispose();
    assert!(subject.is_disposed());

    let recorder = Recorder::<i32>::new();
    subject.subscribe_observer(recorder.observer());
    assert_eq!(recorder.events(), vec![Recorded::Error("object `ReplaySubject` was already disposed".into())]);
  }
}
