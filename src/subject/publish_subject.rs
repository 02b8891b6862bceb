use std::{mem, sync::Arc};

use parking_lot::Mutex;

use crate::{
  bag::BagKey,
  disposable::{AnyDisposable, Cancelable, Disposable},
  error::RxError,
  event::Event,
  observable::ObservableType,
  observer::{AnyObserver, Observer},
  subject::{dispatch, Observers, Subject, SubscriptionDisposable, Unsubscribe},
};

/// Broadcasts every event to the observers subscribed at the time of the
/// event.
///
/// Late subscribers only see what happens after they subscribe. After a stop
/// event every new subscriber receives that stop event and nothing else.
///
/// ```rust
/// use rxkit::prelude::*;
///
/// let bag = DisposeBag::new();
/// let subject = PublishSubject::<i32>::new();
/// subject.as_observable().subscribe_next(|_| {}).disposed_by(&bag);
/// assert!(subject.has_observers());
///
/// drop(bag);
/// assert!(!subject.has_observers());
/// ```
pub struct PublishSubject<T>(Arc<Inner<T>>);

struct Inner<T> {
  state: Mutex<State<T>>,
}

struct State<T> {
  observers: Observers<T>,
  stopped: Option<Event<T>>,
  disposed: bool,
}

impl<T> Clone for PublishSubject<T> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Default for PublishSubject<T> {
  fn default() -> Self {
    Self(Arc::new(Inner {
      state: Mutex::new(State { observers: Arc::default(), stopped: None, disposed: false }),
    }))
  }
}

impl<T> PublishSubject<T> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Whether any observer is currently subscribed.
  pub fn has_observers(&self) -> bool { !self.0.state.lock().observers.is_empty() }
}

impl<T: Clone + Send + 'static> Observer<T> for PublishSubject<T> {
  fn on(&self, event: Event<T>) {
    let observers = {
      let mut state = self.0.state.lock();
      if event.is_stop_event() {
        if state.stopped.is_some() {
          return;
        }
        state.stopped = Some(event.clone());
        mem::take(&mut state.observers)
      } else if state.disposed || state.stopped.is_some() {
        return;
      } else {
        state.observers.clone()
      }
    };
    dispatch(&observers, &event);
  }
}

impl<T: Clone + Send + 'static> ObservableType<T> for PublishSubject<T> {
  fn subscribe_observer(&self, observer: AnyObserver<T>) -> AnyDisposable {
    let mut state = self.0.state.lock();
    if let Some(stop) = state.stopped.clone() {
      drop(state);
      observer.on(stop);
      return AnyDisposable::empty();
    }
    if state.disposed {
      drop(state);
      observer.on_error(RxError::Disposed { object: "PublishSubject" });
      return AnyDisposable::empty();
    }
    let key = Arc::make_mut(&mut state.observers).insert(observer);
    drop(state);
    AnyDisposable::new(SubscriptionDisposable::new(&self.0, key))
  }
}

impl<T: Clone + Send + 'static> Subject<T> for PublishSubject<T> {}

impl<T: Send> Unsubscribe for Inner<T> {
  fn unsubscribe(&self, key: BagKey) {
    let removed = {
      let mut state = self.state.lock();
      if state.disposed {
        return;
      }
      Arc::make_mut(&mut state.observers).remove_key(key)
    };
    drop(removed);
  }
}

impl<T: Send> Disposable for PublishSubject<T> {
  /// Drops every observer without notifying them. Subscribing afterwards
  /// fails with [`RxError::Disposed`].
  fn dispose(&self) {
    let (observers, stopped) = {
      let mut state = self.0.state.lock();
      state.disposed = true;
      (mem::take(&mut state.observers), state.stopped.take())
    };
    drop((observers, stopped));
  }
}

impl<T: Send> Cancelable for PublishSubject<T> {
  fn is_disposed(&self) -> bool { self.0.state.lock().disposed }
}
