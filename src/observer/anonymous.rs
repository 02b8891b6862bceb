use std::marker::PhantomData;

use crate::{
  atomic::{AtomicFlags, STOPPED},
  event::Event,
  observer::Observer,
};

/// Wraps an event handler and enforces the sequence grammar.
///
/// `Next` is delivered only while the observer is not stopped. The first stop
/// event sets the stopped flag and is delivered; any later event, of any
/// kind, is dropped. This is the last line of defense against sources that
/// keep emitting after they terminated.
pub struct AnonymousObserver<T, F> {
  stopped: AtomicFlags,
  handler: F,
  _item: PhantomData<fn(T)>,
}

impl<T, F> AnonymousObserver<T, F>
where
  F: Fn(Event<T>) + Send + Sync,
{
  pub fn new(handler: F) -> Self { Self { stopped: AtomicFlags::new(), handler, _item: PhantomData } }

  /// Has a stop event been delivered.
  #[inline]
  pub fn is_stopped(&self) -> bool { self.stopped.is_set(STOPPED) }
}

impl<T, F> Observer<T> for AnonymousObserver<T, F>
where
  F: Fn(Event<T>) + Send + Sync,
{
  fn on(&self, event: Event<T>) {
    match event {
      Event::Next(_) => {
        if !self.is_stopped() {
          (self.handler)(event);
        }
      }
      Event::Error(_) | Event::Completed => {
        if self.stopped.set_once(STOPPED) {
          (self.handler)(event);
        }
      }
    }
  }
}
