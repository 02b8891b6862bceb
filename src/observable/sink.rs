use crate::{
  atomic::{AtomicFlags, DISPOSED},
  disposable::{CancelToken, Disposable},
  event::Event,
  observer::{AnyObserver, Observer},
};

/// The downstream half of a producer subscription.
///
/// Operator sinks embed one of these. Once disposed, `forward_on` drops
/// every event, so nothing reaches the observer after the subscription is
/// torn down, whatever is still queued upstream.
pub(crate) struct Sink<T> {
  observer: AnyObserver<T>,
  cancel: CancelToken,
  disposed: AtomicFlags,
}

impl<T> Sink<T> {
  pub(crate) fn new(observer: AnyObserver<T>, cancel: CancelToken) -> Self {
    Self { observer, cancel, disposed: AtomicFlags::new() }
  }

  #[inline]
  pub(crate) fn forward_on(&self, event: Event<T>) {
    if self.disposed.is_set(DISPOSED) {
      return;
    }
    self.observer.on(event)
  }

  /// Forwards a stop event and tears the subscription down.
  pub(crate) fn forward_stop(&self, event: Event<T>) {
    self.forward_on(event);
    self.dispose();
  }

  #[inline]
  pub(crate) fn is_disposed(&self) -> bool { self.disposed.is_set(DISPOSED) }

  /// Marks the sink disposed and cancels the whole subscription.
  pub(crate) fn dispose(&self) {
    if self.disposed.set_once(DISPOSED) {
      self.cancel.dispose();
    }
  }
}
