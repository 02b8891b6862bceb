//! The observer side of the push protocol.
//!
//! An [`Observer`] receives the events of one subscription. Observers are
//! shared between the producer that feeds them and the subject or sink that
//! stores them, so the trait takes `&self` and implementations use interior
//! mutability where they need state.
use std::{fmt, sync::Arc};

use crate::{error::RxError, event::Event};

mod anonymous;
mod binder;

pub use anonymous::AnonymousObserver;
pub use binder::Binder;

// ==================== Observer Trait ====================

/// Receives the events of a sequence.
///
/// Callers guarantee that events for one subscription are never delivered
/// concurrently and that nothing follows a stop event.
pub trait Observer<T>: Send + Sync {
  /// Delivers one event.
  fn on(&self, event: Event<T>);

  #[inline]
  fn on_next(&self, value: T) { self.on(Event::Next(value)) }

  #[inline]
  fn on_error(&self, err: RxError) { self.on(Event::Error(err)) }

  #[inline]
  fn on_completed(&self) { self.on(Event::Completed) }
}

impl<T, O: Observer<T> + ?Sized> Observer<T> for Arc<O> {
  #[inline]
  fn on(&self, event: Event<T>) { (**self).on(event) }
}

// ==================== AnyObserver ====================

/// A cheap-to-clone, type-erased observer.
pub struct AnyObserver<T>(Arc<dyn Observer<T>>);

impl<T: 'static> AnyObserver<T> {
  pub fn new(observer: impl Observer<T> + 'static) -> Self { Self(Arc::new(observer)) }

  /// Wraps an already shared observer without another allocation.
  pub fn from_arc<O: Observer<T> + 'static>(observer: Arc<O>) -> Self { Self(observer) }

  /// An observer that forwards every event to `handler`, without any
  /// grammar enforcement of its own.
  pub fn from_fn(handler: impl Fn(Event<T>) + Send + Sync + 'static) -> Self {
    Self::new(EventHandler(handler))
  }

  /// An observer that converts `R` values into `T` before forwarding them.
  ///
  /// A failing conversion is forwarded as an error event.
  pub fn map_observer<R: 'static>(
    self,
    f: impl Fn(R) -> Result<T, RxError> + Send + Sync + 'static,
  ) -> AnyObserver<R> {
    AnyObserver::from_fn(move |event: Event<R>| self.on(event.try_map(&f)))
  }

  /// Do both handles point to the same observer.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

impl<T> Clone for AnyObserver<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Observer<T> for AnyObserver<T> {
  #[inline]
  fn on(&self, event: Event<T>) { self.0.on(event) }
}

impl<T> fmt::Debug for AnyObserver<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("AnyObserver") }
}

struct EventHandler<F>(F);

impl<T, F> Observer<T> for EventHandler<F>
where
  F: Fn(Event<T>) + Send + Sync,
{
  #[inline]
  fn on(&self, event: Event<T>) { (self.0)(event) }
}

#[cfg(test)]
pub(crate) mod test_util {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use super::*;

  /// What an observer saw, with errors reduced to their display string so
  /// recordings can be compared.
  #[derive(Debug, Clone, PartialEq, Eq)]
  pub(crate) enum Recorded<T> {
    Next(T),
    Error(String),
    Completed,
  }

  /// Records every event it receives.
  #[derive(Clone)]
  pub(crate) struct Recorder<T>(Arc<Mutex<Vec<Recorded<T>>>>);

  impl<T> Default for Recorder<T> {
    fn default() -> Self { Self(Arc::default()) }
  }

  impl<T: Clone + Send + 'static> Recorder<T> {
    pub(crate) fn new() -> Self { Self::default() }

    pub(crate) fn observer(&self) -> AnyObserver<T> { AnyObserver::new(self.clone()) }

    pub(crate) fn events(&self) -> Vec<Recorded<T>> { self.0.lock().clone() }

    pub(crate) fn values(&self) -> Vec<T> {
      self
        .0
        .lock()
        .iter()
        .filter_map(|e| match e {
          Recorded::Next(v) => Some(v.clone()),
          _ => None,
        })
        .collect()
    }

    pub(crate) fn is_completed(&self) -> bool {
      self.0.lock().last().map_or(false, |e| matches!(e, Recorded::Completed))
    }
  }

  impl<T: Send> Observer<T> for Recorder<T> {
    fn on(&self, event: Event<T>) {
      let recorded = match event {
        Event::Next(v) => Recorded::Next(v),
        Event::Error(err) => Recorded::Error(err.to_string()),
        Event::Completed => Recorded::Completed,
      };
      self.0.lock().push(recorded);
    }
  }
}
