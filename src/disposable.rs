//! Disposal primitives.
//!
//! A [`Disposable`] represents ownership of a resource: a subscription, a
//! scheduled timer, a connection. Every implementation in this module obeys
//! the same rule: `dispose()` may be called from any thread, any number of
//! times, and the owned resource is released exactly once.
//!
//! | Type | Holds |
//! |------|-------|
//! | [`AnyDisposable`] | type-erased shared handle, or nothing |
//! | [`AnonymousDisposable`] | an action run on first disposal |
//! | [`SingleAssignmentDisposable`] | one inner disposable, assigned later |
//! | [`SerialDisposable`] | a replaceable inner disposable |
//! | [`BinaryDisposable`] | exactly two children |
//! | [`CompositeDisposable`] | any number of children, removable by key |
//! | [`DisposeBag`] | disposables released when the bag is dropped |
use std::{fmt, sync::Arc};

mod anonymous;
mod binary;
mod composite;
mod dispose_bag;
mod serial;
mod single_assignment;

pub use anonymous::AnonymousDisposable;
pub use binary::BinaryDisposable;
pub use composite::{CompositeDisposable, DisposeKey};
pub use dispose_bag::DisposeBag;
pub use serial::SerialDisposable;
pub use single_assignment::SingleAssignmentDisposable;

// ==================== Traits ====================

/// A resource that can be released.
pub trait Disposable: Send + Sync {
  /// Releases the resource. Calling it again is a no-op.
  fn dispose(&self);
}

/// A [`Disposable`] whose disposal state can be queried.
///
/// Threaded through operator pipelines as the cancellation token so work can
/// be skipped once the subscription is gone.
pub trait Cancelable: Disposable {
  fn is_disposed(&self) -> bool;
}

/// Cancellation token handed to operators.
pub type CancelToken = Arc<dyn Cancelable>;

impl<D: Disposable + ?Sized> Disposable for Arc<D> {
  #[inline]
  fn dispose(&self) { (**self).dispose() }
}

impl<D: Cancelable + ?Sized> Cancelable for Arc<D> {
  #[inline]
  fn is_disposed(&self) -> bool { (**self).is_disposed() }
}

// ==================== AnyDisposable ====================

/// A cheap-to-clone, type-erased disposable handle.
///
/// Clones share the same underlying resource, so disposing any clone
/// disposes them all. [`AnyDisposable::empty`] holds nothing and disposing it
/// does nothing.
///
/// # Examples
///
/// ```rust
/// use std::sync::{
///   atomic::{AtomicUsize, Ordering},
///   Arc,
/// };
///
/// use rxkit::prelude::*;
///
/// let hits = Arc::new(AtomicUsize::new(0));
/// let c_hits = hits.clone();
/// let d = AnyDisposable::create(move || {
///   c_hits.fetch_add(1, Ordering::SeqCst);
/// });
///
/// let other = d.clone();
/// d.dispose();
/// other.dispose();
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone, Default)]
pub struct AnyDisposable(Option<Arc<dyn Disposable>>);

impl AnyDisposable {
  /// Wraps a disposable.
  #[inline]
  pub fn new(disposable: impl Disposable + 'static) -> Self { Self(Some(Arc::new(disposable))) }

  /// Wraps an already shared disposable without another allocation.
  #[inline]
  pub fn from_arc<D: Disposable + 'static>(disposable: Arc<D>) -> Self { Self(Some(disposable)) }

  /// A disposable that does nothing.
  #[inline]
  pub fn empty() -> Self { Self(None) }

  /// A disposable that runs `action` the first time it is disposed.
  #[inline]
  pub fn create(action: impl FnOnce() + Send + 'static) -> Self {
    Self::new(AnonymousDisposable::new(action))
  }

  /// A disposable that disposes both `first` and `second`.
  #[inline]
  pub fn binary(first: AnyDisposable, second: AnyDisposable) -> Self {
    Self::new(BinaryDisposable::new(first, second))
  }

  /// Is this the empty disposable.
  #[inline]
  pub fn is_empty(&self) -> bool { self.0.is_none() }

  /// Returns a guard that disposes this resource when dropped.
  #[inline]
  pub fn dispose_when_dropped(self) -> DisposeGuard { DisposeGuard(Some(self)) }

  /// Hands the disposable over to `bag`, released when the bag is dropped.
  #[inline]
  pub fn disposed_by(self, bag: &DisposeBag) { bag.insert(self) }
}

impl Disposable for AnyDisposable {
  #[inline]
  fn dispose(&self) {
    if let Some(inner) = self.0.as_ref() {
      inner.dispose()
    }
  }
}

impl From<Arc<dyn Disposable>> for AnyDisposable {
  #[inline]
  fn from(disposable: Arc<dyn Disposable>) -> Self { Self(Some(disposable)) }
}

impl From<CancelToken> for AnyDisposable {
  fn from(token: CancelToken) -> Self { Self::new(token) }
}

impl fmt::Debug for AnyDisposable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("AnyDisposable").field(&if self.is_empty() { "empty" } else { "resource" }).finish()
  }
}

// ==================== DisposeGuard ====================

/// An RAII guard that disposes its resource when dropped.
#[must_use = "the resource is disposed as soon as the guard is dropped"]
#[derive(Debug)]
pub struct DisposeGuard(Option<AnyDisposable>);

impl DisposeGuard {
  /// Releases the guard without disposing the resource.
  pub fn into_inner(mut self) -> AnyDisposable { self.0.take().unwrap_or_default() }
}

impl Drop for DisposeGuard {
  fn drop(&mut self) {
    if let Some(disposable) = self.0.take() {
      disposable.dispose()
    }
  }
}


#[cfg(test)]
mod tests {
  use super::{test_util::CountingDisposable, *};

  #[test]
  fn empty_is_noop() {
    let d = AnyDisposable::empty();
    assert!(d.is_empty());
    d.dispose();
    d.dispose();
  }

  #[test]
  fn clones_share_resource() {
    let counter = CountingDisposable::default();
    let d = AnyDisposable::create({
      let counter = counter.clone();
      move || counter.dispose()
    });
    let clone = d.clone();
    d.dispose();
    clone.dispose();
    assert_eq!(counter.count(), 1);
  }

  #[test]
  fn guard_disposes_on_drop() {
    let counter = CountingDisposable::default();
    {
      let _guard = AnyDisposable::new(counter.clone()).dispose_when_dropped();
      assert_eq!(counter.count(), 0);
    }
    assert_eq!(counter.count(), 1);
  }

  #[test]
  fn guard_into_inner_keeps_resource() {
    let counter = CountingDisposable::default();
    let guard = AnyDisposable::new(counter.clone()).dispose_when_dropped();
    let inner = guard.into_inner();
    assert_eq!(counter.count(), 0);
    inner.dispose();
    assert_eq!(counter.count(), 1);
  }
}
