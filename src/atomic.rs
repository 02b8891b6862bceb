//! Bit-flag state machines on a single atomic word.
//!
//! Callers always branch on the value the word held *before* their update,
//! never on the new value.

use std::sync::atomic::{AtomicI32, Ordering};

use parking_lot::Mutex;

/// Set once disposal was requested.
pub(crate) const DISPOSED: i32 = 1;
/// Set once the guarded resource was published.
pub(crate) const ASSIGNED: i32 = 2;
/// Set once an observer received its terminal event.
pub(crate) const STOPPED: i32 = 4;

/// A word of flags updated with `fetch_or`.
#[derive(Debug, Default)]
pub(crate) struct AtomicFlags(AtomicI32);

impl AtomicFlags {
  pub(crate) const fn new() -> Self { Self(AtomicI32::new(0)) }

  /// Sets `mask` and returns the previous value.
  #[inline]
  pub(crate) fn fetch_or(&self, mask: i32) -> i32 { self.0.fetch_or(mask, Ordering::AcqRel) }

  #[inline]
  pub(crate) fn load(&self) -> i32 { self.0.load(Ordering::Acquire) }

  #[inline]
  pub(crate) fn is_set(&self, mask: i32) -> bool { self.load() & mask != 0 }

  /// Sets `mask` and reports whether this call was the one that set it.
  #[inline]
  pub(crate) fn set_once(&self, mask: i32) -> bool { self.fetch_or(mask) & mask == 0 }
}

/// Outcome of [`AssignOnce::assign`].
#[derive(Debug)]
pub(crate) enum Assign<T> {
  /// Stored; a later `dispose` hands it back.
  Stored,
  /// Disposal was requested first. The caller must release the value now.
  AlreadyDisposed(T),
  /// A value was assigned before. The rejected value is handed back.
  Reassigned(T),
}

/// A slot written at most once and taken out at most once on disposal.
///
/// The state word moves through `0 -> ASSIGNED -> ASSIGNED|DISPOSED` or
/// `0 -> DISPOSED -> DISPOSED|ASSIGNED`. Whichever of `assign` and `dispose`
/// runs second observes the other's bit in the previous value and is the one
/// that releases the value, so it is released exactly once whatever the
/// interleaving.
#[derive(Debug)]
pub(crate) struct AssignOnce<T> {
  state: AtomicFlags,
  slot: Mutex<Option<T>>,
}

impl<T> Default for AssignOnce<T> {
  fn default() -> Self { Self::new() }
}

impl<T> AssignOnce<T> {
  pub(crate) fn new() -> Self { Self { state: AtomicFlags::new(), slot: Mutex::new(None) } }

  pub(crate) fn assign(&self, value: T) -> Assign<T> {
    {
      let mut slot = self.slot.lock();
      if slot.is_some() {
        return Assign::Reassigned(value);
      }
      // Published before the flag so a racing `dispose` that sees `ASSIGNED`
      // also finds the value.
      *slot = Some(value);
    }

    let previous = self.state.fetch_or(ASSIGNED);
    if previous & ASSIGNED != 0 {
      // The first value was already released by `dispose`; take ours back out.
      return match self.slot.lock().take() {
        Some(value) => Assign::Reassigned(value),
        None => Assign::Stored,
      };
    }
    if previous & DISPOSED != 0 {
      if let Some(value) = self.slot.lock().take() {
        return Assign::AlreadyDisposed(value);
      }
    }
    Assign::Stored
  }

  /// Requests disposal. Returns the assigned value to the single caller that
  /// must release it.
  pub(crate) fn dispose(&self) -> Option<T> {
    let previous = self.state.fetch_or(DISPOSED);
    if previous & DISPOSED != 0 {
      return None;
    }
    if previous & ASSIGNED != 0 {
      return self.slot.lock().take();
    }
    None
  }

  #[inline]
  pub(crate) fn is_disposed(&self) -> bool { self.state.is_set(DISPOSED) }

  #[inline]
  pub(crate) fn is_assigned(&self) -> bool { self.state.is_set(ASSIGNED) }

  #[cfg(test)]
  pub(crate) fn state(&self) -> i32 { self.state.load() }
}
