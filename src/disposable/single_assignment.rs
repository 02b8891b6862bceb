use super::{AnyDisposable, Cancelable, Disposable};
use crate::{
  atomic::{Assign, AssignOnce},
  error::fatal_error,
};

/// Holds at most one inner disposable, assigned after construction.
///
/// If the container is disposed before the inner disposable arrives, the
/// inner disposable is disposed as soon as it is assigned. Assigning twice is
/// a programming error.
///
/// # Examples
///
/// ```rust
/// use rxkit::prelude::*;
///
/// let holder = SingleAssignmentDisposable::new();
/// holder.dispose();
///
/// let late = SingleAssignmentDisposable::new();
/// holder.set_disposable(AnyDisposable::new(late.clone()));
/// assert!(late.is_disposed());
/// ```
#[derive(Default, Clone)]
pub struct SingleAssignmentDisposable(std::sync::Arc<AssignOnce<AnyDisposable>>);

impl SingleAssignmentDisposable {
  pub fn new() -> Self { Self::default() }

  /// Assigns the inner disposable.
  pub fn set_disposable(&self, disposable: AnyDisposable) {
    match self.0.assign(disposable) {
      Assign::Stored => {}
      Assign::AlreadyDisposed(disposable) => disposable.dispose(),
      Assign::Reassigned(disposable) => {
        fatal_error("SingleAssignmentDisposable: disposable is already set");
        // Only reached in release builds. A container that is already
        // disposed must not leak the rejected resource.
        if self.0.is_disposed() {
          disposable.dispose();
        }
      }
    }
  }

  /// Was an inner disposable assigned.
  #[inline]
  pub fn is_assigned(&self) -> bool { self.0.is_assigned() }
}

impl Disposable for SingleAssignmentDisposable {
  fn dispose(&self) {
    if let Some(disposable) = self.0.dispose() {
      disposable.dispose();
    }
  }
}

impl Cancelable for SingleAssignmentDisposable {
  #[inline]
  fn is_disposed(&self) -> bool { self.0.is_disposed() }
}
