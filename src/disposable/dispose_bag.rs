use parking_lot::Mutex;

use super::{AnyDisposable, Disposable};

/// Collects disposables and disposes all of them when dropped.
///
/// Use it to tie a set of subscriptions to the lifetime of an owner.
///
/// ```rust
/// use rxkit::prelude::*;
///
/// let subject = PublishSubject::<i32>::new();
/// {
///   let bag = DisposeBag::new();
///   subject.as_observable().subscribe_next(|_| {}).disposed_by(&bag);
///   assert!(subject.has_observers());
/// }
/// assert!(!subject.has_observers());
/// ```
#[derive(Default)]
pub struct DisposeBag {
  disposables: Mutex<Vec<AnyDisposable>>,
}

impl DisposeBag {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&self, disposable: AnyDisposable) { self.disposables.lock().push(disposable); }

  pub fn len(&self) -> usize { self.disposables.lock().len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Drop for DisposeBag {
  fn drop(&mut self) {
    std::mem::take(self.disposables.get_mut()).into_iter().for_each(|d| d.dispose());
  }
}
