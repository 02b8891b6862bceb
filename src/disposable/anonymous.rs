use parking_lot::Mutex;

use super::{Cancelable, Disposable};
use crate::atomic::{AtomicFlags, DISPOSED};

type DisposeAction = Box<dyn FnOnce() + Send>;

/// Runs an action the first time it is disposed.
pub struct AnonymousDisposable {
  flags: AtomicFlags,
  action: Mutex<Option<DisposeAction>>,
}

impl AnonymousDisposable {
  pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
    Self { flags: AtomicFlags::new(), action: Mutex::new(Some(Box::new(action))) }
  }
}

impl Disposable for AnonymousDisposable {
  fn dispose(&self) {
    if self.flags.set_once(DISPOSED) {
      // Taken out before running so the closure's captures are released even
      // if the action itself panics.
      let action = self.action.lock().take();
      if let Some(action) = action {
        action();
      }
    }
  }
}

impl Cancelable for AnonymousDisposable {
  #[inline]
  fn is_disposed(&self) -> bool { self.flags.is_set(DISPOSED) }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use super::*;

  #[test]
  fn runs_action_once_across_threads() {
    let hits = Arc::new(AtomicUsize::new(0));
    let d = Arc::new(AnonymousDisposable::new({
      let hits = hits.clone();
      move || {
        hits.fetch_add(1, Ordering::SeqCst);
      }
    }));

    let handles: Vec<_> = (0..8)
      .map(|_| {
        let d = d.clone();
        std::thread::spawn(move || (0..100).for_each(|_| d.dispose()))
      })
      .collect();
    handles.into_iter().for_each(|h| h.join().unwrap());

    assert!(d.is_disposed());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }
}
