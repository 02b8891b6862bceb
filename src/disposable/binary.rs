use parking_lot::Mutex;

use super::{AnyDisposable, Cancelable, Disposable};
use crate::atomic::{AtomicFlags, DISPOSED};

/// Disposes two children exactly once, then drops the references to them.
pub struct BinaryDisposable {
  flags: AtomicFlags,
  children: Mutex<Option<(AnyDisposable, AnyDisposable)>>,
}

impl BinaryDisposable {
  pub fn new(first: AnyDisposable, second: AnyDisposable) -> Self {
    Self { flags: AtomicFlags::new(), children: Mutex::new(Some((first, second))) }
  }
}

impl Disposable for BinaryDisposable {
  fn dispose(&self) {
    if !self.flags.set_once(DISPOSED) {
      return;
    }
    let children = self.children.lock().take();
    if let Some((first, second)) = children {
      first.dispose();
      second.dispose();
    }
  }
}

impl Cancelable for BinaryDisposable {
  #[inline]
  fn is_disposed(&self) -> bool { self.flags.is_set(DISPOSED) }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{Arc, Barrier},
    thread,
  };

  use super::*;
  use crate::disposable::test_util::CountingDisposable;

  #[test]
  fn disposes_both_once() {
    let (a, b) = (CountingDisposable::default(), CountingDisposable::default());
    let d = BinaryDisposable::new(AnyDisposable::new(a.clone()), AnyDisposable::new(b.clone()));
    d.dispose();
    d.dispose();
    assert!(d.is_disposed());
    assert_eq!((a.count(), b.count()), (1, 1));
  }

  #[test]
  fn concurrent_dispose_releases_children_once() {
    for _ in 0..100 {
      let (a, b) = (CountingDisposable::default(), CountingDisposable::default());
      let d = Arc::new(BinaryDisposable::new(
        AnyDisposable::new(a.clone()),
        AnyDisposable::new(b.clone()),
      ));
      let barrier = Arc::new(Barrier::new(4));
      let handles: Vec<_> = (0..4)
        .map(|_| {
          let (d, barrier) = (d.clone(), barrier.clone());
          thread::spawn(move || {
            barrier.wait();
            d.dispose();
          })
        })
        .collect();
      handles.into_iter().for_each(|h| h.join().unwrap());

      assert!(d.is_disposed());
      assert_eq!((a.count(), b.count()), (1, 1));
    }
  }
}
