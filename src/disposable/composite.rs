use parking_lot::Mutex;

use super::{AnyDisposable, Cancelable, Disposable};
use crate::bag::{Bag, BagKey};

/// Key returned by [`CompositeDisposable::insert`].
pub type DisposeKey = BagKey;

/// A group of disposables that are disposed together.
///
/// `None` in the state marks the group as disposed; from then on every
/// inserted disposable is disposed immediately.
pub struct CompositeDisposable {
  disposables: Mutex<Option<Bag<AnyDisposable>>>,
}

impl Default for CompositeDisposable {
  fn default() -> Self { Self { disposables: Mutex::new(Some(Bag::new())) } }
}

impl CompositeDisposable {
  pub fn new() -> Self { Self::default() }

  /// A group that already owns `disposables`.
  pub fn from_disposables(disposables: impl IntoIterator<Item = AnyDisposable>) -> Self {
    let mut bag = Bag::new();
    disposables.into_iter().for_each(|d| {
      bag.insert(d);
    });
    Self { disposables: Mutex::new(Some(bag)) }
  }

  /// Adds `disposable` to the group.
  ///
  /// Returns `None` when the group is already disposed, in which case
  /// `disposable` has been disposed before returning.
  pub fn insert(&self, disposable: AnyDisposable) -> Option<DisposeKey> {
    let rejected = {
      let mut disposables = self.disposables.lock();
      match disposables.as_mut() {
        Some(bag) => return Some(bag.insert(disposable)),
        None => disposable,
      }
    };
    rejected.dispose();
    None
  }

  /// Removes the disposable stored under `key` and disposes it.
  ///
  /// Removing an unknown or already removed key does nothing.
  pub fn remove(&self, key: DisposeKey) {
    let removed = self.disposables.lock().as_mut().and_then(|bag| bag.remove_key(key));
    if let Some(removed) = removed {
      removed.dispose();
    }
  }

  /// Number of disposables currently in the group.
  pub fn count(&self) -> usize { self.disposables.lock().as_ref().map_or(0, Bag::count) }
}

impl Disposable for CompositeDisposable {
  fn dispose(&self) {
    let disposables = self.disposables.lock().take();
    if let Some(mut bag) = disposables {
      bag.drain().into_iter().for_each(|d| d.dispose());
    }
  }
}

impl Cancelable for CompositeDisposable {
  fn is_disposed(&self) -> bool { self.disposables.lock().is_none() }
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
  fn remove_disposes_child_once() {
    let child = CountingDisposable::default();
    let group = CompositeDisposable::new();
    let key = group.insert(AnyDisposable::new(child.clone())).unwrap();
    assert_eq!(group.count(), 1);

    group.remove(key);
    group.remove(key);
    assert_eq!(child.count(), 1);
    assert_eq!(group.count(), 0);
  }

  #[test]
  fn dispose_releases_all_children() {
    let children: Vec<_> = (0..40).map(|_| CountingDisposable::default()).collect();
    let group =
      CompositeDisposable::from_disposables(children.iter().map(|c| AnyDisposable::new(c.clone())));
    assert_eq!(group.count(), 40);

    group.dispose();
    group.dispose();
    assert!(group.is_disposed());
    assert!(children.iter().all(|c| c.count() == 1));
  }

  #[test]
  fn insert_after_dispose_disposes_immediately() {
    let late = CountingDisposable::default();
    let group = CompositeDisposable::new();
    group.dispose();
    assert!(group.insert(AnyDisposable::new(late.clone())).is_none());
    assert_eq!(late.count(), 1);
    assert_eq!(group.count(), 0);
  }

  #[test]
  fn racing_dispose_remove_and_insert_release_each_child_once() {
    for _ in 0..100 {
      let group = Arc::new(CompositeDisposable::new());
      let kept: Vec<_> = (0..8).map(|_| CountingDisposable::default()).collect();
      let keys: Vec<_> =
        kept.iter().map(|c| group.insert(AnyDisposable::new(c.clone())).unwrap()).collect();
      let late = CountingDisposable::default();
      let barrier = Arc::new(Barrier::new(5));

      let mut handles = vec![];
      for _ in 0..3 {
        let (group, barrier) = (group.clone(), barrier.clone());
        handles.push(thread::spawn(move || {
          barrier.wait();
          group.dispose();
        }));
      }
      {
        let (group, barrier) = (group.clone(), barrier.clone());
        handles.push(thread::spawn(move || {
          barrier.wait();
          keys.into_iter().for_each(|key| group.remove(key));
        }));
      }
      {
        let (group, barrier, late) = (group.clone(), barrier.clone(), late.clone());
        handles.push(thread::spawn(move || {
          barrier.wait();
          group.insert(AnyDisposable::new(late));
        }));
      }
      handles.into_iter().for_each(|h| h.join().unwrap());

      assert!(group.is_disposed());
      assert_eq!(group.count(), 0);
      assert!(kept.iter().all(|c| c.count() == 1));
      assert_eq!(late.count(), 1);
    }
  }
}
