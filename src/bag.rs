use std::{collections::HashMap, fmt};

use smallvec::SmallVec;

/// Number of pairs kept in the linear tier before spilling into a hash map.
pub const ARRAY_DICTIONARY_MAX_SIZE: usize = 30;

/// Opaque key of a value stored in a [`Bag`].
///
/// Keys are strictly increasing and never reused by the bag that issued
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BagKey(u64);

/// An unordered multi-value container keyed by [`BagKey`].
///
/// Optimized for subjects, which usually have zero or one observer:
///
/// - **Inline slot**: the first value lives directly in the struct.
/// - **Linear tier**: up to [`ARRAY_DICTIONARY_MAX_SIZE`] further pairs in a
///   `SmallVec`, searched linearly on removal.
/// - **Hash tier**: everything beyond that.
///
/// The tiers are an implementation detail; iteration order is unspecified.
/// Cloning produces an independent snapshot, which is how subjects iterate
/// observers without seeing mutations made during delivery.
///
/// # Examples
///
/// ```rust
/// use rxkit::bag::Bag;
///
/// let mut bag = Bag::new();
/// let first = bag.insert("a");
/// let second = bag.insert("b");
/// assert!(first < second);
///
/// assert_eq!(bag.remove_key(first), Some("a"));
/// assert_eq!(bag.remove_key(first), None);
/// assert_eq!(bag.count(), 1);
/// ```
#[derive(Clone)]
pub struct Bag<T> {
  next_key: u64,
  key0: Option<BagKey>,
  value0: Option<T>,
  pairs: SmallVec<[(BagKey, T); 4]>,
  dictionary: Option<HashMap<BagKey, T>>,
}

impl<T> Default for Bag<T> {
  fn default() -> Self {
    Self { next_key: 0, key0: None, value0: None, pairs: SmallVec::new(), dictionary: None }
  }
}

impl<T> Bag<T> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Inserts `value` and returns the key that removes it.
  pub fn insert(&mut self, value: T) -> BagKey {
    let key = BagKey(self.next_key);
    self.next_key = self.next_key.wrapping_add(1);

    if self.key0.is_none() {
      self.key0 = Some(key);
      self.value0 = Some(value);
      return key;
    }

    if self.pairs.len() < ARRAY_DICTIONARY_MAX_SIZE {
      self.pairs.push((key, value));
      return key;
    }

    self.dictionary.get_or_insert_with(HashMap::new).insert(key, value);
    key
  }

  /// Removes the value stored under `key`, if it is still present.
  pub fn remove_key(&mut self, key: BagKey) -> Option<T> {
    if self.key0 == Some(key) {
      self.key0 = None;
      return self.value0.take();
    }

    if let Some(value) = self.dictionary.as_mut().and_then(|d| d.remove(&key)) {
      return Some(value);
    }

    let pos = self.pairs.iter().position(|(k, _)| *k == key)?;
    Some(self.pairs.remove(pos).1)
  }

  /// Number of values in the bag.
  pub fn count(&self) -> usize {
    let dictionary = self.dictionary.as_ref().map_or(0, HashMap::len);
    usize::from(self.value0.is_some()) + self.pairs.len() + dictionary
  }

  #[inline]
  pub fn is_empty(&self) -> bool { self.count() == 0 }

  /// Removes every value, keeping the key sequence intact.
  pub fn remove_all(&mut self) {
    self.key0 = None;
    self.value0 = None;
    self.pairs.clear();
    if let Some(d) = self.dictionary.as_mut() {
      d.clear();
    }
  }

  /// Calls `action` with every value.
  pub fn for_each(&self, mut action: impl FnMut(&T)) {
    if let Some(value) = self.value0.as_ref() {
      action(value);
    }
    self.pairs.iter().for_each(|(_, value)| action(value));
    if let Some(d) = self.dictionary.as_ref() {
      d.values().for_each(action);
    }
  }

  /// Moves every value out of the bag.
  pub fn drain(&mut self) -> Vec<T> {
    let mut values = Vec::with_capacity(self.count());
    self.key0 = None;
    values.extend(self.value0.take());
    values.extend(self.pairs.drain(..).map(|(_, v)| v));
    if let Some(d) = self.dictionary.as_mut() {
      values.extend(d.drain().map(|(_, v)| v));
    }
    values
  }
}

impl<T> fmt::Debug for Bag<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Bag")
      .field("count", &self.count())
      .field("next_key", &self.next_key)
      .finish()
  }
}
