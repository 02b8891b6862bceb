use crate::{
  disposable::AnyDisposable,
  observable::{Observable, ObservableType},
  observer::{AnyObserver, Observer},
};

struct StartWith<T> {
  source: Observable<T>,
  values: Vec<T>,
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
  /// Emits `values` to every subscriber before the items of the source.
  ///
  /// ```rust
  /// use std::sync::{Arc, Mutex};
  ///
  /// use rxkit::prelude::*;
  ///
  /// let seen = Arc::new(Mutex::new(vec![]));
  /// let c_seen = seen.clone();
  /// Observable::of(vec![3, 4])
  ///   .start_with(vec![1, 2])
  ///   .subscribe_next(move |v| c_seen.lock().unwrap().push(v));
  ///
  /// assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4]);
  /// ```
  pub fn start_with(self, values: impl IntoIterator<Item = T>) -> Self {
    Observable::new(StartWith { source: self, values: values.into_iter().collect() })
  }
}

impl<T: Clone + Send + Sync + 'static> ObservableType<T> for StartWith<T> {
  fn subscribe_observer(&self, observer: AnyObserver<T>) -> AnyDisposable {
    self.values.iter().for_each(|value| observer.on_next(value.clone()));
    self.source.subscribe_observer(observer)
  }
}
