use parking_lot::Mutex;

use super::{AnyDisposable, Cancelable, Disposable};

#[derive(Default)]
struct SerialState {
  current: Option<AnyDisposable>,
  disposed: bool,
}

/// Holds a replaceable inner disposable.
///
/// Assigning a new disposable disposes the previous one. Once the serial
/// disposable itself is disposed, the current disposable and every later
/// assignment are disposed immediately.
#[derive(Default)]
pub struct SerialDisposable {
  state: Mutex<SerialState>,
}

impl SerialDisposable {
  pub fn new() -> Self { Self::default() }

  /// The current inner disposable.
  pub fn disposable(&self) -> AnyDisposable { self.state.lock().current.clone().unwrap_or_default() }

  /// Replaces the inner disposable and disposes the previous one.
  pub fn set_disposable(&self, disposable: AnyDisposable) {
    let stale = {
      let mut state = self.state.lock();
      if state.disposed {
        Some(disposable)
      } else {
        state.current.replace(disposable)
      }
    };
    if let Some(stale) = stale {
      stale.dispose();
    }
  }
}

impl Disposable for SerialDisposable {
  fn dispose(&self) {
    let current = {
      let mut state = self.state.lock();
      if state.disposed {
        return;
      }
      state.disposed = true;
      state.current.take()
    };
    if let Some(current) = current {
      current.dispose();
    }
  }
}

impl Cancelable for SerialDisposable {
  fn is_disposed(&self) -> bool { self.state.lock().disposed }
}
