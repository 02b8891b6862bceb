use crate::error::RxError;

/// A single notification of a sequence.
///
/// Every sequence follows the grammar `next* (error | completed)?`: any
/// number of `Next` values, optionally terminated by exactly one stop event.
#[derive(Debug, Clone)]
pub enum Event<T> {
  /// Next element is produced.
  Next(T),
  /// Sequence terminated with an error.
  Error(RxError),
  /// Sequence completed successfully.
  Completed,
}

impl<T> Event<T> {
  /// Is `Completed` or `Error`.
  #[inline]
  pub fn is_stop_event(&self) -> bool { !matches!(self, Event::Next(_)) }

  #[inline]
  pub fn is_completed(&self) -> bool { matches!(self, Event::Completed) }

  /// The element of a `Next` event.
  #[inline]
  pub fn element(&self) -> Option<&T> {
    match self {
      Event::Next(value) => Some(value),
      _ => None,
    }
  }

  /// The error of an `Error` event.
  #[inline]
  pub fn error(&self) -> Option<&RxError> {
    match self {
      Event::Error(err) => Some(err),
      _ => None,
    }
  }

  /// Maps the element of a `Next` event, leaving stop events untouched.
  pub fn map<R>(self, f: impl FnOnce(T) -> R) -> Event<R> {
    match self {
      Event::Next(value) => Event::Next(f(value)),
      Event::Error(err) => Event::Error(err),
      Event::Completed => Event::Completed,
    }
  }

  /// Like [`Event::map`] but a failing transform turns into an `Error` event.
  pub fn try_map<R>(self, f: impl FnOnce(T) -> Result<R, RxError>) -> Event<R> {
    match self {
      Event::Next(value) => match f(value) {
        Ok(value) => Event::Next(value),
        Err(err) => Event::Error(err),
      },
      Event::Error(err) => Event::Error(err),
      Event::Completed => Event::Completed,
    }
  }

  /// Converts the stop event of one element type into another.
  ///
  /// Returns the original `Next` value in `Err` when called on a `Next`.
  pub fn into_stop<R>(self) -> Result<Event<R>, T> {
    match self {
      Event::Next(value) => Err(value),
      Event::Error(err) => Ok(Event::Error(err)),
      Event::Completed => Ok(Event::Completed),
    }
  }
}
