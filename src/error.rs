//! Error types carried by sequences, and the policy for programming errors.
//!
//! Two kinds of failure exist in the engine:
//!
//! - [`RxError`]: a *sequence* error. It travels downstream as
//!   [`Event::Error`](crate::event::Event::Error), terminates the subscription
//!   it is delivered on, and is never raised across the `subscribe` boundary.
//! - Programming errors (contract violations such as assigning a
//!   single-assignment disposable twice). These go through [`fatal_error`]:
//!   a panic in debug builds, a logged no-op in release builds.

use std::{fmt, sync::Arc};

use thiserror::Error;

/// # Errors delivered through `Event::Error`.
///
/// The type is cheap to clone so subjects can replay the same error to every
/// observer.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum RxError {
  /// The object was used after it was disposed.
  #[error("object `{object}` was already disposed")]
  Disposed {
    /// Type name of the disposed object.
    object: &'static str,
  },

  /// An integer operator would have overflowed.
  #[error("arithmetic overflow")]
  Overflow,

  /// An argument was outside of its valid range.
  #[error("argument out of range")]
  ArgumentOutOfRange,

  /// The sequence produced no elements when at least one was required.
  #[error("sequence contains no elements")]
  NoElements,

  /// The sequence timed out.
  #[error("sequence timeout")]
  Timeout,

  /// A plain message raised by user code.
  #[error("{0}")]
  Message(String),

  /// Any other error raised by user code.
  #[error(transparent)]
  Custom(Arc<dyn std::error::Error + Send + Sync>),
}

impl RxError {
  /// Wraps an arbitrary error raised by user code.
  pub fn custom(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    RxError::Custom(Arc::new(err))
  }

  /// Builds an error from a message.
  pub fn msg(message: impl Into<String>) -> Self { RxError::Message(message.into()) }

  /// Returns a short stable label (snake_case) for use in logs.
  ///
  /// # Example
  /// ```
  /// use rxkit::error::RxError;
  ///
  /// assert_eq!(RxError::Overflow.as_label(), "overflow");
  /// assert_eq!(RxError::msg("boom").as_label(), "message");
  /// ```
  pub fn as_label(&self) -> &'static str {
    match self {
      RxError::Disposed { .. } => "disposed",
      RxError::Overflow => "overflow",
      RxError::ArgumentOutOfRange => "argument_out_of_range",
      RxError::NoElements => "no_elements",
      RxError::Timeout => "timeout",
      RxError::Message(_) => "message",
      RxError::Custom(_) => "custom",
    }
  }
}

/// Reports a broken contract.
///
/// Debug builds panic with `message`; release builds log it through
/// `tracing::error!` and return so the caller can continue as a no-op.
#[track_caller]
pub fn fatal_error(message: impl fmt::Display) {
  if cfg!(debug_assertions) {
    panic!("fatal error: {message}");
  } else {
    let location = std::panic::Location::caller();
    tracing::error!(%location, "fatal error: {message}");
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_messages() {
    assert_eq!(
      RxError::Disposed { object: "PublishSubject" }.to_string(),
      "object `PublishSubject` was already disposed"
    );
    assert_eq!(RxError::msg("boom").to_string(), "boom");

    let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
    assert_eq!(RxError::custom(io).to_string(), "disk gone");
  }

  #[test]
  fn labels_are_stable() {
    assert_eq!(RxError::ArgumentOutOfRange.as_label(), "argument_out_of_range");
    assert_eq!(RxError::Disposed { object: "x" }.as_label(), "disposed");
    assert_eq!(RxError::Timeout.as_label(), "timeout");
  }

  #[test]
  fn clones_share_custom_source() {
    let err = RxError::custom(std::fmt::Error);
    let cloned = err.clone();
    match (err, cloned) {
      (RxError::Custom(a), RxError::Custom(b)) => assert!(Arc::ptr_eq(&a, &b)),
      _ => unreachable!(),
    }
  }

  #[cfg(debug_assertions)]
  #[test]
  #[should_panic(expected = "fatal error: broken")]
  fn fatal_error_panics_in_debug() { fatal_error("broken"); }
}
