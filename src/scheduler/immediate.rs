use super::{Action, Scheduler};
use crate::disposable::AnyDisposable;

/// Runs every action inline, on the calling thread, before `schedule`
/// returns.
///
/// Recursive scheduling on this scheduler nests real calls; prefer
/// [`CurrentThreadScheduler`](super::CurrentThreadScheduler) for unbounded
/// recursion.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  #[inline]
  fn schedule_action(&self, action: Action) -> AnyDisposable { action() }
}
