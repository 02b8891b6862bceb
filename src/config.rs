//! Runtime configuration for the background schedulers.
//!
//! Sentinel values:
//! - `stack_size = None` → the platform default stack size.
//! - `pool_size = None` → one worker per CPU for a concurrent queue. A serial
//!   queue always uses a single worker and ignores it.

/// Settings for the worker threads behind a queue scheduler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueConfig {
  /// Prefix for the worker thread's name, visible in debuggers and logs.
  pub name: String,

  /// Stack size of the worker thread in bytes.
  pub stack_size: Option<usize>,

  /// Number of workers of a concurrent queue.
  pub pool_size: Option<usize>,
}

impl Default for QueueConfig {
  fn default() -> Self { Self { name: "rxkit-serial".to_string(), stack_size: None, pool_size: None } }
}

impl QueueConfig {
  pub fn new(name: impl Into<String>) -> Self { Self { name: name.into(), ..Self::default() } }

  #[must_use]
  pub fn with_stack_size(mut self, bytes: usize) -> Self {
    self.stack_size = Some(bytes);
    self
  }

  #[must_use]
  pub fn with_pool_size(mut self, workers: usize) -> Self {
    self.pool_size = Some(workers);
    self
  }

  /// Worker count for a concurrent queue, never zero.
  pub fn workers(&self) -> usize {
    self
      .pool_size
      .or_else(|| std::thread::available_parallelism().ok().map(usize::from))
      .unwrap_or(1)
      .max(1)
  }

  /// Thread name prefix as handed to the worker pool.
  pub fn thread_name_prefix(&self) -> String { format!("{}-", self.name) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults() {
    let config = QueueConfig::default();
    assert_eq!(config.name, "rxkit-serial");
    assert_eq!(config.stack_size, None);
    assert_eq!(config.pool_size, None);
    assert!(config.workers() >= 1);
    assert_eq!(config.thread_name_prefix(), "rxkit-serial-");
  }

  #[test]
  fn builder_overrides() {
    let config = QueueConfig::new("ui-bindings").with_stack_size(1 << 20).with_pool_size(3);
    assert_eq!(
      config,
      QueueConfig { name: "ui-bindings".into(), stack_size: Some(1 << 20), pool_size: Some(3) }
    );
    assert_eq!(config.workers(), 3);
  }

  #[test]
  fn zero_workers_is_raised_to_one() {
    assert_eq!(QueueConfig::default().with_pool_size(0).workers(), 1);
  }
}
