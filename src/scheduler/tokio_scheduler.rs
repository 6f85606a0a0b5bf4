use tokio::runtime::Handle;

use super::{Scheduler, Task};

/// Spawns every task onto a tokio runtime.
///
/// Like [`ThreadPoolScheduler`](super::ThreadPoolScheduler) on a
/// multi-threaded runtime it gives no ordering guarantee.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
  handle: Handle,
}

impl TokioScheduler {
  pub fn new(handle: Handle) -> Self { TokioScheduler { handle } }

  /// The runtime the caller is running in.
  ///
  /// # Panics
  ///
  /// Outside of a tokio runtime.
  pub fn current() -> Self { Self::new(Handle::current()) }
}

impl Scheduler for TokioScheduler {
  fn schedule(&self, task: Task) {
    self.handle.spawn(async move { task() });
  }
}
