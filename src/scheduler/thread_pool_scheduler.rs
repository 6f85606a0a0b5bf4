use futures::executor::ThreadPool;

use super::{Scheduler, Task};

/// Spawns every task onto a `futures` thread pool.
///
/// Tasks may run concurrently and out of order, so this scheduler suits
/// subscription dispatch but not a bus's own serialization domain.
#[derive(Clone)]
pub struct ThreadPoolScheduler {
  pool: ThreadPool,
}

impl ThreadPoolScheduler {
  pub fn new() -> std::io::Result<Self> { ThreadPool::new().map(Self::from_pool) }

  pub fn from_pool(pool: ThreadPool) -> Self { ThreadPoolScheduler { pool } }
}

impl Scheduler for ThreadPoolScheduler {
  fn schedule(&self, task: Task) { self.pool.spawn_ok(async move { task() }); }
}
