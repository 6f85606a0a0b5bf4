use super::{Scheduler, Task};

/// Runs every task on the calling thread, right away.
///
/// A task scheduled from inside another task runs nested, before the outer
/// task resumes. Tasks scheduled from several threads run concurrently, so a
/// bus on `Immediate` with producers on more than one thread has no single
/// serialization domain.
#[derive(Clone, Copy, Debug, Default)]
pub struct Immediate;

impl Scheduler for Immediate {
  #[inline]
  fn schedule(&self, task: Task) { task() }
}
