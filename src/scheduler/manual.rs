use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;

use super::{Scheduler, Task};

/// Queues tasks until told to run them.
///
/// Tasks run in submission order on the thread calling [`run_next`] or
/// [`flush`]. Useful to observe the asynchronous steps of a bus one at a
/// time. Clones share the same queue.
///
/// [`run_next`]: ManualScheduler::run_next
/// [`flush`]: ManualScheduler::flush
#[derive(Clone, Default)]
pub struct ManualScheduler {
  queue: Arc<Mutex<VecDeque<Task>>>,
}

impl ManualScheduler {
  pub fn new() -> Self { Self::default() }

  /// Number of tasks waiting to run.
  pub fn pending_count(&self) -> usize { self.queue.lock().len() }

  /// Run the oldest pending task. Returns `false` if there was none.
  pub fn run_next(&self) -> bool {
    // The lock is released before running; tasks schedule more tasks.
    let task = self.queue.lock().pop_front();
    match task {
      Some(task) => {
        task();
        true
      }
      None => false,
    }
  }

  /// Run tasks until the queue is empty, including tasks scheduled while
  /// flushing. Returns how many ran.
  pub fn flush(&self) -> usize {
    let mut ran = 0;
    while self.run_next() {
      ran += 1;
    }
    ran
  }
}

impl Scheduler for ManualScheduler {
  fn schedule(&self, task: Task) { self.queue.lock().push_back(task); }
}
