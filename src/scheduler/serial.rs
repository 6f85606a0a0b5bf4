use std::{
  panic::{catch_unwind, AssertUnwindSafe},
  sync::{mpsc, Arc},
  thread::{self, JoinHandle, ThreadId},
};

use parking_lot::Mutex;

use super::{Scheduler, Task};

/// Runs tasks one at a time, in submission order, on a dedicated thread.
///
/// The thread lives as long as any clone of the scheduler. A panicking task
/// is logged and does not stop the worker.
#[derive(Clone)]
pub struct SerialScheduler {
  worker: Arc<Worker>,
}

struct Worker {
  sender: Mutex<Option<mpsc::Sender<Task>>>,
  thread: Mutex<Option<JoinHandle<()>>>,
  thread_id: ThreadId,
}

impl SerialScheduler {
  pub fn new() -> std::io::Result<Self> { Self::named("eventbus-serial") }

  /// A scheduler whose worker thread carries `name`.
  pub fn named(name: impl Into<String>) -> std::io::Result<Self> {
    let (sender, receiver) = mpsc::channel::<Task>();
    let thread = thread::Builder::new()
      .name(name.into())
      .spawn(move || {
        for task in receiver {
          if catch_unwind(AssertUnwindSafe(task)).is_err() {
            tracing::error!("task panicked on serial scheduler");
          }
        }
      })?;
    let thread_id = thread.thread().id();

    Ok(SerialScheduler {
      worker: Arc::new(Worker {
        sender: Mutex::new(Some(sender)),
        thread: Mutex::new(Some(thread)),
        thread_id,
      }),
    })
  }

  /// Whether the caller is running on this scheduler's worker thread.
  pub fn is_current(&self) -> bool { thread::current().id() == self.worker.thread_id }
}

impl Scheduler for SerialScheduler {
  fn schedule(&self, task: Task) {
    let sender = self.worker.sender.lock();
    let sent = sender.as_ref().map(|s| s.send(task).is_ok());
    if sent != Some(true) {
      tracing::warn!("serial scheduler is shut down, task dropped");
    }
  }
}

impl Drop for Worker {
  fn drop(&mut self) {
    // Closing the channel ends the worker loop once the queue is drained.
    self.sender.get_mut().take();
    if let Some(thread) = self.thread.get_mut().take() {
      // The last handle can be dropped by a task on the worker itself.
      if thread::current().id() != self.thread_id && thread.join().is_err() {
        tracing::error!("serial scheduler worker panicked");
      }
    }
  }
}
