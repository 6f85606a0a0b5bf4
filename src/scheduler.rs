//! Schedulers: where units of work run.
//!
//! A [`Scheduler`] accepts a [`Task`] for eventual execution. Each bus has one
//! scheduler, its serialization domain: every change to its subscription list
//! and every emit fan-out runs as a task there. A scheduler used that way must
//! run tasks one at a time, in submission order. The crate cannot check this;
//! it is a contract on the scheduler handed to a bus.
//!
//! Subscriptions additionally dispatch to their subscriber on their own
//! scheduler, which has no such requirement.
//!
//! | Scheduler | FIFO, non-overlapping | Runs on |
//! |-----------|-----------------------|---------|
//! | [`Immediate`] | only with a single producer thread; re-entrant emits run nested | the calling thread |
//! | [`SerialScheduler`] | yes | one worker thread |
//! | [`ManualScheduler`] | yes | whoever calls `run_next`/`flush` |
//! | `ThreadPoolScheduler` | no | a `futures` thread pool |
//! | `TokioScheduler` | no | a tokio runtime |
//!
//! Any `Fn(Task) + Send + Sync` closure is a scheduler too.

use std::{
  fmt::{Debug, Formatter},
  sync::Arc,
};

mod immediate;
mod manual;
mod serial;
#[cfg(feature = "futures-scheduler")]
mod thread_pool_scheduler;
#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;

pub use immediate::Immediate;
pub use manual::ManualScheduler;
pub use serial::SerialScheduler;
#[cfg(feature = "futures-scheduler")]
pub use thread_pool_scheduler::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// A unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait Scheduler: Send + Sync {
  fn schedule(&self, task: Task);
}

impl<F> Scheduler for F
where
  F: Fn(Task) + Send + Sync,
{
  #[inline]
  fn schedule(&self, task: Task) { self(task) }
}

/// A shared, type-erased scheduler.
#[derive(Clone)]
pub struct SchedulerRef(Arc<dyn Scheduler>);

impl SchedulerRef {
  pub fn new(scheduler: impl Scheduler + 'static) -> Self { SchedulerRef(Arc::new(scheduler)) }

  #[inline]
  pub fn schedule(&self, task: Task) { self.0.schedule(task) }

  /// Whether both refer to the same scheduler instance.
  pub fn same(&self, other: &SchedulerRef) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

impl<S: Scheduler + 'static> From<S> for SchedulerRef {
  fn from(scheduler: S) -> Self { SchedulerRef::new(scheduler) }
}

impl Default for SchedulerRef {
  fn default() -> Self { SchedulerRef::new(Immediate) }
}

impl Debug for SchedulerRef {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("SchedulerRef").field(&Arc::as_ptr(&self.0)).finish()
  }
}
