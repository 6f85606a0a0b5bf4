//! Prelude module for convenient imports

pub use crate::{
  bus::{Bus, BusBuilder, WeakBus},
  emitter::Emitter,
  error::BusError,
  fault::{Fault, ERROR, PANIC},
  kind::{Classified, Kind, Kinded},
  ops::Capture,
  router::{ErrorRouter, LogSink, Sink},
  scheduler::{Immediate, ManualScheduler, Scheduler, SchedulerRef, SerialScheduler, Task},
  source::Source,
  subscriber::{self, Subscriber},
  subscription::{Subscription, WeakSubscription},
};
#[cfg(feature = "futures-scheduler")]
pub use crate::scheduler::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
