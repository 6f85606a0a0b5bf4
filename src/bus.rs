//! The hub: an emitter and a source for one event type.
//!
//! A [`Bus`] keeps an ordered list of subscriptions and a scheduler. Every
//! change to that list and every fan-out of an emitted event runs as a task
//! on the scheduler, so with a FIFO, non-overlapping scheduler the relative
//! order of `subscribe`, `cancel` and `emit` calls is preserved.
//!
//! A bus has no `close`. It goes away when the last strong reference does:
//! user clones, tasks still queued on its scheduler, and operators upstream
//! of it that currently have a reason to keep it.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use eventbus::prelude::*;
//!
//! let bus = Bus::immediate();
//! let seen = Arc::new(Mutex::new(vec![]));
//! let c_seen = seen.clone();
//!
//! bus
//!   .filter(|v: &i32| v % 2 == 0)
//!   .map(|v| v * 10)
//!   .consume(move |v| c_seen.lock().unwrap().push(v));
//! (1..=4).for_each(|v| bus.emit(v));
//!
//! assert_eq!(*seen.lock().unwrap(), vec![20, 40]);
//! ```

use std::{
  fmt::{Debug, Formatter},
  marker::PhantomData,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Weak,
  },
};

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::{
  emitter::Emitter,
  fault::Fault,
  kind::Kind,
  ops::{forwarding::Forwarding, map::MapStep},
  router::{ErrorRouter, LogSink, Sink, SinkRef},
  scheduler::{Immediate, SchedulerRef},
  source::Source,
  subscriber::Subscriber,
  subscription::{Subscription, Subscriptions},
};

/// A typed event bus. Cloning shares the bus.
pub struct Bus<T>(pub(crate) Arc<BusCore<T>>);

pub(crate) struct BusCore<T> {
  me: Weak<BusCore<T>>,
  name: Option<String>,
  scheduler: SchedulerRef,
  sink: SinkRef,
  router: ErrorRouter,
  subscriptions: Mutex<Subscriptions<Subscription<T>>>,
  next_id: AtomicUsize,
}

impl<T: Send + 'static> BusCore<T> {
  fn new(scheduler: SchedulerRef, sink: SinkRef, name: Option<String>) -> Arc<Self> {
    Arc::new_cyclic(|me| BusCore {
      me: me.clone(),
      name,
      scheduler,
      router: ErrorRouter::with_sink(sink.clone()),
      sink,
      subscriptions: Mutex::default(),
      next_id: AtomicUsize::new(0),
    })
  }

  /// Run `task` on the bus scheduler. The task owns a strong reference, so
  /// the bus outlives its queued work.
  fn enqueue(&self, task: impl FnOnce(&BusCore<T>) + Send + 'static) {
    if let Some(me) = self.me.upgrade() {
      self.scheduler.schedule(Box::new(move || task(&*me)));
    }
  }

  pub(crate) fn subscribe_on(
    &self,
    subscriber: Arc<dyn Subscriber<T>>,
    scheduler: SchedulerRef,
  ) -> Subscription<T> {
    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    let subscription =
      Subscription::new(id, subscriber, scheduler, self.me.clone(), self.router.fork());
    let pending = subscription.clone();
    self.enqueue(move |bus| bus.add(pending));
    subscription
  }

  fn add(&self, subscription: Subscription<T>) {
    let id = subscription.id();
    let mut subscriptions = self.subscriptions.lock();
    // Checked under the lock: a cancel that set the flag later finds the
    // entry when its remove task runs.
    if subscription.is_cancelled() {
      drop(subscriptions);
      tracing::debug!(bus = self.name.as_deref(), id, "skip adding cancelled subscription");
      return;
    }
    subscriptions.insert(id, subscription);
    drop(subscriptions);
    tracing::debug!(bus = self.name.as_deref(), id, "subscribed");
  }

  pub(crate) fn unsubscribe(&self, id: usize) {
    self.enqueue(move |bus| {
      if bus.subscriptions.lock().remove(id).is_some() {
        tracing::debug!(bus = bus.name.as_deref(), id, "unsubscribed");
      }
    });
  }

  fn has_subscribers(&self) -> bool { !self.subscriptions.lock().is_empty() }
}

impl<T: Clone + Send + 'static> BusCore<T> {
  fn fan_out(&self, event: T) {
    // Deliver outside the lock; subscribers may subscribe or cancel.
    let targets: SmallVec<[Subscription<T>; 4]> = self
      .subscriptions
      .lock()
      .iter()
      .filter(|s| !s.is_cancelled())
      .cloned()
      .collect();
    tracing::trace!(bus = self.name.as_deref(), subscribers = targets.len(), "emit");

    // The last subscription takes the event itself.
    if let Some((last, rest)) = targets.split_last() {
      for subscription in rest {
        self.deliver_to(subscription, event.clone());
      }
      self.deliver_to(last, event);
    }
  }

  fn deliver_to(&self, subscription: &Subscription<T>, event: T) {
    if let Err(err) = subscription.deliver(event) {
      tracing::warn!(bus = self.name.as_deref(), error = %err, "delivery raced a cancel");
    }
  }
}

impl<T: Clone + Send + 'static> Emitter<T> for BusCore<T> {
  fn emit(&self, event: T) { self.enqueue(move |bus| bus.fan_out(event)); }

  fn raise(&self, fault: Fault) { self.router.route(fault); }

  fn has_subscribers(&self) -> bool { BusCore::has_subscribers(self) }
}

impl<T: Clone + Send + 'static> Bus<T> {
  /// A bus that serializes its work on `scheduler`.
  pub fn new(scheduler: impl Into<SchedulerRef>) -> Self {
    Self::builder().scheduler(scheduler).build()
  }

  /// A bus that does all its work on the calling thread.
  pub fn immediate() -> Self { Self::new(Immediate) }

  pub fn builder() -> BusBuilder<T> { BusBuilder::default() }

  /// Enqueue `event` for every subscriber present when the fan-out runs.
  #[inline]
  pub fn emit(&self, event: T) { self.0.emit(event) }

  /// Route `fault` through this bus's handlers.
  #[inline]
  pub fn raise(&self, fault: Fault) { self.0.raise(fault) }

  /// Whether any subscription has been added. Lags behind `subscribe` until
  /// the add task has run on the bus scheduler.
  #[inline]
  pub fn has_subscribers(&self) -> bool { self.0.has_subscribers() }

  pub fn subscriber_count(&self) -> usize { self.0.subscriptions.lock().len() }

  pub fn name(&self) -> Option<&str> { self.0.name.as_deref() }

  pub fn downgrade(&self) -> WeakBus<T> { WeakBus(Arc::downgrade(&self.0)) }

  /// An emitter of `F` whose events are converted with `f` and emitted here.
  ///
  /// The adapter runs on the calling thread. Failures of `f` are routed
  /// through the adapter's own handlers, and the adapter never keeps this
  /// bus alive once it has no subscribers.
  pub fn demap<F>(&self, f: impl Fn(F) -> T + Send + Sync + 'static) -> Bus<F>
  where
    F: Clone + Send + 'static,
  {
    let adapter = Bus::<F>::builder().shared_sink(self.default_sink()).build();
    let target: Arc<dyn Emitter<T>> = self.0.clone();
    adapter.subscribe(Forwarding::new(target, MapStep::new(f)));
    adapter
  }
}

impl<T: Clone + Send + 'static> Source<T> for Bus<T> {
  fn scheduler(&self) -> SchedulerRef { self.0.scheduler.clone() }

  fn default_sink(&self) -> SinkRef { self.0.sink.clone() }

  fn subscribe_on(
    &self,
    subscriber: impl Subscriber<T> + 'static,
    scheduler: impl Into<SchedulerRef>,
  ) -> Subscription<T> {
    self.0.subscribe_on(Arc::new(subscriber), scheduler.into())
  }

  fn error(
    &self,
    kind: &'static Kind,
    handler: impl Fn(&Fault) + Send + Sync + 'static,
  ) -> &Self {
    self.0.router.on(kind, handler);
    self
  }
}

impl<T: Clone + Send + 'static> Emitter<T> for Bus<T> {
  fn emit(&self, event: T) { self.0.emit(event) }

  fn raise(&self, fault: Fault) { self.0.raise(fault) }

  fn has_subscribers(&self) -> bool { self.0.has_subscribers() }
}

impl<T> Clone for Bus<T> {
  fn clone(&self) -> Self { Bus(self.0.clone()) }
}

impl<T: Clone + Send + 'static> Default for Bus<T> {
  fn default() -> Self { Self::immediate() }
}

impl<T> Debug for Bus<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Bus")
      .field("name", &self.0.name)
      .field("scheduler", &self.0.scheduler)
      .field("subscribers", &self.0.subscriptions.lock().len())
      .finish()
  }
}

/// Configures a [`Bus`] before creating it.
///
/// ```rust
/// use eventbus::{bus::Bus, fault::Fault, scheduler::ManualScheduler};
///
/// let scheduler = ManualScheduler::new();
/// let bus: Bus<u32> = Bus::builder()
///   .name("orders")
///   .scheduler(scheduler.clone())
///   .default_sink(|fault: &Fault| eprintln!("dropped: {fault}"))
///   .build();
///
/// assert_eq!(bus.name(), Some("orders"));
/// ```
pub struct BusBuilder<T> {
  scheduler: Option<SchedulerRef>,
  sink: Option<SinkRef>,
  name: Option<String>,
  _event: PhantomData<fn(T)>,
}

impl<T> Default for BusBuilder<T> {
  fn default() -> Self {
    BusBuilder { scheduler: None, sink: None, name: None, _event: PhantomData }
  }
}

impl<T: Clone + Send + 'static> BusBuilder<T> {
  /// Where the bus serializes its work. Defaults to [`Immediate`].
  pub fn scheduler(mut self, scheduler: impl Into<SchedulerRef>) -> Self {
    self.scheduler = Some(scheduler.into());
    self
  }

  /// Receives faults no handler claimed. Defaults to [`LogSink`].
  pub fn default_sink(mut self, sink: impl Sink + 'static) -> Self {
    self.sink = Some(Arc::new(sink));
    self
  }

  pub(crate) fn shared_sink(mut self, sink: SinkRef) -> Self {
    self.sink = Some(sink);
    self
  }

  /// Name reported in log events.
  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn build(self) -> Bus<T> {
    let scheduler = self.scheduler.unwrap_or_default();
    let sink = self.sink.unwrap_or_else(|| Arc::new(LogSink));
    Bus(BusCore::new(scheduler, sink, self.name))
  }
}

/// A non-owning [`Bus`] handle.
pub struct WeakBus<T>(Weak<BusCore<T>>);

impl<T> WeakBus<T> {
  pub fn upgrade(&self) -> Option<Bus<T>> { self.0.upgrade().map(Bus) }

  /// Whether the bus has been released.
  pub fn is_reclaimed(&self) -> bool { self.0.strong_count() == 0 }
}

impl<T> Clone for WeakBus<T> {
  fn clone(&self) -> Self { WeakBus(self.0.clone()) }
}
