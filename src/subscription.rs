//! The live link between a subscriber and a bus.

use std::{
  error::Error,
  fmt::{Debug, Formatter},
  panic::{catch_unwind, AssertUnwindSafe},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Weak,
  },
};

mod subscriptions;

pub(crate) use subscriptions::Subscriptions;

use crate::{
  bus::BusCore,
  error::BusError,
  fault::Fault,
  kind::{Classified, Kind},
  router::ErrorRouter,
  scheduler::SchedulerRef,
  subscriber::Subscriber,
};

/// Handle returned by `subscribe`.
///
/// Clones refer to the same subscription. Holding one does not keep the bus
/// alive, and dropping every handle does not cancel: the bus keeps
/// delivering until [`cancel`](Subscription::cancel) is called or the bus
/// goes away.
pub struct Subscription<T>(Arc<SubscriptionCore<T>>);

struct SubscriptionCore<T> {
  id: usize,
  subscriber: Arc<dyn Subscriber<T>>,
  scheduler: SchedulerRef,
  bus: Weak<BusCore<T>>,
  cancelled: AtomicBool,
  router: ErrorRouter,
}

impl<T: Send + 'static> Subscription<T> {
  pub(crate) fn new(
    id: usize,
    subscriber: Arc<dyn Subscriber<T>>,
    scheduler: SchedulerRef,
    bus: Weak<BusCore<T>>,
    router: ErrorRouter,
  ) -> Self {
    Subscription(Arc::new(SubscriptionCore {
      id,
      subscriber,
      scheduler,
      bus,
      cancelled: AtomicBool::new(false),
      router,
    }))
  }

  /// Identifier unique within the owning bus.
  #[inline]
  pub fn id(&self) -> usize { self.0.id }

  #[inline]
  pub fn is_cancelled(&self) -> bool { self.0.cancelled.load(Ordering::Acquire) }

  /// Hand `event` to the subscriber on this subscription's scheduler.
  ///
  /// A subscriber that returns an error or panics has its fault routed
  /// through this subscription's router. Nothing is reported back here.
  ///
  /// # Errors
  ///
  /// [`BusError::Cancelled`] if the subscription was already cancelled.
  pub fn deliver(&self, event: T) -> Result<(), BusError> {
    if self.is_cancelled() {
      return Err(BusError::Cancelled { id: self.0.id });
    }
    let this = self.clone();
    self.0.scheduler.schedule(Box::new(move || this.dispatch(event)));
    Ok(())
  }

  fn dispatch(&self, event: T) {
    let outcome = catch_unwind(AssertUnwindSafe(|| self.0.subscriber.accept(event, self)));
    let fault = match outcome {
      Ok(Ok(())) => return,
      Ok(Err(fault)) => fault,
      Err(payload) => Fault::from_panic(payload),
    };
    self.0.router.route(fault);
  }

  /// Ask the bus to drop this subscription.
  ///
  /// Removal happens on the bus's scheduler, so a delivery that is already
  /// scheduled may still arrive. Returns `true` if this call cancelled the
  /// subscription and `false` if it was cancelled before.
  pub fn cancel(&self) -> bool {
    if self.0.cancelled.swap(true, Ordering::AcqRel) {
      return false;
    }
    if let Some(bus) = self.0.bus.upgrade() {
      bus.unsubscribe(self.0.id);
    }
    true
  }

  /// Handle faults assignable to `kind` raised by this subscription's
  /// subscriber, before the bus-level handlers see them.
  pub fn error(
    &self,
    kind: &'static Kind,
    handler: impl Fn(&Fault) + Send + Sync + 'static,
  ) -> &Self {
    self.0.router.on(kind, handler);
    self
  }

  /// Typed form of [`error`](Subscription::error).
  pub fn on_error<E>(&self, handler: impl Fn(&E) + Send + Sync + 'static) -> &Self
  where
    E: Classified + Error,
  {
    self.0.router.on_error::<E>(handler);
    self
  }

  /// A handle that does not keep the subscription's state alive.
  pub fn downgrade(&self) -> WeakSubscription<T> { WeakSubscription(Arc::downgrade(&self.0)) }
}

impl<T> Clone for Subscription<T> {
  fn clone(&self) -> Self { Subscription(self.0.clone()) }
}

impl<T> PartialEq for Subscription<T> {
  fn eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

impl<T> Eq for Subscription<T> {}

impl<T> Debug for Subscription<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("id", &self.0.id)
      .field("cancelled", &self.0.cancelled.load(Ordering::Relaxed))
      .finish()
  }
}

/// A non-owning [`Subscription`] handle.
pub struct WeakSubscription<T>(Weak<SubscriptionCore<T>>);

impl<T: Send + 'static> WeakSubscription<T> {
  pub fn upgrade(&self) -> Option<Subscription<T>> { self.0.upgrade().map(Subscription) }

  /// Cancel the subscription if it still exists. See [`Subscription::cancel`].
  pub fn cancel(&self) -> bool { self.upgrade().map_or(false, |s| s.cancel()) }
}

impl<T> Clone for WeakSubscription<T> {
  fn clone(&self) -> Self { WeakSubscription(self.0.clone()) }
}
