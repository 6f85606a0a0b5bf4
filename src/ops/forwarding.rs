//! The subscriber every forwarding operator is built on.
//!
//! A [`Forwarding`] subscriber holds its downstream emitter through a
//! [`LifetimeHandle`] and decides, per event, how strongly to hold it:
//!
//! 1. downstream already released: cancel the upstream subscription;
//! 2. downstream has subscribers: hold it strongly and run the step;
//! 3. otherwise: hold it weakly and drop the event.
//!
//! An operator's output therefore lives exactly as long as someone consumes
//! it, even though nothing else may reference it.

use std::{marker::PhantomData, sync::Arc};

use parking_lot::Mutex;

use crate::{
  emitter::Emitter, fault::Fault, lifetime::LifetimeHandle, subscriber::Subscriber,
  subscription::Subscription,
};

/// What a forwarding operator does with an event once it decided to pass
/// something downstream.
pub trait Forward<T, F>: Send + Sync {
  fn forward(&self, event: T, downstream: &dyn Emitter<F>) -> Result<(), Fault>;
}

/// Emits every event unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Relay;

impl<T> Forward<T, T> for Relay {
  #[inline]
  fn forward(&self, event: T, downstream: &dyn Emitter<T>) -> Result<(), Fault> {
    downstream.emit(event);
    Ok(())
  }
}

pub struct Forwarding<T, F, S> {
  handle: Mutex<LifetimeHandle<dyn Emitter<F>>>,
  step: S,
  _event: PhantomData<fn(T)>,
}

impl<T, F, S> Forwarding<T, F, S> {
  pub fn new(downstream: Arc<dyn Emitter<F>>, step: S) -> Self {
    Forwarding { handle: Mutex::new(LifetimeHandle::new(downstream)), step, _event: PhantomData }
  }

  /// The downstream, if it is still worth forwarding to.
  fn downstream(&self, subscription: &Subscription<T>) -> Option<Arc<dyn Emitter<F>>>
  where
    T: Send + 'static,
  {
    let mut handle = self.handle.lock();
    let Some(downstream) = handle.value() else {
      drop(handle);
      if subscription.cancel() {
        tracing::debug!(id = subscription.id(), "downstream released, operator cancelled");
      }
      return None;
    };

    if downstream.has_subscribers() {
      handle.set_strong(true);
      Some(downstream)
    } else {
      if handle.is_strong() {
        tracing::debug!(id = subscription.id(), "downstream unobserved, holding it weakly");
        handle.set_strong(false);
      }
      // May release the downstream; the handle lock is not needed for that.
      drop(handle);
      None
    }
  }
}

impl<T, F, S> Subscriber<T> for Forwarding<T, F, S>
where
  T: Send + 'static,
  F: 'static,
  S: Forward<T, F>,
{
  fn accept(&self, event: T, subscription: &Subscription<T>) -> Result<(), Fault> {
    match self.downstream(subscription) {
      Some(downstream) => self.step.forward(event, &*downstream),
      None => Ok(()),
    }
  }
}
