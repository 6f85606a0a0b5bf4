//! The receiving end of a subscription.

use crate::{fault::Fault, subscription::Subscription};

/// Accepts events delivered by a [`Subscription`].
///
/// The subscription is passed along so a subscriber can cancel itself, for
/// example after the first event. An `Err` (or a panic) is routed through the
/// subscription's error router and never reaches the emitter.
///
/// Closures of the shape `Fn(T, &Subscription<T>) -> Result<(), Fault>` are
/// subscribers. [`from_fn`] helps the compiler infer their argument types.
pub trait Subscriber<T>: Send + Sync {
  fn accept(&self, event: T, subscription: &Subscription<T>) -> Result<(), Fault>;
}

impl<T, F> Subscriber<T> for F
where
  F: Fn(T, &Subscription<T>) -> Result<(), Fault> + Send + Sync,
{
  #[inline]
  fn accept(&self, event: T, subscription: &Subscription<T>) -> Result<(), Fault> {
    self(event, subscription)
  }
}

/// Pins a closure to the subscriber signature.
///
/// ```rust
/// use eventbus::{bus::Bus, source::Source, subscriber};
///
/// let bus = Bus::immediate();
/// bus.subscribe(subscriber::from_fn(|event: u8, subscription| {
///   println!("{event}");
///   subscription.cancel();
///   Ok(())
/// }));
/// bus.emit(1);
/// ```
#[inline]
pub fn from_fn<T, F>(f: F) -> F
where
  F: Fn(T, &Subscription<T>) -> Result<(), Fault> + Send + Sync,
{
  f
}
