use std::{
  future::Future,
  pin::Pin,
  task::{Context, Poll},
};

use futures::channel::oneshot;
use parking_lot::Mutex;
use pin_project_lite::pin_project;

use crate::{
  fault::Fault,
  subscriber::Subscriber,
  subscription::{Subscription, WeakSubscription},
};

/// Takes the first event it sees and cancels its subscription.
pub(crate) struct OneShot<T> {
  sender: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> OneShot<T> {
  pub(crate) fn new(sender: oneshot::Sender<T>) -> Self {
    OneShot { sender: Mutex::new(Some(sender)) }
  }
}

impl<T: Send + 'static> Subscriber<T> for OneShot<T> {
  fn accept(&self, event: T, subscription: &Subscription<T>) -> Result<(), Fault> {
    // Later events may already be scheduled; only the first is kept.
    if let Some(sender) = self.sender.lock().take() {
      // The receiver may have given up waiting.
      let _ = sender.send(event);
    }
    subscription.cancel();
    Ok(())
  }
}

pin_project! {
  /// Resolves to the first event delivered after `capture` was called, or to
  /// `None` if the bus went away first.
  #[must_use = "futures do nothing unless polled"]
  pub struct Capture<T> {
    #[pin]
    receiver: oneshot::Receiver<T>,
    subscription: WeakSubscription<T>,
  }
}

impl<T: Send + 'static> Capture<T> {
  pub(crate) fn new(receiver: oneshot::Receiver<T>, subscription: WeakSubscription<T>) -> Self {
    Capture { receiver, subscription }
  }

  /// Stop waiting. Returns `true` if this call cancelled the subscription.
  pub fn cancel(&self) -> bool { self.subscription.cancel() }

  pub(crate) fn subscription(&self) -> WeakSubscription<T> { self.subscription.clone() }
}

impl<T> Future for Capture<T> {
  type Output = Option<T>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    self.project().receiver.poll(cx).map(Result::ok)
  }
}

#[cfg(test)]
mod tests {
  use futures::executor::block_on;

  use crate::{bus::Bus, scheduler::ManualScheduler, source::Source};

  #[test]
  fn resolves_to_first_event_only() {
    let scheduler = ManualScheduler::new();
    let bus = Bus::new(scheduler.clone());
    let capture = bus.capture();
    scheduler.flush();

    bus.emit(1);
    bus.emit(2);
    bus.emit(3);
    scheduler.flush();

    assert_eq!(block_on(capture), Some(1));
    assert!(!bus.has_subscribers());
  }

  #[test]
  fn ignores_events_before_capture() {
    let bus = Bus::immediate();
    bus.emit("early");
    let capture = bus.capture();
    bus.emit("late");

    assert_eq!(block_on(capture), Some("late"));
  }

  #[test]
  fn none_when_bus_goes_away() {
    let bus = Bus::<u8>::immediate();
    let capture = bus.capture();
    drop(bus);

    assert_eq!(block_on(capture), None);
  }

  #[test]
  fn cancel_stops_listening() {
    let bus = Bus::<u8>::immediate();
    let capture = bus.capture();

    assert!(capture.cancel());
    assert!(!capture.cancel());
    assert!(!bus.has_subscribers());
  }
}
