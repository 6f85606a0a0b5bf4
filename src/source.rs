//! The subscribe side of a bus, with its operators.
//!
//! Every operator (`map`, `filter`, `peek` and their fallible forms)
//! returns a fresh [`Bus`] that nothing but the operator refers to. That bus
//! stays alive while it has subscribers and is released once it has none,
//! so chains need no explicit teardown.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use eventbus::prelude::*;
//!
//! let bus = Bus::immediate();
//! let seen = Arc::new(Mutex::new(vec![]));
//! let c_seen = seen.clone();
//! let subscription = bus.map(|v: u8| v * 2).consume(move |v| c_seen.lock().unwrap().push(v));
//!
//! bus.emit(1);
//! subscription.cancel();
//! bus.emit(2);
//!
//! assert_eq!(*seen.lock().unwrap(), vec![2]);
//! ```

use std::{error::Error, sync::Arc};

use futures::channel::oneshot;

use crate::{
  bus::Bus,
  emitter::Emitter,
  error::BusError,
  fault::{Fault, ERROR},
  kind::{Classified, Kind, Kinded},
  ops::{
    capture::{Capture, OneShot},
    filter::{FilterStep, TryFilterStep},
    forwarding::{Forward, Forwarding, Relay},
    map::{MapStep, TryMapStep},
    peek::PeekStep,
  },
  router::SinkRef,
  scheduler::SchedulerRef,
  subscriber::Subscriber,
  subscription::Subscription,
};

pub trait Source<T: Clone + Send + 'static> {
  /// The scheduler this source serializes its work on.
  fn scheduler(&self) -> SchedulerRef;

  /// The sink that buses derived from this one report unhandled faults to.
  fn default_sink(&self) -> SinkRef;

  /// Subscribe `subscriber`, dispatching to it on `scheduler`.
  ///
  /// The subscription is added asynchronously on the source's own scheduler.
  fn subscribe_on(
    &self,
    subscriber: impl Subscriber<T> + 'static,
    scheduler: impl Into<SchedulerRef>,
  ) -> Subscription<T>;

  /// Handle faults assignable to `kind` that no subscription handled.
  fn error(
    &self,
    kind: &'static Kind,
    handler: impl Fn(&Fault) + Send + Sync + 'static,
  ) -> &Self;

  fn subscribe(&self, subscriber: impl Subscriber<T> + 'static) -> Subscription<T> {
    self.subscribe_on(subscriber, self.scheduler())
  }

  /// Typed form of [`error`](Source::error).
  fn on_error<E>(&self, handler: impl Fn(&E) + Send + Sync + 'static) -> &Self
  where
    E: Classified + Error,
  {
    self.error(E::classify(), move |fault| {
      if let Some(error) = fault.downcast_ref::<E>() {
        handler(error)
      }
    })
  }

  fn consume(&self, f: impl Fn(T) + Send + Sync + 'static) -> Subscription<T> {
    self.consume_on(f, self.scheduler())
  }

  fn consume_on(
    &self,
    f: impl Fn(T) + Send + Sync + 'static,
    scheduler: impl Into<SchedulerRef>,
  ) -> Subscription<T> {
    self.subscribe_on(
      move |event: T, _: &Subscription<T>| -> Result<(), Fault> {
        f(event);
        Ok(())
      },
      scheduler,
    )
  }

  /// Like [`consume`](Source::consume) for a consumer that may fail.
  fn try_consume(
    &self,
    f: impl Fn(T) -> Result<(), Fault> + Send + Sync + 'static,
  ) -> Subscription<T> {
    self.subscribe(move |event: T, _: &Subscription<T>| f(event))
  }

  /// Call `f` for every event, ignoring its value.
  fn run(&self, f: impl Fn() + Send + Sync + 'static) -> Subscription<T> {
    self.run_on(f, self.scheduler())
  }

  fn run_on(
    &self,
    f: impl Fn() + Send + Sync + 'static,
    scheduler: impl Into<SchedulerRef>,
  ) -> Subscription<T> {
    self.consume_on(move |_| f(), scheduler)
  }

  fn map<F>(&self, f: impl Fn(T) -> F + Send + Sync + 'static) -> Bus<F>
  where
    F: Clone + Send + 'static,
  {
    self.map_on(f, self.scheduler())
  }

  /// [`map`](Source::map), with `f` called on `scheduler`.
  fn map_on<F>(
    &self,
    f: impl Fn(T) -> F + Send + Sync + 'static,
    scheduler: impl Into<SchedulerRef>,
  ) -> Bus<F>
  where
    F: Clone + Send + 'static,
  {
    derive(self, MapStep::new(f), scheduler.into())
  }

  /// Map with a function that may fail. Failures are raised on the returned
  /// bus and nothing is emitted for them.
  fn try_map<F>(&self, f: impl Fn(T) -> Result<F, Fault> + Send + Sync + 'static) -> Bus<F>
  where
    F: Clone + Send + 'static,
  {
    derive(self, TryMapStep::new(f), self.scheduler())
  }

  fn filter(&self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Bus<T> {
    self.filter_on(predicate, self.scheduler())
  }

  fn filter_on(
    &self,
    predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
    scheduler: impl Into<SchedulerRef>,
  ) -> Bus<T> {
    derive(self, FilterStep::new(predicate), scheduler.into())
  }

  /// Filter with a predicate that may fail. Failures are raised on the
  /// returned bus and the event is dropped.
  fn try_filter(
    &self,
    predicate: impl Fn(&T) -> Result<bool, Fault> + Send + Sync + 'static,
  ) -> Bus<T> {
    derive(self, TryFilterStep::new(predicate), self.scheduler())
  }

  /// Call `f` with every event before passing it on unchanged.
  ///
  /// `f` only runs while the returned bus has subscribers.
  fn peek(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Bus<T> {
    self.peek_on(f, self.scheduler())
  }

  fn peek_on(
    &self,
    f: impl Fn(&T) + Send + Sync + 'static,
    scheduler: impl Into<SchedulerRef>,
  ) -> Bus<T> {
    derive(self, PeekStep::new(f), scheduler.into())
  }

  /// Keep the events whose kind is assignable to `F`'s, converted to `F`.
  ///
  /// ```rust
  /// use std::sync::{Arc, Mutex};
  ///
  /// use eventbus::{kind, kind::{Classified, Kind, Kinded}, prelude::*};
  ///
  /// kind!(static EVENT: "event";);
  /// kind!(static CLICK: "click" => EVENT;);
  /// kind!(static KEY: "key" => EVENT;);
  ///
  /// #[derive(Clone)]
  /// enum Ui { Click(u32), Key(char) }
  ///
  /// #[derive(Clone)]
  /// struct Click(u32);
  ///
  /// impl Kinded for Ui {
  ///   fn kind(&self) -> &'static Kind {
  ///     match self {
  ///       Ui::Click(_) => &CLICK,
  ///       Ui::Key(_) => &KEY,
  ///     }
  ///   }
  /// }
  ///
  /// impl Classified for Click {
  ///   fn classify() -> &'static Kind { &CLICK }
  /// }
  ///
  /// impl TryFrom<Ui> for Click {
  ///   type Error = Ui;
  ///   fn try_from(ui: Ui) -> Result<Self, Ui> {
  ///     match ui {
  ///       Ui::Click(at) => Ok(Click(at)),
  ///       other => Err(other),
  ///     }
  ///   }
  /// }
  ///
  /// let bus = Bus::immediate();
  /// let clicks = Arc::new(Mutex::new(vec![]));
  /// let c_clicks = clicks.clone();
  /// bus.filter_kind::<Click>().consume(move |c| c_clicks.lock().unwrap().push(c.0));
  ///
  /// bus.emit(Ui::Key('a'));
  /// bus.emit(Ui::Click(7));
  ///
  /// assert_eq!(*clicks.lock().unwrap(), vec![7]);
  /// ```
  fn filter_kind<F>(&self) -> Bus<F>
  where
    T: Kinded,
    F: Classified + TryFrom<T> + Clone + Send,
  {
    self
      .filter(|event: &T| event.kind().is_assignable_to(F::classify()))
      .try_map(|event: T| {
        let actual = event.kind();
        F::try_from(event).map_err(|_| {
          let expected = F::classify().name();
          Fault::new(BusError::KindMismatch { expected, actual: actual.name() })
        })
      })
  }

  /// Feed every event into `target`. Returns this source.
  fn forward(&self, target: &Bus<T>) -> &Self { self.forward_to(target.0.clone()) }

  /// Feed every event into `target` while it has subscribers. Once `target`
  /// is released the forwarding subscription cancels itself.
  fn forward_to(&self, target: Arc<dyn Emitter<T>>) -> &Self {
    self.subscribe(Forwarding::new(target, Relay));
    self
  }

  /// The next event, as a future.
  fn capture(&self) -> Capture<T> {
    let (sender, receiver) = oneshot::channel();
    let subscription = self.subscribe(OneShot::new(sender));
    Capture::new(receiver, subscription.downgrade())
  }

  /// Block until the next event arrives or `timeout` elapses.
  ///
  /// Running out of time is not an error; the result is `None`. The
  /// capturing subscription is cancelled either way.
  #[cfg(feature = "timer")]
  fn first(&self, timeout: std::time::Duration) -> Option<T> {
    use futures_time::{future::FutureExt, time::Duration};

    let capture = self.capture();
    let subscription = capture.subscription();
    let captured = futures::executor::block_on(capture.timeout(Duration::from(timeout)));
    subscription.cancel();
    captured.ok().flatten()
  }
}

/// Subscribe a forwarding operator with `step` to `source` and return the
/// bus it feeds.
fn derive<T, F, Src, S>(source: &Src, step: S, scheduler: SchedulerRef) -> Bus<F>
where
  T: Clone + Send + 'static,
  F: Clone + Send + 'static,
  Src: Source<T> + ?Sized,
  S: Forward<T, F> + 'static,
{
  let downstream =
    Bus::<F>::builder().scheduler(source.scheduler()).shared_sink(source.default_sink()).build();
  let target: Arc<dyn Emitter<F>> = downstream.0.clone();
  let bridge = Arc::downgrade(&downstream.0);

  source.subscribe_on(Forwarding::new(target, step), scheduler).error(&ERROR, move |fault| {
    match bridge.upgrade() {
      Some(bus) => bus.raise(fault.clone()),
      None => tracing::warn!(error = %fault, "operator fault after its output was released"),
    }
  });
  downstream
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use parking_lot::Mutex;

  use super::*;
  use crate::{kind, scheduler::ManualScheduler};

  kind!(static SHAPE: "shape";);
  kind!(static ROUND: "round";);
  kind!(static CIRCLE: "circle": [ROUND] => SHAPE;);
  kind!(static SQUARE: "square" => SHAPE;);

  #[derive(Clone, Debug, PartialEq)]
  enum Shape {
    Circle(f32),
    Square(f32),
  }

  #[derive(Clone, Debug, PartialEq)]
  struct Round(f32);

  impl Kinded for Shape {
    fn kind(&self) -> &'static Kind {
      match self {
        Shape::Circle(_) => &CIRCLE,
        Shape::Square(_) => &SQUARE,
      }
    }
  }

  impl Classified for Round {
    fn classify() -> &'static Kind { &ROUND }
  }

  impl TryFrom<Shape> for Round {
    type Error = Shape;

    fn try_from(shape: Shape) -> Result<Self, Shape> {
      match shape {
        Shape::Circle(r) => Ok(Round(r)),
        other => Err(other),
      }
    }
  }

  #[derive(Clone, Debug, PartialEq)]
  struct AnyShape;

  impl Classified for AnyShape {
    fn classify() -> &'static Kind { &SHAPE }
  }

  impl TryFrom<Shape> for AnyShape {
    type Error = Shape;

    fn try_from(shape: Shape) -> Result<Self, Shape> {
      match shape {
        Shape::Circle(_) => Ok(AnyShape),
        other => Err(other),
      }
    }
  }

  #[test]
  fn run_ignores_values() {
    let bus = Bus::immediate();
    let runs = Arc::new(AtomicUsize::new(0));
    let c_runs = runs.clone();
    bus.run(move || {
      c_runs.fetch_add(1, Ordering::SeqCst);
    });

    bus.emit('a');
    bus.emit('b');

    assert_eq!(runs.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn filter_kind_matches_capabilities() {
    let bus = Bus::immediate();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    bus.filter_kind::<Round>().consume(move |r| c_seen.lock().push(r));

    bus.emit(Shape::Square(1.));
    bus.emit(Shape::Circle(2.));

    assert_eq!(*seen.lock(), vec![Round(2.)]);
  }

  #[test]
  fn filter_kind_reports_failed_conversion() {
    let bus = Bus::immediate();
    let faults = Arc::new(Mutex::new(vec![]));
    let seen = Arc::new(AtomicUsize::new(0));

    let shapes = bus.filter_kind::<AnyShape>();
    let c_faults = faults.clone();
    shapes.on_error::<BusError>(move |e| c_faults.lock().push(e.clone()));
    let c_seen = seen.clone();
    shapes.consume(move |_| {
      c_seen.fetch_add(1, Ordering::SeqCst);
    });

    bus.emit(Shape::Circle(1.));
    bus.emit(Shape::Square(1.));

    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(
      *faults.lock(),
      vec![BusError::KindMismatch { expected: "shape", actual: "square" }]
    );
  }

  #[test]
  fn forward_returns_the_source_for_chaining() {
    let source = Bus::immediate();
    let left = Bus::immediate();
    let right = Bus::immediate();
    let seen = Arc::new(Mutex::new(vec![]));
    for target in [&left, &right] {
      let seen = seen.clone();
      target.consume(move |v: u8| seen.lock().push(v));
    }

    source.forward(&left).forward(&right);
    source.emit(5);

    assert_eq!(*seen.lock(), vec![5, 5]);
  }

  #[test]
  fn operator_failure_is_raised_on_derived_bus() {
    let bus = Bus::<u8>::immediate();
    let derived_faults = Arc::new(AtomicUsize::new(0));
    let source_faults = Arc::new(AtomicUsize::new(0));

    let c_source = source_faults.clone();
    bus.error(&ERROR, move |_| {
      c_source.fetch_add(1, Ordering::SeqCst);
    });
    let mapped = bus.map(|v| 100 / v);
    let c_derived = derived_faults.clone();
    mapped.error(&ERROR, move |_| {
      c_derived.fetch_add(1, Ordering::SeqCst);
    });
    mapped.consume(|_| {});

    bus.emit(0);

    assert_eq!(derived_faults.load(Ordering::SeqCst), 1);
    assert_eq!(source_faults.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn failure_of_detached_kind_still_reaches_derived_bus() {
    kind!(static STALE: "stale";);

    let bus = Bus::<u8>::immediate();
    let upstream = Arc::new(Mutex::new(vec![]));
    let derived = Arc::new(Mutex::new(vec![]));

    let c_upstream = upstream.clone();
    bus.error(&ERROR, move |f| c_upstream.lock().push(f.to_string()));
    let mapped = bus.try_map(|_| -> Result<u8, Fault> {
      Err(Fault::with_kind(&STALE, "retry me"))
    });
    let c_derived = derived.clone();
    mapped.error(&ERROR, move |f| c_derived.lock().push(f.to_string()));
    mapped.consume(|_| {});

    bus.emit(1);

    assert!(upstream.lock().is_empty());
    assert_eq!(*derived.lock(), vec!["retry me"]);
  }

  #[test]
  fn derived_bus_inherits_scheduler_and_sink() {
    let scheduler = ManualScheduler::new();
    let sunk = Arc::new(AtomicUsize::new(0));
    let c_sunk = sunk.clone();
    let bus: Bus<i32> = Bus::builder()
      .scheduler(scheduler.clone())
      .default_sink(move |_: &Fault| {
        c_sunk.fetch_add(1, Ordering::SeqCst);
      })
      .build();

    let mapped = bus.try_map(|v| if v > 0 { Ok(v) } else { Err(Fault::other("non-positive")) });
    mapped.consume(|_| {});
    scheduler.flush();
    assert!(mapped.has_subscribers());
    assert!(mapped.scheduler().same(&bus.scheduler()));

    bus.emit(-1);
    scheduler.flush();

    assert_eq!(sunk.load(Ordering::SeqCst), 1);
  }

  #[cfg(feature = "timer")]
  #[test]
  fn first_times_out_without_error() {
    let bus = Bus::<u8>::immediate();
    let started = std::time::Instant::now();

    assert_eq!(bus.first(std::time::Duration::from_millis(20)), None);
    assert!(started.elapsed() >= std::time::Duration::from_millis(20));
    assert!(!bus.has_subscribers());
  }

  #[cfg(feature = "timer")]
  #[test]
  fn first_returns_event_from_another_thread() {
    let bus = Bus::<u8>::immediate();
    let producer = bus.clone();
    let emitter = std::thread::spawn(move || {
      while !producer.has_subscribers() {
        std::thread::yield_now();
      }
      producer.emit(9);
      producer.emit(10);
    });

    assert_eq!(bus.first(std::time::Duration::from_secs(5)), Some(9));
    emitter.join().unwrap();
    assert!(!bus.has_subscribers());
  }
}
