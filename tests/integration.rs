//! Integration tests for eventbus
//!
//! Exercises operator chains, derived bus lifetimes, error routing across
//! buses and cross-thread scheduling through the public API only.

use std::{
  sync::{mpsc::channel, Arc, Mutex},
  thread,
  time::Duration,
};

use eventbus::{kind, prelude::*};

fn collector<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(T) + Send + Sync + 'static) {
  let seen = Arc::new(Mutex::new(vec![]));
  let c_seen = seen.clone();
  (seen, move |v| c_seen.lock().unwrap().push(v))
}

#[test]
fn consume_observes_emission_order() {
  let bus = Bus::immediate();
  let (seen, collect) = collector();
  bus.consume(collect);

  for v in ["1", "2", "3"] {
    bus.emit(v.to_string());
  }

  assert_eq!(*seen.lock().unwrap(), vec!["1", "2", "3"]);
}

#[test]
fn operator_chain_keeps_relaying_while_consumed() {
  let bus = Bus::immediate();
  let (seen, collect) = collector();
  let (peeked, peek) = collector();

  let tail = bus
    .filter(|v: &u32| *v != 3)
    .map(|v| v * 10)
    .peek(move |v| peek(*v));
  let weak_tail = tail.downgrade();
  let subscription = tail.consume(collect);
  drop(tail);

  for v in 1..=5 {
    bus.emit(v);
  }
  assert_eq!(*seen.lock().unwrap(), vec![10, 20, 40, 50]);
  assert_eq!(*peeked.lock().unwrap(), vec![10, 20, 40, 50]);
  assert!(!weak_tail.is_reclaimed());

  subscription.cancel();
  // Each of the three operators needs one emit to release its output and
  // another to cancel itself.
  for v in 6..12 {
    bus.emit(v);
  }

  assert_eq!(seen.lock().unwrap().len(), 4);
  assert_eq!(peeked.lock().unwrap().len(), 4);
  assert!(weak_tail.is_reclaimed());
  assert!(!bus.has_subscribers());
}

#[test]
fn unobserved_peek_never_runs() {
  let bus = Bus::immediate();
  let (peeked, peek) = collector();
  bus.peek(move |v: &String| peek(v.clone()));

  for v in ["1", "2", "3"] {
    bus.emit(v.to_string());
  }

  assert!(peeked.lock().unwrap().is_empty());
}

#[test]
fn derived_bus_survives_while_held_elsewhere() {
  let bus = Bus::immediate();
  let mapped = bus.map(|v: i32| -v);

  bus.emit(1);
  let (seen, collect) = collector();
  mapped.consume(collect);
  bus.emit(2);

  assert_eq!(*seen.lock().unwrap(), vec![-2]);
}

#[test]
fn capture_takes_first_event_after_subscribing() {
  let bus = Bus::immediate();
  bus.emit(0);
  let capture = bus.capture();
  bus.emit(1);
  bus.emit(2);

  assert_eq!(futures::executor::block_on(capture), Some(1));
}

#[cfg(feature = "timer")]
#[test]
fn first_waits_for_another_thread() {
  let bus = Bus::<&'static str>::new(SerialScheduler::new().unwrap());
  let producer = bus.clone();
  let handle = thread::spawn(move || {
    while !producer.has_subscribers() {
      thread::yield_now();
    }
    producer.emit("ready");
  });

  assert_eq!(bus.first(Duration::from_secs(5)), Some("ready"));
  handle.join().unwrap();
}

#[cfg(feature = "timer")]
#[test]
fn first_returns_none_after_timeout() {
  let bus = Bus::<u8>::immediate();
  assert_eq!(bus.first(Duration::from_millis(10)), None);
  assert!(!bus.has_subscribers());
}

kind!(static VALIDATION: "validation" => ERROR;);

#[derive(Debug, thiserror::Error)]
#[error("value {0} out of range")]
struct OutOfRange(i64);

impl Classified for OutOfRange {
  fn classify() -> &'static Kind { &VALIDATION }
}

#[test]
fn subscription_handler_scopes_failures() {
  let bus = Bus::immediate();
  let (handled, handle) = collector();
  let (caught, catch) = collector();
  let (others, other) = collector();

  bus.error(&ERROR, move |f| catch(f.to_string()));
  bus
    .try_consume(|v: i64| if v > 9 { Err(OutOfRange(v).into()) } else { Ok(()) })
    .on_error::<OutOfRange>(move |e| handle(e.0));
  bus.try_consume(|v: i64| if v < 0 { Err(Fault::other("negative")) } else { Ok(()) });
  bus.consume(other);

  for v in [1, 10, -1] {
    bus.emit(v);
  }

  assert_eq!(*handled.lock().unwrap(), vec![10]);
  assert_eq!(*caught.lock().unwrap(), vec!["negative"]);
  assert_eq!(*others.lock().unwrap(), vec![1, 10, -1]);
}

#[test]
fn demap_presents_bus_as_other_event_type() {
  let celsius = Bus::<i64>::immediate();
  let (seen, collect) = collector();
  celsius.consume(collect);

  let fahrenheit = celsius.demap(|f: f64| ((f - 32.) * 5. / 9.).round() as i64);
  fahrenheit.emit(212.);
  fahrenheit.emit(32.);

  assert_eq!(*seen.lock().unwrap(), vec![100, 0]);
}

#[cfg(feature = "futures-scheduler")]
#[test]
fn thread_pool_dispatch_delivers_everything() {
  let pool = ThreadPoolScheduler::new().unwrap();
  let bus = Bus::<usize>::new(SerialScheduler::new().unwrap());
  let (tx, rx) = channel();
  let tx = Mutex::new(tx);
  bus.consume_on(move |v| tx.lock().unwrap().send(v).unwrap(), pool);

  while !bus.has_subscribers() {
    thread::yield_now();
  }
  (0..50).for_each(|v| bus.emit(v));

  let mut seen: Vec<_> = rx.iter().take(50).collect();
  seen.sort_unstable();
  assert_eq!(seen, (0..50).collect::<Vec<_>>());
}

#[test]
fn manual_scheduler_exposes_each_step() {
  let scheduler = ManualScheduler::new();
  let bus = Bus::<char>::new(scheduler.clone());
  let (seen, collect) = collector();

  let subscription = bus.consume(collect);
  bus.emit('a');
  assert_eq!(scheduler.pending_count(), 2);

  assert!(scheduler.run_next());
  assert!(bus.has_subscribers());
  // The fan-out only schedules the delivery.
  assert!(scheduler.run_next());
  assert!(seen.lock().unwrap().is_empty());

  subscription.cancel();
  bus.emit('b');
  scheduler.flush();

  assert_eq!(*seen.lock().unwrap(), vec!['a']);
  assert!(!bus.has_subscribers());
}
