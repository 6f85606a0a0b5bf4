//! # eventbus: a typed in-process event bus
//!
//! Producers [`emit`](bus::Bus::emit) events; consumers subscribe, each with
//! its own dispatch scheduler. Stream-style operators (`map`, `filter`,
//! `peek`, `forward`) build derived buses that need no teardown: a derived
//! bus lives exactly as long as something consumes it.
//!
//! ## Quick Start
//!
//! ```rust
//! use eventbus::prelude::*;
//!
//! let bus = Bus::immediate();
//!
//! bus
//!   .filter(|v: &i32| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .consume(|v| println!("Value: {}", v));
//!
//! (0..10).for_each(|v| bus.emit(v));
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Bus`] | Emitter and source for one event type |
//! | [`Source`] | Subscribing and the operators |
//! | [`Subscription`] | Cancels a subscriber, scopes its error handlers |
//! | [`Scheduler`] | Where the bus and its subscribers run |
//! | [`Kind`] | Static descriptor used for error routing and `filter_kind` |
//!
//! ## Errors
//!
//! A failing or panicking subscriber never affects the emitter or the other
//! subscribers. Its [`Fault`] is routed by kind, first through handlers on
//! its own subscription, then through the bus handlers, and finally to the
//! bus's default sink, which logs it with `tracing`.
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): `ThreadPoolScheduler` on a `futures`
//!   thread pool
//! - **`timer`** (default): the blocking [`Source::first`] with a timeout
//! - **`tokio-scheduler`**: `TokioScheduler` on a tokio runtime
//!
//! [`Bus`]: bus::Bus
//! [`Source`]: source::Source
//! [`Source::first`]: source::Source::first
//! [`Subscription`]: subscription::Subscription
//! [`Scheduler`]: scheduler::Scheduler
//! [`Kind`]: kind::Kind
//! [`Fault`]: fault::Fault

pub mod bus;
pub mod emitter;
pub mod error;
pub mod fault;
pub mod kind;
pub mod lifetime;
pub mod ops;
pub mod prelude;
pub mod router;
pub mod scheduler;
pub mod source;
pub mod subscriber;
pub mod subscription;
