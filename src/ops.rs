//! Forwarding operators.
//!
//! Every operator is a [`Forwarding`](forwarding::Forwarding) subscriber
//! paired with a [`Forward`](forwarding::Forward) step. The
//! [`Source`](crate::source::Source) methods wire them up; the types here are
//! public for building custom operators.

pub mod capture;
pub mod filter;
pub mod forwarding;
pub mod map;
pub mod peek;

pub use capture::Capture;
pub use filter::{FilterStep, TryFilterStep};
pub use forwarding::{Forward, Forwarding, Relay};
pub use map::{MapStep, TryMapStep};
pub use peek::PeekStep;
