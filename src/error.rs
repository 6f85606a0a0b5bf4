//! Errors raised by the bus itself.
//!
//! Subscriber failures never surface here; they are [`Fault`]s routed through
//! error routers. [`BusError`] covers misuse detected at a call site.
//!
//! [`Fault`]: crate::fault::Fault

use thiserror::Error;

use crate::{
  fault::ERROR,
  kind::{Classified, Kind},
};

/// Kind of every [`BusError`].
pub static BUS_ERROR: Kind = Kind::new("bus-error", &[], Some(&ERROR));

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
  /// A delivery was attempted on a subscription that was already cancelled.
  #[error("attempt to deliver to cancelled subscription #{id}")]
  Cancelled { id: usize },

  /// An event passed a kind filter but did not convert to the target type.
  #[error("event of kind `{actual}` does not convert to `{expected}`")]
  KindMismatch { expected: &'static str, actual: &'static str },
}

impl Classified for BusError {
  fn classify() -> &'static Kind { &BUS_ERROR }
}
