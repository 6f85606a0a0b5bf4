//! The write side of a bus.

use crate::fault::Fault;

/// Something events of type `T` can be pushed into.
///
/// [`Bus`](crate::bus::Bus) is the implementation the crate ships. Operators
/// hold their downstream as an `Emitter` so any target can be fed.
pub trait Emitter<T>: Send + Sync {
  /// Fan `event` out to the current subscribers. Never blocks and never
  /// fails; delivery happens on the emitter's own schedule.
  fn emit(&self, event: T);

  /// Route `fault` into the emitter's root error handling, as if one of its
  /// subscribers had raised it.
  fn raise(&self, fault: Fault);

  /// Whether anything is subscribed right now.
  fn has_subscribers(&self) -> bool;
}
