use crate::{emitter::Emitter, fault::Fault, ops::forwarding::Forward};

/// Emits the events `predicate` accepts.
pub struct FilterStep<P>(P);

impl<P> FilterStep<P> {
  pub fn new(predicate: P) -> Self { FilterStep(predicate) }
}

impl<T, P> Forward<T, T> for FilterStep<P>
where
  P: Fn(&T) -> bool + Send + Sync,
{
  #[inline]
  fn forward(&self, event: T, downstream: &dyn Emitter<T>) -> Result<(), Fault> {
    if (self.0)(&event) {
      downstream.emit(event);
    }
    Ok(())
  }
}

/// Like [`FilterStep`] with a predicate that may fail. A failure drops the
/// event and becomes the operator's fault.
pub struct TryFilterStep<P>(P);

impl<P> TryFilterStep<P> {
  pub fn new(predicate: P) -> Self { TryFilterStep(predicate) }
}

impl<T, P> Forward<T, T> for TryFilterStep<P>
where
  P: Fn(&T) -> Result<bool, Fault> + Send + Sync,
{
  fn forward(&self, event: T, downstream: &dyn Emitter<T>) -> Result<(), Fault> {
    if (self.0)(&event)? {
      downstream.emit(event);
    }
    Ok(())
  }
}
