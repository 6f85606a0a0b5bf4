use crate::{emitter::Emitter, fault::Fault, ops::forwarding::Forward};

/// Shows every event to a side effect, then emits it unchanged.
pub struct PeekStep<P>(P);

impl<P> PeekStep<P> {
  pub fn new(side_effect: P) -> Self { PeekStep(side_effect) }
}

impl<T, P> Forward<T, T> for PeekStep<P>
where
  P: Fn(&T) + Send + Sync,
{
  #[inline]
  fn forward(&self, event: T, downstream: &dyn Emitter<T>) -> Result<(), Fault> {
    (self.0)(&event);
    downstream.emit(event);
    Ok(())
  }
}
