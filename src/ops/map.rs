use crate::{emitter::Emitter, fault::Fault, ops::forwarding::Forward};

/// Emits `f(event)`.
pub struct MapStep<M>(M);

impl<M> MapStep<M> {
  pub fn new(f: M) -> Self { MapStep(f) }
}

impl<T, F, M> Forward<T, F> for MapStep<M>
where
  M: Fn(T) -> F + Send + Sync,
{
  #[inline]
  fn forward(&self, event: T, downstream: &dyn Emitter<F>) -> Result<(), Fault> {
    downstream.emit((self.0)(event));
    Ok(())
  }
}

/// Emits the `Ok` value of `f(event)`. An `Err` is returned as the
/// operator's fault and nothing is emitted.
pub struct TryMapStep<M>(M);

impl<M> TryMapStep<M> {
  pub fn new(f: M) -> Self { TryMapStep(f) }
}

impl<T, F, M> Forward<T, F> for TryMapStep<M>
where
  M: Fn(T) -> Result<F, Fault> + Send + Sync,
{
  fn forward(&self, event: T, downstream: &dyn Emitter<F>) -> Result<(), Fault> {
    downstream.emit((self.0)(event)?);
    Ok(())
  }
}
