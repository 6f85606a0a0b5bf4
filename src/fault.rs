//! Faults: kind-tagged errors routed through error routers.
//!
//! Anything a subscriber returns as `Err`, and any panic raised inside a
//! subscriber, becomes a [`Fault`]. The fault keeps the original error and
//! the [`Kind`] the router uses to pick a handler.

use std::{
  any::Any,
  error::Error,
  fmt::{Debug, Display, Formatter},
  sync::Arc,
};

use crate::kind::{Classified, Kind};

/// Catch-all kind. Routing tries it last for every fault, even one whose kind
/// does not extend it.
pub static ERROR: Kind = Kind::new("error", &[], None);

/// Kind of faults produced from a caught panic.
pub static PANIC: Kind = Kind::new("panic", &[], Some(&ERROR));

type BoxedError = Arc<dyn Error + Send + Sync + 'static>;

/// A kind-tagged, cheaply cloneable error.
#[derive(Clone)]
pub struct Fault {
  kind: &'static Kind,
  error: BoxedError,
}

impl Fault {
  /// Wrap a classified error, tagging it with its own kind.
  pub fn new<E>(error: E) -> Self
  where
    E: Classified + Error + Send + Sync,
  {
    Fault { kind: E::classify(), error: Arc::new(error) }
  }

  /// Wrap an error under an explicit kind.
  pub fn with_kind(
    kind: &'static Kind,
    error: impl Into<Box<dyn Error + Send + Sync + 'static>>,
  ) -> Self {
    Fault { kind, error: Arc::from(error.into()) }
  }

  /// Wrap an unclassified error. Its kind is [`ERROR`].
  ///
  /// ```rust
  /// use eventbus::fault::{Fault, ERROR};
  ///
  /// let fault = Fault::other("disk full");
  /// assert_eq!(fault.kind(), &ERROR);
  /// assert_eq!(fault.to_string(), "disk full");
  /// ```
  pub fn other(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
    Self::with_kind(&ERROR, error)
  }

  pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
    let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
      (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
      s.clone()
    } else {
      "subscriber panicked".to_owned()
    };
    Fault { kind: &PANIC, error: Arc::new(PanicError { message }) }
  }

  #[inline]
  pub fn kind(&self) -> &'static Kind { self.kind }

  /// The wrapped error as a concrete type, if it is one.
  pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> { self.error.downcast_ref::<E>() }

  #[inline]
  pub fn is<E: Error + 'static>(&self) -> bool { self.error.is::<E>() }
}

impl<E> From<E> for Fault
where
  E: Classified + Error + Send + Sync,
{
  fn from(error: E) -> Self { Fault::new(error) }
}

impl Display for Fault {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Display::fmt(&self.error, f) }
}

impl Debug for Fault {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Fault")
      .field("kind", &self.kind.name())
      .field("error", &self.error)
      .finish()
  }
}

/// The error carried by a [`PANIC`] fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("subscriber panicked: {message}")]
pub struct PanicError {
  pub message: String,
}
