//! Hierarchical, kind-keyed fault routing.
//!
//! Every bus owns a root [`ErrorRouter`]; every subscription owns a fork of
//! it. Routing a [`Fault`] walks the fault's assignable kinds at the current
//! node, most specific first, and invokes the first registered handler that
//! accepts it. [`ERROR`] closes every walk, so a handler for it catches
//! faults of any kind. If the node has no match the walk repeats at its
//! parent. When no node in the chain matches, the root's [`Sink`] receives
//! the fault.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use eventbus::{fault::{Fault, ERROR}, router::ErrorRouter};
//!
//! let seen = Arc::new(Mutex::new(vec![]));
//! let root = ErrorRouter::new(|_: &Fault| {});
//! let child = root.fork();
//!
//! let c_seen = seen.clone();
//! root.on(&ERROR, move |f| c_seen.lock().unwrap().push(format!("root: {f}")));
//!
//! child.route(Fault::other("lost"));
//! assert_eq!(*seen.lock().unwrap(), vec!["root: lost"]);
//! ```

use std::{error::Error, sync::Arc};

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::{
  fault::{Fault, ERROR},
  kind::{Classified, Kind},
};

/// Returns `false` to pass a fault on as if the handler were not registered.
type Claim = Arc<dyn Fn(&Fault) -> bool + Send + Sync>;

/// Receives faults no handler in the chain accepted. It must not panic.
pub trait Sink: Send + Sync {
  fn unhandled(&self, fault: &Fault);
}

impl<F> Sink for F
where
  F: Fn(&Fault) + Send + Sync,
{
  fn unhandled(&self, fault: &Fault) { self(fault) }
}

/// The default sink: logs the fault and carries on.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl Sink for LogSink {
  fn unhandled(&self, fault: &Fault) {
    tracing::error!(kind = fault.kind().name(), error = %fault, "unhandled fault");
  }
}

pub type SinkRef = Arc<dyn Sink>;

/// A node in the routing chain. Cloning shares the node.
#[derive(Clone)]
pub struct ErrorRouter(Arc<Node>);

struct Node {
  handlers: Mutex<SmallVec<[(&'static Kind, Claim); 2]>>,
  parent: Option<ErrorRouter>,
  sink: Option<SinkRef>,
}

impl ErrorRouter {
  /// A root router ending in `sink`.
  pub fn new(sink: impl Sink + 'static) -> Self { Self::with_sink(Arc::new(sink)) }

  pub fn with_sink(sink: SinkRef) -> Self {
    ErrorRouter(Arc::new(Node { handlers: Mutex::default(), parent: None, sink: Some(sink) }))
  }

  /// A child router with no handlers of its own that defers to `self`.
  pub fn fork(&self) -> Self {
    ErrorRouter(Arc::new(Node {
      handlers: Mutex::default(),
      parent: Some(self.clone()),
      sink: None,
    }))
  }

  /// Handle faults assignable to `kind` at this node. Registering the same
  /// kind again replaces the earlier handler.
  pub fn on(&self, kind: &'static Kind, handler: impl Fn(&Fault) + Send + Sync + 'static) {
    self.claim(kind, move |fault| {
      handler(fault);
      true
    })
  }

  /// Handle faults of the classified error type `E`.
  ///
  /// The handler is keyed by `E`'s kind. A fault of that kind which does not
  /// wrap an `E` is not handled here and keeps routing.
  pub fn on_error<E>(&self, handler: impl Fn(&E) + Send + Sync + 'static)
  where
    E: Classified + Error,
  {
    self.claim(E::classify(), move |fault| match fault.downcast_ref::<E>() {
      Some(error) => {
        handler(error);
        true
      }
      None => false,
    })
  }

  fn claim(&self, kind: &'static Kind, claim: impl Fn(&Fault) -> bool + Send + Sync + 'static) {
    let claim: Claim = Arc::new(claim);
    let mut handlers = self.0.handlers.lock();
    match handlers.iter_mut().find(|(k, _)| *k == kind) {
      Some(slot) => slot.1 = claim,
      None => handlers.push((kind, claim)),
    }
  }

  /// Dispatch `fault` to the most specific handler in the chain that accepts
  /// it, or to the root sink.
  pub fn route(&self, fault: Fault) {
    let mut node = self;
    loop {
      // Handlers run unlocked; they may register handlers or route again.
      if node.candidates(fault.kind()).iter().any(|claim| claim(&fault)) {
        return;
      }
      match &node.0.parent {
        Some(parent) => node = parent,
        None => break,
      }
    }
    if let Some(sink) = &node.0.sink {
      sink.unhandled(&fault);
    }
  }

  /// Handlers at this node matching `kind`, most specific first.
  fn candidates(&self, kind: &'static Kind) -> SmallVec<[Claim; 2]> {
    let handlers = self.0.handlers.lock();
    if handlers.is_empty() {
      return SmallVec::new();
    }
    let walk = kind.assignable();
    let catch_all = (!walk.contains(&&ERROR)).then_some(&ERROR);
    walk
      .iter()
      .copied()
      .chain(catch_all)
      .filter_map(|k| {
        handlers.iter().find(|(registered, _)| *registered == k).map(|(_, claim)| claim.clone())
      })
      .collect()
  }
}
