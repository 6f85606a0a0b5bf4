//! Static kind descriptors.
//!
//! A [`Kind`] names a category of error or event together with the
//! capabilities it declares and the parent it extends. Kinds are plain
//! `static` items compared by address, so two kinds are equal only if they
//! are the same item.
//!
//! The error router and `filter_kind` never inspect types at runtime. They
//! walk [`Kind::assignable`], which is computed once per kind and cached.
//!
//! ## Walk order
//!
//! For a kind `K` the assignable list is:
//!
//! 1. `K` itself,
//! 2. the assignable lists of every declared capability, concatenated in
//!    declaration order, keeping only the first occurrence of each kind and
//!    dropping kinds that also appear in the parent's list,
//! 3. the parent's assignable list.
//!
//! De-duplication covers the whole concatenated capability list of one kind,
//! not only direct siblings. With `C: [B, A]` and `D: [C, A]` the walk for
//! `D` is `D, C, B, A`.
//!
//! ```rust
//! use eventbus::kind;
//!
//! kind!(static A: "a";);
//! kind!(static B: "b";);
//! kind!(static C: "c": [B, A];);
//! kind!(static D: "d": [C, A];);
//!
//! let names: Vec<_> = D.assignable().iter().map(|k| k.name()).collect();
//! assert_eq!(names, ["d", "c", "b", "a"]);
//! assert!(D.is_assignable_to(&A));
//! assert!(!A.is_assignable_to(&D));
//! ```

use std::{
  fmt::{Debug, Formatter},
  hash::{Hash, Hasher},
};

use once_cell::sync::OnceCell;

/// A statically declared kind.
pub struct Kind {
  name: &'static str,
  capabilities: &'static [&'static Kind],
  parent: Option<&'static Kind>,
  assignable: OnceCell<Vec<&'static Kind>>,
}

impl Kind {
  /// Declare a kind. Use it to initialize a `static`; see also [`kind!`].
  ///
  /// The graph formed by parents and capabilities must be acyclic.
  ///
  /// [`kind!`]: crate::kind!
  pub const fn new(
    name: &'static str,
    capabilities: &'static [&'static Kind],
    parent: Option<&'static Kind>,
  ) -> Self {
    Kind { name, capabilities, parent, assignable: OnceCell::new() }
  }

  #[inline]
  pub fn name(&self) -> &'static str { self.name }

  /// Every kind this kind is assignable to, most specific first.
  pub fn assignable(&'static self) -> &'static [&'static Kind] {
    self.assignable.get_or_init(|| self.walk())
  }

  /// Whether a value of this kind may be treated as `other`.
  pub fn is_assignable_to(&'static self, other: &Kind) -> bool {
    self.assignable().iter().any(|k| *k == other)
  }

  fn walk(&'static self) -> Vec<&'static Kind> {
    let inherited: &[&'static Kind] = match self.parent {
      Some(parent) => parent.assignable(),
      None => &[],
    };

    let mut kinds = vec![self];
    for capability in self.capabilities {
      for kind in capability.assignable() {
        if !kinds.contains(kind) && !inherited.contains(kind) {
          kinds.push(*kind);
        }
      }
    }
    kinds.extend_from_slice(inherited);
    kinds
  }
}

impl PartialEq for Kind {
  #[inline]
  fn eq(&self, other: &Self) -> bool { std::ptr::eq(self, other) }
}

impl Eq for Kind {}

impl Hash for Kind {
  fn hash<H: Hasher>(&self, state: &mut H) { std::ptr::hash(self, state) }
}

impl Debug for Kind {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Kind")
      .field("name", &self.name)
      .field("parent", &self.parent.map(Kind::name))
      .finish()
  }
}

/// Types that belong to a single statically known kind.
///
/// Error types implement this to be routed by kind; event types implement it
/// to be the target of `filter_kind`.
pub trait Classified: 'static {
  fn classify() -> &'static Kind;
}

/// Values that report their kind at runtime, typically an enum over several
/// classified variants.
pub trait Kinded {
  fn kind(&self) -> &'static Kind;
}

/// Declare a `static` [`Kind`].
///
/// ```rust
/// use eventbus::{fault::ERROR, kind};
///
/// kind!(pub static TIMEOUT: "timeout" => ERROR;);
/// kind!(static RETRYABLE: "retryable";);
/// kind!(static CONNECT_TIMEOUT: "connect-timeout": [RETRYABLE] => TIMEOUT;);
///
/// assert!(CONNECT_TIMEOUT.is_assignable_to(&ERROR));
/// ```
#[macro_export]
macro_rules! kind {
  (@parent) => { None };
  (@parent $parent:path) => { Some(&$parent) };
  (
    $(#[$meta:meta])*
    $vis:vis static $ident:ident : $name:literal $(: [$($cap:ident),* $(,)?])? $(=> $parent:path)?;
  ) => {
    $(#[$meta])*
    $vis static $ident: $crate::kind::Kind = {
      static CAPABILITIES: &[&$crate::kind::Kind] = &[$($(&$cap),*)?];
      $crate::kind::Kind::new($name, CAPABILITIES, $crate::kind!(@parent $($parent)?))
    };
  };
}
