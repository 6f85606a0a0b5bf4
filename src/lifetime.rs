//! Variable strength references.
//!
//! A [`LifetimeHandle`] refers to a shared target either strongly (it keeps
//! the target alive) or weakly (it only observes whether the target is still
//! alive). Liveness is tracked independently of the handle's own mode: the
//! target stays reachable through [`LifetimeHandle::value`] for as long as any
//! strong holder exists anywhere.

use std::sync::{Arc, Weak};

/// A dual-mode reference to `T`. New handles start strong.
pub struct LifetimeHandle<T: ?Sized> {
  weak: Weak<T>,
  strong: Option<Arc<T>>,
}

impl<T: ?Sized> LifetimeHandle<T> {
  pub fn new(target: Arc<T>) -> Self { Self { weak: Arc::downgrade(&target), strong: Some(target) } }

  /// Whether no strong holder of the target remains.
  #[inline]
  pub fn is_reclaimed(&self) -> bool { self.weak.strong_count() == 0 }

  #[inline]
  pub fn is_strong(&self) -> bool { self.strong.is_some() }

  /// Switch this handle's own contribution to keeping the target alive.
  ///
  /// Weakening may drop the target right away if this handle was its last
  /// strong holder. Strengthening a reclaimed target has no effect.
  pub fn set_strong(&mut self, strong: bool) {
    if !strong {
      self.strong = None;
    } else if self.strong.is_none() {
      self.strong = self.weak.upgrade();
    }
  }

  /// The target, or `None` once it has been reclaimed.
  #[inline]
  pub fn value(&self) -> Option<Arc<T>> { self.weak.upgrade() }
}

impl<T: ?Sized> Clone for LifetimeHandle<T> {
  fn clone(&self) -> Self { Self { weak: self.weak.clone(), strong: self.strong.clone() } }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn weak_handle_sees_target_held_elsewhere() {
    let object = Arc::new(1);
    let mut handle = LifetimeHandle::new(object.clone());
    handle.set_strong(false);

    assert!(!handle.is_reclaimed());
    assert_eq!(handle.value().as_deref(), Some(&1));
  }

  #[test]
  fn weak_handle_alone_lets_target_go() {
    let mut handle = LifetimeHandle::new(Arc::new(1));
    handle.set_strong(false);

    assert!(handle.is_reclaimed());
    assert!(handle.value().is_none());
  }

  #[test]
  fn strong_handle_keeps_target() {
    let handle = LifetimeHandle::new(Arc::new(String::from("kept")));

    assert!(handle.is_strong());
    assert_eq!(handle.value().as_deref().map(String::as_str), Some("kept"));
  }

  #[test]
  fn value_is_the_same_allocation() {
    let expected = Arc::new(5);
    let handle = LifetimeHandle::new(expected.clone());

    let value = handle.value().unwrap();
    assert!(Arc::ptr_eq(&expected, &value));
  }

  #[test]
  fn reclaimed_target_is_never_resurrected() {
    let mut handle = LifetimeHandle::new(Arc::new(()));
    handle.set_strong(false);
    handle.set_strong(true);

    assert!(!handle.is_strong());
    assert!(handle.is_reclaimed());
  }

  #[test]
  fn toggling_back_to_strong_keeps_target_after_other_holders_leave() {
    let object = Arc::new(3);
    let mut handle = LifetimeHandle::new(object.clone());
    handle.set_strong(false);
    handle.set_strong(true);
    drop(object);

    assert_eq!(handle.value().as_deref(), Some(&3));
  }

  #[test]
  fn works_with_trait_objects() {
    let target: Arc<dyn Fn() -> u8 + Send + Sync> = Arc::new(|| 9);
    let mut handle = LifetimeHandle::new(target);
    assert_eq!(handle.value().map(|f| f()), Some(9));

    handle.set_strong(false);
    assert!(handle.is_reclaimed());
  }
}
