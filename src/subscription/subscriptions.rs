use smallvec::SmallVec;

/// Ordered, id-keyed storage for a bus's live subscriptions.
///
/// Ids are handed out by the owner; inserting an id that is already present
/// is a no-op, so the sequence never holds the same subscription twice.
pub(crate) struct Subscriptions<U> {
  items: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for Subscriptions<U> {
  fn default() -> Self { Self { items: SmallVec::new() } }
}

impl<U> Subscriptions<U> {
  /// Append `item` under `id`. Returns `false` if `id` was already present.
  pub fn insert(&mut self, id: usize, item: U) -> bool {
    if self.contains(id) {
      return false;
    }
    self.items.push((id, item));
    true
  }

  pub fn remove(&mut self, id: usize) -> Option<U> {
    self
      .items
      .iter()
      .position(|(i, _)| *i == id)
      .map(|pos| self.items.remove(pos).1)
  }

  #[inline]
  pub fn contains(&self, id: usize) -> bool { self.items.iter().any(|(i, _)| *i == id) }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Items in insertion order.
  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = &U> { self.items.iter().map(|(_, item)| item) }
}
