//! Set of cart rows checked for checkout.

use std::collections::BTreeSet;

use pickngo_core::CartItemId;

/// Cart item ids the user has checked.
///
/// Ordered so debug output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<CartItemId>,
}

impl SelectionSet {
    /// An empty selection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ids: BTreeSet::new(),
        }
    }

    /// Flip membership of `id`; returns whether it is now selected.
    pub fn toggle(&mut self, id: CartItemId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Drop `id`; returns whether it was selected.
    pub fn remove(&mut self, id: CartItemId) -> bool {
        self.ids.remove(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[must_use]
    pub fn contains(&self, id: CartItemId) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

impl FromIterator<CartItemId> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = CartItemId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
