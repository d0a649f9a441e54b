use crate::id::ItemTypeId;
use serde::{Deserialize, Serialize};

/// A stack of fungible items.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_type: ItemTypeId,
    pub quantity: u32,
}

impl ItemStack {
    pub fn new(item_type: ItemTypeId, quantity: u32) -> Self {
        Self {
            item_type,
            quantity,
        }
    }
}

/// Capacity-bounded item storage backing a container.
///
/// Capacity counts items, not stacks. An optional filter restricts which item
/// types are accepted at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    pub stacks: Vec<ItemStack>,
    pub capacity: u32,
    #[serde(default)]
    pub filter: Option<Vec<ItemTypeId>>,
}

impl Storage {
    pub fn new(capacity: u32) -> Self {
        Self {
            stacks: Vec::new(),
            capacity,
            filter: None,
        }
    }

    /// Restrict the storage to the given item types.
    pub fn with_filter(mut self, accepted: Vec<ItemTypeId>) -> Self {
        self.filter = Some(accepted);
        self
    }

    /// Whether this item type may be stored here at all.
    pub fn accepts(&self, item_type: ItemTypeId) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|accepted| accepted.contains(&item_type))
    }

    /// Add fungible items. Returns the amount that didn't fit.
    #[must_use = "overflow count indicates items that did not fit"]
    pub fn add(&mut self, item_type: ItemTypeId, quantity: u32) -> u32 {
        if !self.accepts(item_type) {
            return quantity;
        }
        let space = self.capacity.saturating_sub(self.total());
        let to_add = quantity.min(space);
        let overflow = quantity - to_add;

        if to_add > 0 {
            if let Some(stack) = self.stacks.iter_mut().find(|s| s.item_type == item_type) {
                stack.quantity += to_add;
            } else {
                self.stacks.push(ItemStack::new(item_type, to_add));
            }
        }

        overflow
    }

    /// Insert the whole stack or nothing. Returns whether it was stored.
    pub fn try_insert(&mut self, stack: &ItemStack) -> bool {
        if !self.accepts(stack.item_type) || !self.has_space_for(stack.quantity) {
            return false;
        }
        let overflow = self.add(stack.item_type, stack.quantity);
        debug_assert_eq!(overflow, 0);
        true
    }

    /// Remove fungible items. Returns the amount actually removed.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn remove(&mut self, item_type: ItemTypeId, quantity: u32) -> u32 {
        if let Some(stack) = self.stacks.iter_mut().find(|s| s.item_type == item_type) {
            let to_remove = quantity.min(stack.quantity);
            stack.quantity -= to_remove;
            if stack.quantity == 0 {
                self.stacks.retain(|s| s.quantity > 0);
            }
            to_remove
        } else {
            0
        }
    }

    /// Get quantity of a specific item type.
    pub fn quantity(&self, item_type: ItemTypeId) -> u32 {
        self.stacks
            .iter()
            .find(|s| s.item_type == item_type)
            .map(|s| s.quantity)
            .unwrap_or(0)
    }

    /// Total items across all types.
    pub fn total(&self) -> u32 {
        self.stacks.iter().map(|s| s.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Check if storage has room for a specific quantity.
    pub fn has_space_for(&self, quantity: u32) -> bool {
        self.total().saturating_add(quantity) <= self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORE: ItemTypeId = ItemTypeId(0);
    const COAL: ItemTypeId = ItemTypeId(1);

    #[test]
    fn storage_add_and_remove() {
        let mut storage = Storage::new(100);
        assert_eq!(storage.add(ORE, 50), 0);
        assert_eq!(storage.quantity(ORE), 50);

        assert_eq!(storage.remove(ORE, 30), 30);
        assert_eq!(storage.quantity(ORE), 20);
    }

    #[test]
    fn storage_overflow() {
        let mut storage = Storage::new(10);
        assert_eq!(storage.add(ORE, 15), 5);
        assert_eq!(storage.quantity(ORE), 10);
    }

    #[test]
    fn storage_remove_more_than_available() {
        let mut storage = Storage::new(100);
        let _ = storage.add(ORE, 5);
        assert_eq!(storage.remove(ORE, 10), 5);
        assert!(storage.is_empty());
    }

    #[test]
    fn try_insert_is_all_or_nothing() {
        let mut storage = Storage::new(10);
        let _ = storage.add(COAL, 8);

        assert!(!storage.try_insert(&ItemStack::new(ORE, 3)));
        assert_eq!(storage.quantity(ORE), 0);
        assert_eq!(storage.total(), 8);

        assert!(storage.try_insert(&ItemStack::new(ORE, 2)));
        assert_eq!(storage.quantity(ORE), 2);
    }

    #[test]
    fn filter_rejects_other_types() {
        let mut storage = Storage::new(10).with_filter(vec![COAL]);
        assert!(!storage.accepts(ORE));
        assert!(!storage.try_insert(&ItemStack::new(ORE, 1)));
        assert_eq!(storage.add(ORE, 4), 4);
        assert!(storage.try_insert(&ItemStack::new(COAL, 1)));
    }

    #[test]
    fn multiple_types_share_capacity() {
        let mut storage = Storage::new(100);
        let _ = storage.add(ORE, 30);
        let _ = storage.add(COAL, 20);
        assert_eq!(storage.total(), 50);
        assert!(storage.has_space_for(50));
        assert!(!storage.has_space_for(51));
    }
}
