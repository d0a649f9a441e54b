//! Storage-capable world objects and the ordered views machines work with.
//!
//! A [`Container`] is anything that can accept or yield items: chests,
//! hoppers, another device's input buffer. Machines never see containers
//! individually; they receive a [`ContainerSet`], an ordered view over the
//! containers connected to them, borrowed for the duration of one call.

use crate::error::ObjectError;
use crate::id::{ItemTypeId, ObjectId};
use crate::item::{ItemStack, Storage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Container trait
// ---------------------------------------------------------------------------

/// Uniform interface over storage-capable objects.
pub trait Container: fmt::Debug {
    /// Snapshot of the stacks currently stored.
    fn stacks(&self) -> Vec<ItemStack>;

    /// Quantity of one item type currently stored.
    fn quantity(&self, item_type: ItemTypeId) -> u32 {
        self.stacks()
            .iter()
            .filter(|s| s.item_type == item_type)
            .map(|s| s.quantity)
            .sum()
    }

    /// Store the whole stack or nothing.
    ///
    /// `Ok(false)` is a rejection (full, wrong type) and must leave the
    /// container unchanged.
    fn try_push(&mut self, item: &ItemStack) -> Result<bool, ObjectError>;

    /// Remove up to `max` items of a type. Returns the amount removed.
    fn take(&mut self, item_type: ItemTypeId, max: u32) -> Result<u32, ObjectError>;
}

// ---------------------------------------------------------------------------
// Per-container options
// ---------------------------------------------------------------------------

/// How eagerly a container is used for one direction of flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    #[default]
    Allow,
    /// Tried before every `Allow` container.
    Prefer,
    /// Never used for this direction.
    Disable,
}

/// Player-facing automation options for a single container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerOptions {
    /// Preference when machines push finished products.
    #[serde(default)]
    pub store: Preference,
    /// Preference when machines pull inputs.
    #[serde(default)]
    pub take: Preference,
}

impl ContainerOptions {
    /// A container automation ignores in both directions.
    pub fn disabled() -> Self {
        Self {
            store: Preference::Disable,
            take: Preference::Disable,
        }
    }

    /// An output-only container: preferred for storing, never taken from.
    pub fn output_only() -> Self {
        Self {
            store: Preference::Prefer,
            take: Preference::Disable,
        }
    }
}

// ---------------------------------------------------------------------------
// Chest
// ---------------------------------------------------------------------------

/// Plain storage container backed by a [`Storage`].
#[derive(Debug, Clone, PartialEq)]
pub struct Chest {
    storage: Storage,
}

impl Chest {
    pub fn new(capacity: u32) -> Self {
        Self {
            storage: Storage::new(capacity),
        }
    }

    pub fn with_storage(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }
}

impl Container for Chest {
    fn stacks(&self) -> Vec<ItemStack> {
        self.storage.stacks.clone()
    }

    fn quantity(&self, item_type: ItemTypeId) -> u32 {
        self.storage.quantity(item_type)
    }

    fn try_push(&mut self, item: &ItemStack) -> Result<bool, ObjectError> {
        Ok(self.storage.try_insert(item))
    }

    fn take(&mut self, item_type: ItemTypeId, max: u32) -> Result<u32, ObjectError> {
        Ok(self.storage.remove(item_type, max))
    }
}

// ---------------------------------------------------------------------------
// ContainerSet
// ---------------------------------------------------------------------------

/// An ordered, borrowed view over the containers connected to one machine.
///
/// Order is significant: pushes go to the first container that accepts the
/// whole item, and consumption drains containers front to back.
pub struct ContainerSet<'a> {
    entries: Vec<(ObjectId, &'a mut dyn Container)>,
}

impl fmt::Debug for ContainerSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter().map(|(id, _)| id)).finish()
    }
}

impl<'a> ContainerSet<'a> {
    pub fn new(entries: Vec<(ObjectId, &'a mut dyn Container)>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Container handles in view order.
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    /// Total quantity of an item type across every container in the view.
    pub fn available(&self, item_type: ItemTypeId) -> u32 {
        self.entries
            .iter()
            .map(|(_, c)| c.quantity(item_type))
            .fold(0u32, u32::saturating_add)
    }

    /// Whether every requirement can be met from the view as a whole.
    pub fn can_supply(&self, requirements: &[ItemStack]) -> bool {
        aggregate(requirements)
            .iter()
            .all(|(&item_type, &quantity)| self.available(item_type) >= quantity)
    }

    /// Remove every requirement from the view, or nothing at all.
    ///
    /// Returns `Ok(false)` without touching any container when the view
    /// cannot supply everything. Containers are drained front to back. A
    /// container that hands over more or less than asked aborts the whole
    /// consume: everything taken so far, surplus included, goes back.
    pub fn consume(&mut self, requirements: &[ItemStack]) -> Result<bool, ObjectError> {
        if !self.can_supply(requirements) {
            return Ok(false);
        }
        let totals = aggregate(requirements);

        let mut taken: Vec<(usize, ItemTypeId, u32)> = Vec::new();
        for (&item_type, &expected) in &totals {
            let mut remaining = expected;
            for idx in 0..self.entries.len() {
                if remaining == 0 {
                    break;
                }
                let (id, container) = &mut self.entries[idx];
                let id = *id;
                let want = remaining.min(container.quantity(item_type));
                if want == 0 {
                    continue;
                }
                let result = container.take(item_type, want);
                match result {
                    Ok(got) if got == want => {
                        taken.push((idx, item_type, got));
                        remaining -= got;
                    }
                    Ok(got) => {
                        if got > 0 {
                            taken.push((idx, item_type, got));
                        }
                        self.restore(&taken);
                        return Err(ObjectError::TakeMismatch {
                            container: id,
                            item_type,
                            expected: want,
                            taken: got,
                        });
                    }
                    Err(err) => {
                        self.restore(&taken);
                        return Err(err);
                    }
                }
            }
        }
        Ok(true)
    }

    /// Offer the whole item to each container in order.
    ///
    /// Returns the container that accepted it, or `None` when every
    /// container rejected it. The item is never split.
    pub fn push(&mut self, item: &ItemStack) -> Result<Option<ObjectId>, ObjectError> {
        for (id, container) in self.entries.iter_mut() {
            if container.try_push(item)? {
                return Ok(Some(*id));
            }
        }
        Ok(None)
    }

    /// Hand back items taken by an aborted `consume`, newest first.
    fn restore(&mut self, taken: &[(usize, ItemTypeId, u32)]) {
        for &(idx, item_type, quantity) in taken.iter().rev() {
            let (id, container) = &mut self.entries[idx];
            match container.try_push(&ItemStack::new(item_type, quantity)) {
                Ok(true) => {}
                Ok(false) | Err(_) => {
                    tracing::warn!(
                        container = ?id,
                        ?item_type,
                        quantity,
                        "could not return items after an aborted consume"
                    );
                }
            }
        }
    }
}

/// Merge requirements of the same item type.
fn aggregate(requirements: &[ItemStack]) -> BTreeMap<ItemTypeId, u32> {
    let mut totals = BTreeMap::new();
    for stack in requirements {
        let entry = totals.entry(stack.item_type).or_insert(0u32);
        *entry = entry.saturating_add(stack.quantity);
    }
    totals
}
