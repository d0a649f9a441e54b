//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::error::ObjectError;
use crate::id::*;
use crate::item::ItemStack;
use crate::memory::MemoryWorld;
use crate::registry::{KindDef, RecipeEntry, Registry, RegistryBuilder};
use std::sync::Arc;

// ===========================================================================
// Standard catalog
// ===========================================================================

/// Ids of everything in the standard test registry.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    pub ore: ItemTypeId,
    pub coal: ItemTypeId,
    pub bar: ItemTypeId,
    pub syrup: ItemTypeId,

    /// 5 ore + 1 coal -> 1 bar.
    pub smelt: RecipeId,
    /// Nothing -> 1 syrup.
    pub tap: RecipeId,

    pub furnace: KindId,
    pub tapper: KindId,
    /// 100-item chest.
    pub chest: KindId,
    /// Holds a single item.
    pub small_chest: KindId,
    pub path: KindId,

    pub furnace_duration: u32,
    pub tapper_duration: u32,
}

/// A small registry covering every role.
pub fn standard_registry() -> (Arc<Registry>, Catalog) {
    let furnace_duration = 3;
    let tapper_duration = 2;

    let mut b = RegistryBuilder::new();
    let ore = b.register_item("ore");
    let coal = b.register_item("coal");
    let bar = b.register_item("bar");
    let syrup = b.register_item("syrup");

    let smelt = b.register_recipe(
        "smelt",
        vec![
            RecipeEntry {
                item: ore,
                quantity: 5,
            },
            RecipeEntry {
                item: coal,
                quantity: 1,
            },
        ],
        RecipeEntry {
            item: bar,
            quantity: 1,
        },
        furnace_duration,
    );
    let tap = b.register_recipe(
        "tap",
        Vec::new(),
        RecipeEntry {
            item: syrup,
            quantity: 1,
        },
        tapper_duration,
    );

    let furnace = b.register_kind(KindDef::machine("furnace", vec![smelt]));
    let tapper = b.register_kind(KindDef::machine("tapper", vec![tap]));
    let chest = b.register_kind(KindDef::container("chest", 100));
    let small_chest = b.register_kind(KindDef::container("small_chest", 1));
    let path = b.register_kind(KindDef::connector("path"));

    let registry = match b.build() {
        Ok(registry) => Arc::new(registry),
        Err(err) => panic!("standard registry is invalid: {err}"),
    };

    (
        registry,
        Catalog {
            ore,
            coal,
            bar,
            syrup,
            smelt,
            tap,
            furnace,
            tapper,
            chest,
            small_chest,
            path,
            furnace_duration,
            tapper_duration,
        },
    )
}

// ===========================================================================
// World helpers
// ===========================================================================

/// Push items into a container, failing if any stack is rejected.
pub fn fill(
    world: &mut MemoryWorld,
    container: ObjectId,
    items: &[(ItemTypeId, u32)],
) -> Result<(), ObjectError> {
    let target = world
        .container_mut(container)
        .ok_or_else(|| ObjectError::InvalidState(format!("{container:?} is not a container")))?;
    for &(item_type, quantity) in items {
        if !target.try_push(&ItemStack::new(item_type, quantity))? {
            return Err(ObjectError::Failed(format!(
                "{container:?} rejected {quantity} of {item_type:?}"
            )));
        }
    }
    Ok(())
}

/// Total quantity of an item across the given containers.
pub fn total_in(world: &MemoryWorld, containers: &[ObjectId], item_type: ItemTypeId) -> u32 {
    containers
        .iter()
        .filter_map(|&id| world.container(id))
        .map(|c| c.quantity(item_type))
        .sum()
}
