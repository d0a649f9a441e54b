//! Integration tests for the Autoflow automation engine.
//!
//! These tests exercise end-to-end behavior through `AutomationEngine` and
//! `MemoryWorld`: discovery, rebuilds, the pull/push protocol across ticks,
//! and item conservation.

use autoflow_core::config::EngineConfig;
use autoflow_core::container::{Container, ContainerOptions, Preference};
use autoflow_core::engine::AutomationEngine;
use autoflow_core::id::*;
use autoflow_core::item::ItemStack;
use autoflow_core::machine::{Machine, MachineState};
use autoflow_core::memory::MemoryWorld;
use autoflow_core::spatial::TilePosition;
use autoflow_core::test_utils::*;
use std::sync::Arc;

const HOME: LocationId = LocationId(0);
const BARN: LocationId = LocationId(1);

fn setup() -> (AutomationEngine, MemoryWorld, Catalog) {
    let (registry, cat) = standard_registry();
    let mut world = MemoryWorld::new(Arc::clone(&registry));
    world.add_location(HOME);
    world.add_location(BARN);
    let engine = AutomationEngine::new(registry, EngineConfig::default());
    (engine, world, cat)
}

fn sync(engine: &mut AutomationEngine, world: &mut MemoryWorld) {
    let changes = world.take_changes();
    engine.apply_changes(world, &changes);
}

fn at(x: i32, y: i32) -> TilePosition {
    TilePosition::new(x, y)
}

// ===========================================================================
// Test 1: Furnace chain
// ===========================================================================
//
// [input chest] [furnace] [output chest]
// Ore and coal flow in, bars flow out, nothing is lost.

#[test]
fn furnace_smelts_end_to_end() {
    let (mut engine, mut world, cat) = setup();
    let input = world.spawn(HOME, cat.chest, at(0, 0)).unwrap();
    let furnace = world.spawn(HOME, cat.furnace, at(1, 0)).unwrap();
    let output = world.spawn(HOME, cat.chest, at(2, 0)).unwrap();
    fill(&mut world, input, &[(cat.ore, 10), (cat.coal, 2)]).unwrap();
    world
        .set_container_options(
            input,
            ContainerOptions {
                store: Preference::Disable,
                take: Preference::Allow,
            },
        )
        .unwrap();
    world
        .set_container_options(output, ContainerOptions::output_only())
        .unwrap();
    sync(&mut engine, &mut world);

    for _ in 0..20 {
        engine.tick(&mut world);
        world.advance_time(1);
    }

    assert_eq!(world.machine(furnace).unwrap().state(), MachineState::Empty);
    assert_eq!(total_in(&world, &[output], cat.bar), 2);
    assert_eq!(total_in(&world, &[input], cat.ore), 0);
    assert_eq!(total_in(&world, &[input], cat.coal), 0);
}

// ===========================================================================
// Test 2: First container full, second has room
// ===========================================================================

#[test]
fn push_skips_full_container() {
    let (mut engine, mut world, cat) = setup();
    let tapper = world.spawn(HOME, cat.tapper, at(0, 0)).unwrap();
    // North is visited before East.
    let c1 = world.spawn(HOME, cat.small_chest, at(0, -1)).unwrap();
    let c2 = world.spawn(HOME, cat.chest, at(1, 0)).unwrap();
    fill(&mut world, c1, &[(cat.ore, 1)]).unwrap();
    sync(&mut engine, &mut world);

    let meta = engine.location_graph(HOME).unwrap().machine(tapper).unwrap().clone();
    assert_eq!(meta.push_targets, vec![c1, c2]);

    engine.tick(&mut world);
    world.advance_time(cat.tapper_duration);
    let summary = engine.tick(&mut world).unwrap();

    assert_eq!(summary.delivered, 1);
    assert_eq!(world.machine(tapper).unwrap().state(), MachineState::Empty);
    assert_eq!(total_in(&world, &[c2], cat.syrup), 1);
    assert_eq!(world.container(c1).unwrap().stacks(), vec![ItemStack::new(cat.ore, 1)]);
}

// ===========================================================================
// Test 3: Empty machine, no containers
// ===========================================================================

#[test]
fn lonely_machine_stays_empty() {
    let (mut engine, mut world, cat) = setup();
    let furnace = world.spawn(HOME, cat.furnace, at(0, 0)).unwrap();
    sync(&mut engine, &mut world);

    let graph = engine.location_graph(HOME).unwrap();
    assert!(graph.machine(furnace).unwrap().connections.is_empty());

    for _ in 0..3 {
        let summary = engine.tick(&mut world).unwrap();
        assert_eq!(summary.idle, 1);
        assert_eq!(summary.failed, 0);
    }
    assert_eq!(world.machine(furnace).unwrap().state(), MachineState::Empty);
}

// ===========================================================================
// Test 4: Only the changed location is recomputed
// ===========================================================================

#[test]
fn contents_change_rebuilds_one_location() {
    let (mut engine, mut world, cat) = setup();
    world.spawn(HOME, cat.furnace, at(0, 0)).unwrap();
    world.spawn(BARN, cat.tapper, at(0, 0)).unwrap();
    sync(&mut engine, &mut world);

    let home_before = engine.location_graph(HOME).unwrap();
    let barn_before = engine.location_graph(BARN).unwrap();

    world.spawn(HOME, cat.chest, at(1, 0)).unwrap();
    let changes = world.take_changes();
    assert!(!changes.locations_changed);
    engine.apply_changes(&world, &changes);

    assert!(Arc::ptr_eq(&engine.location_graph(BARN).unwrap(), &barn_before));
    assert!(!Arc::ptr_eq(&engine.location_graph(HOME).unwrap(), &home_before));
}

#[test]
fn rebuild_of_unchanged_world_is_idempotent() {
    let (mut engine, mut world, cat) = setup();
    for x in 0..4 {
        world.spawn(HOME, cat.furnace, at(x * 2, 0)).unwrap();
        world.spawn(HOME, cat.chest, at(x * 2 + 1, 0)).unwrap();
    }
    world.spawn(HOME, cat.path, at(0, 1)).unwrap();
    world.spawn(HOME, cat.chest, at(0, 2)).unwrap();
    sync(&mut engine, &mut world);
    let first = engine.location_graph(HOME).unwrap();

    engine.on_locations_changed(&world);
    let second = engine.location_graph(HOME).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(*first, *second);

    engine.on_location_contents_changed(&world, HOME);
    assert_eq!(*engine.location_graph(HOME).unwrap(), *first);
}

// ===========================================================================
// Test 5: Location set changes
// ===========================================================================

#[test]
fn unloaded_location_disappears() {
    let (mut engine, mut world, cat) = setup();
    world.spawn(HOME, cat.furnace, at(0, 0)).unwrap();
    world.spawn(BARN, cat.tapper, at(0, 0)).unwrap();
    sync(&mut engine, &mut world);
    assert_eq!(engine.mapping().locations(), vec![HOME, BARN]);

    world.remove_location(BARN);
    sync(&mut engine, &mut world);
    assert_eq!(engine.mapping().locations(), vec![HOME]);
    assert_eq!(engine.machine_count(), 1);
}

// ===========================================================================
// Test 6: Backpressure
// ===========================================================================

#[test]
fn done_machine_waits_for_room() {
    let (mut engine, mut world, cat) = setup();
    let tapper = world.spawn(HOME, cat.tapper, at(0, 0)).unwrap();
    let slot = world.spawn(HOME, cat.small_chest, at(1, 0)).unwrap();
    sync(&mut engine, &mut world);

    // First cycle fills the slot, second blocks.
    for _ in 0..2 {
        engine.tick(&mut world);
        world.advance_time(cat.tapper_duration);
        engine.tick(&mut world);
    }
    assert_eq!(total_in(&world, &[slot], cat.syrup), 1);
    engine.tick(&mut world);
    world.advance_time(cat.tapper_duration);
    for _ in 0..10 {
        assert_eq!(engine.tick(&mut world).unwrap().blocked, 1);
    }
    assert_eq!(world.machine(tapper).unwrap().state(), MachineState::Done);

    // Make room; the product goes out on the next pass.
    let taken = world.container_mut(slot).unwrap().take(cat.syrup, 1).unwrap();
    assert_eq!(taken, 1);
    assert_eq!(engine.tick(&mut world).unwrap().delivered, 1);
    assert_eq!(world.machine(tapper).unwrap().state(), MachineState::Empty);
    assert_eq!(total_in(&world, &[slot], cat.syrup), 1);
}

// ===========================================================================
// Test 7: Connectors and chained chests
// ===========================================================================

#[test]
fn shared_storage_through_path() {
    let (mut engine, mut world, cat) = setup();
    // [tapper][path][path][chest]
    let tapper = world.spawn(HOME, cat.tapper, at(0, 0)).unwrap();
    world.spawn(HOME, cat.path, at(1, 0)).unwrap();
    world.spawn(HOME, cat.path, at(2, 0)).unwrap();
    let chest = world.spawn(HOME, cat.chest, at(3, 0)).unwrap();
    sync(&mut engine, &mut world);

    let meta = engine.location_graph(HOME).unwrap().machine(tapper).unwrap().clone();
    assert_eq!(meta.push_targets, vec![chest]);

    engine.tick(&mut world);
    world.advance_time(cat.tapper_duration);
    engine.tick(&mut world);
    assert_eq!(total_in(&world, &[chest], cat.syrup), 1);
}

#[test]
fn disabled_container_is_ignored() {
    let (mut engine, mut world, cat) = setup();
    let furnace = world.spawn(HOME, cat.furnace, at(0, 0)).unwrap();
    let chest = world.spawn(HOME, cat.chest, at(1, 0)).unwrap();
    fill(&mut world, chest, &[(cat.ore, 5), (cat.coal, 1)]).unwrap();
    world
        .set_container_options(chest, ContainerOptions::disabled())
        .unwrap();
    sync(&mut engine, &mut world);

    engine.tick(&mut world);
    assert_eq!(world.machine(furnace).unwrap().state(), MachineState::Empty);
    assert_eq!(total_in(&world, &[chest], cat.ore), 5);
}

// ===========================================================================
// Test 8: Two machines share one chest
// ===========================================================================

#[test]
fn machines_share_inputs_in_captured_order() {
    let (mut engine, mut world, cat) = setup();
    // [furnace A][chest][furnace B]; only enough input for one cycle.
    let a = world.spawn(HOME, cat.furnace, at(0, 0)).unwrap();
    let chest = world.spawn(HOME, cat.chest, at(1, 0)).unwrap();
    let b = world.spawn(HOME, cat.furnace, at(2, 0)).unwrap();
    fill(&mut world, chest, &[(cat.ore, 5), (cat.coal, 1)]).unwrap();
    sync(&mut engine, &mut world);

    let summary = engine.tick(&mut world).unwrap();
    assert_eq!(summary.started, 1);
    assert_eq!(summary.idle, 1);
    assert_eq!(world.machine(a).unwrap().state(), MachineState::Processing);
    assert_eq!(world.machine(b).unwrap().state(), MachineState::Empty);
}

// ===========================================================================
// Test 9: Item conservation over a long run
// ===========================================================================

#[test]
fn items_are_conserved() {
    let (mut engine, mut world, cat) = setup();
    let mut chests = Vec::new();
    for row in 0..3 {
        let y = row * 3;
        world.spawn(HOME, cat.furnace, at(0, y)).unwrap();
        let chest = world.spawn(HOME, cat.chest, at(1, y)).unwrap();
        world.spawn(HOME, cat.furnace, at(2, y)).unwrap();
        fill(&mut world, chest, &[(cat.ore, 23), (cat.coal, 7)]).unwrap();
        chests.push(chest);
    }
    sync(&mut engine, &mut world);

    for _ in 0..100 {
        engine.tick(&mut world);
        world.advance_time(1);
    }

    // Each bar costs 5 ore and 1 coal; ore runs out after 4 bars per chest.
    let bars = total_in(&world, &chests, cat.bar);
    let ore = total_in(&world, &chests, cat.ore);
    let coal = total_in(&world, &chests, cat.coal);
    assert_eq!(bars, 12);
    assert_eq!(ore + bars * 5, 69);
    assert_eq!(coal + bars, 21);
}
