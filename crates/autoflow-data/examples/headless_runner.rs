//! Loads a data directory, lays out a small smelting line and ticks it.
//!
//! ```text
//! RUST_LOG=autoflow_core=debug cargo run -p autoflow-data --example headless_runner [DATA_DIR] [TICKS]
//! ```

use autoflow_core::engine::AutomationEngine;
use autoflow_core::container::Container;
use autoflow_core::id::LocationId;
use autoflow_core::item::ItemStack;
use autoflow_core::memory::MemoryWorld;
use autoflow_core::scheduler::TickSummary;
use autoflow_core::spatial::TilePosition;
use autoflow_data::load_automation_data;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"));
    let ticks: u32 = match args.next() {
        Some(raw) => raw.parse()?,
        None => 60,
    };

    let data = load_automation_data(&dir)?;
    let registry = Arc::clone(&data.registry);
    let kind = |name: &str| {
        registry
            .kind_id(name)
            .ok_or_else(|| format!("data directory has no kind named '{name}'"))
    };
    let item = |name: &str| {
        registry
            .item_id(name)
            .ok_or_else(|| format!("data directory has no item named '{name}'"))
    };

    let home = LocationId(0);
    let mut world = MemoryWorld::new(Arc::clone(&registry));
    world.add_location(home);

    let bin = world.spawn(home, kind("ore_bin")?, TilePosition::new(0, 0))?;
    world.spawn(home, kind("furnace")?, TilePosition::new(1, 0))?;
    world.spawn(home, kind("conveyor")?, TilePosition::new(2, 0))?;
    let chest = world.spawn(home, kind("chest")?, TilePosition::new(3, 0))?;
    world.spawn(home, kind("gear_press")?, TilePosition::new(4, 0))?;
    if let Some(bin) = world.container_mut(bin) {
        bin.try_push(&ItemStack::new(item("iron_ore")?, 100))?;
        bin.try_push(&ItemStack::new(item("coal")?, 20))?;
    }

    let mut engine = AutomationEngine::new(Arc::clone(&registry), data.config);
    let changes = world.take_changes();
    engine.apply_changes(&world, &changes);
    tracing::info!(machines = engine.machine_count(), ticks, "starting run");

    let mut total = TickSummary::default();
    for _ in 0..ticks {
        if let Some(summary) = engine.tick(&mut world) {
            total += summary;
        }
        world.advance_time(1);
    }

    let gear = item("gear")?;
    let gears = world.container(chest).map_or(0, |c| c.quantity(gear));
    tracing::info!(passes = engine.passes(), ?total, gears, "run finished");
    Ok(())
}
