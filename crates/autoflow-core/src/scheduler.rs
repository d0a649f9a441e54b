//! The per-tick automation pass.
//!
//! Every captured machine is visited once per pass, locations in ascending
//! order and machines in captured order:
//!
//! - `Empty`: pull from the pull sources.
//! - `Done`: push the product into the first push target that accepts all of
//!   it, then `reset(true)`. If nobody accepts, the machine stays `Done`.
//! - `Processing`: skipped.
//!
//! Failures are isolated per machine and logged; the pass always finishes.

use crate::error::ObjectError;
use crate::graph::{LocationMapping, MachineMetadata};
use crate::id::{LocationId, ObjectId};
use crate::item::ItemStack;
use crate::machine::MachineState;
use crate::world::{MachineView, World};
use std::ops::AddAssign;

/// What happened to one machine during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineOutcome {
    /// Pulled inputs and started a cycle.
    Started,
    /// Empty with nothing eligible to pull.
    Idle,
    /// Pushed its product and reset.
    Delivered,
    /// Done, but no target accepted the product.
    Blocked,
    /// Mid-cycle; left alone.
    Busy,
    /// The handle no longer resolves to a machine.
    Stale,
}

/// Counters for one or more passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub visited: usize,
    pub started: usize,
    pub idle: usize,
    pub delivered: usize,
    pub blocked: usize,
    pub busy: usize,
    pub stale: usize,
    pub failed: usize,
}

impl TickSummary {
    fn record(&mut self, outcome: MachineOutcome) {
        match outcome {
            MachineOutcome::Started => self.started += 1,
            MachineOutcome::Idle => self.idle += 1,
            MachineOutcome::Delivered => self.delivered += 1,
            MachineOutcome::Blocked => self.blocked += 1,
            MachineOutcome::Busy => self.busy += 1,
            MachineOutcome::Stale => self.stale += 1,
        }
    }
}

impl AddAssign for TickSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.visited += rhs.visited;
        self.started += rhs.started;
        self.idle += rhs.idle;
        self.delivered += rhs.delivered;
        self.blocked += rhs.blocked;
        self.busy += rhs.busy;
        self.stale += rhs.stale;
        self.failed += rhs.failed;
    }
}

/// Run one pass over every machine in the mapping.
pub fn run_pass<W: World>(mapping: &LocationMapping, world: &mut W) -> TickSummary {
    let mut summary = TickSummary::default();
    for (location, graph) in mapping.iter() {
        for meta in graph.machines() {
            summary.visited += 1;
            match process_machine(world, meta) {
                Ok(outcome) => {
                    if outcome == MachineOutcome::Stale {
                        tracing::debug!(?location, machine = ?meta.machine, "skipping stale machine handle");
                    }
                    summary.record(outcome);
                }
                Err(err) => report_failure(location, meta, &err, &mut summary),
            }
        }
    }
    summary
}

fn report_failure(
    location: LocationId,
    meta: &MachineMetadata,
    err: &ObjectError,
    summary: &mut TickSummary,
) {
    tracing::warn!(?location, machine = ?meta.machine, kind = ?meta.kind, %err, "automation failed for machine");
    summary.failed += 1;
}

/// Apply one step of the pull/push protocol to a single machine.
pub fn process_machine<W: World>(
    world: &mut W,
    meta: &MachineMetadata,
) -> Result<MachineOutcome, ObjectError> {
    let Some(state) = world.machine_state(meta.machine) else {
        return Ok(MachineOutcome::Stale);
    };

    match state {
        MachineState::Processing => Ok(MachineOutcome::Busy),
        MachineState::Empty => {
            let pulled = world.with_machine(meta.machine, &meta.pull_sources, |mut view| {
                view.machine.pull(&mut view.containers)
            });
            let Some(started) = pulled else {
                return Ok(MachineOutcome::Stale);
            };
            if started? {
                tracing::trace!(machine = ?meta.machine, "started cycle");
                Ok(MachineOutcome::Started)
            } else {
                Ok(MachineOutcome::Idle)
            }
        }
        MachineState::Done => {
            let Some(delivery) = world.with_machine(meta.machine, &meta.push_targets, deliver)
            else {
                return Ok(MachineOutcome::Stale);
            };
            match delivery? {
                (item, Some(target)) => {
                    tracing::trace!(machine = ?meta.machine, container = ?target, ?item, "delivered output");
                    Ok(MachineOutcome::Delivered)
                }
                (item, None) => {
                    tracing::trace!(machine = ?meta.machine, ?item, "no container accepted output");
                    Ok(MachineOutcome::Blocked)
                }
            }
        }
    }
}

/// Push the finished product and reset only once a container took it.
fn deliver(mut view: MachineView<'_>) -> Result<(ItemStack, Option<ObjectId>), ObjectError> {
    let item = view.machine.output().ok_or(ObjectError::MissingOutput)?;
    let target = view.containers.push(&item)?;
    if target.is_some() {
        view.machine.reset(true);
    }
    Ok((item, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, LocationGraph};
    use crate::id::KindId;
    use crate::machine::Machine;
    use crate::memory::MemoryWorld;
    use crate::resolver::ConnectionResolver;
    use crate::spatial::TilePosition;
    use crate::test_utils::{fill, standard_registry, Catalog};
    use std::collections::BTreeSet;

    const HOME: LocationId = LocationId(0);

    fn setup() -> (MemoryWorld, Catalog) {
        let (registry, catalog) = standard_registry();
        let mut world = MemoryWorld::new(registry);
        world.add_location(HOME);
        (world, catalog)
    }

    fn mapping_for(world: &MemoryWorld) -> LocationMapping {
        let extra = BTreeSet::new();
        let mut mapping = LocationMapping::new();
        GraphBuilder::new(world.registry(), ConnectionResolver::default(), &extra)
            .rebuild_all(&mut mapping, world);
        mapping
    }

    #[test]
    fn empty_machine_pulls_and_starts() {
        let (mut world, cat) = setup();
        let furnace = world.spawn(HOME, cat.furnace, TilePosition::new(0, 0)).unwrap();
        let chest = world.spawn(HOME, cat.chest, TilePosition::new(1, 0)).unwrap();
        fill(&mut world, chest, &[(cat.ore, 5), (cat.coal, 1)]).unwrap();

        let summary = run_pass(&mapping_for(&world), &mut world);
        assert_eq!(summary.started, 1);
        assert_eq!(world.machine(furnace).unwrap().state(), MachineState::Processing);
        assert!(world.container(chest).unwrap().stacks().is_empty());
    }

    #[test]
    fn processing_machine_is_skipped() {
        let (mut world, cat) = setup();
        let furnace = world.spawn(HOME, cat.furnace, TilePosition::new(0, 0)).unwrap();
        let chest = world.spawn(HOME, cat.chest, TilePosition::new(1, 0)).unwrap();
        fill(&mut world, chest, &[(cat.ore, 10), (cat.coal, 2)]).unwrap();
        let mapping = mapping_for(&world);

        run_pass(&mapping, &mut world);
        let summary = run_pass(&mapping, &mut world);
        assert_eq!(summary.busy, 1);
        // The second batch of inputs is untouched.
        assert_eq!(world.container(chest).unwrap().quantity(cat.ore), 5);
        assert_eq!(world.machine(furnace).unwrap().state(), MachineState::Processing);
    }

    #[test]
    fn done_machine_delivers_and_resets() {
        let (mut world, cat) = setup();
        let tapper = world.spawn(HOME, cat.tapper, TilePosition::new(0, 0)).unwrap();
        let chest = world.spawn(HOME, cat.chest, TilePosition::new(1, 0)).unwrap();
        let mapping = mapping_for(&world);

        run_pass(&mapping, &mut world);
        world.advance_time(cat.tapper_duration);
        assert_eq!(world.machine(tapper).unwrap().state(), MachineState::Done);

        let summary = run_pass(&mapping, &mut world);
        assert_eq!(summary.delivered, 1);
        assert_eq!(world.machine(tapper).unwrap().state(), MachineState::Empty);
        assert_eq!(world.container(chest).unwrap().quantity(cat.syrup), 1);
    }

    #[test]
    fn blocked_machine_stays_done() {
        let (mut world, cat) = setup();
        let tapper = world.spawn(HOME, cat.tapper, TilePosition::new(0, 0)).unwrap();
        let slot = world.spawn(HOME, cat.small_chest, TilePosition::new(1, 0)).unwrap();
        fill(&mut world, slot, &[(cat.ore, 1)]).unwrap();
        let mapping = mapping_for(&world);

        run_pass(&mapping, &mut world);
        world.advance_time(cat.tapper_duration);

        for _ in 0..5 {
            let summary = run_pass(&mapping, &mut world);
            assert_eq!(summary.blocked, 1);
            let machine = world.machine(tapper).unwrap();
            assert_eq!(machine.state(), MachineState::Done);
            assert_eq!(machine.output(), Some(ItemStack::new(cat.syrup, 1)));
        }
        assert_eq!(world.container(slot).unwrap().quantity(cat.syrup), 0);
    }

    #[test]
    fn stale_machine_is_skipped() {
        let (mut world, cat) = setup();
        let furnace = world.spawn(HOME, cat.furnace, TilePosition::new(0, 0)).unwrap();
        let mapping = mapping_for(&world);
        world.despawn(furnace).unwrap();

        let summary = run_pass(&mapping, &mut world);
        assert_eq!(summary.visited, 1);
        assert_eq!(summary.stale, 1);
        assert_eq!(summary.failed, 0);
    }

    #[test]
    fn done_without_output_is_a_failure() {
        #[derive(Debug)]
        struct Liar;
        impl Machine for Liar {
            fn state(&self) -> MachineState {
                MachineState::Done
            }
            fn pull(
                &mut self,
                _inputs: &mut crate::container::ContainerSet<'_>,
            ) -> Result<bool, ObjectError> {
                Ok(false)
            }
            fn output(&self) -> Option<ItemStack> {
                None
            }
            fn reset(&mut self, _successful: bool) {
                panic!("reset must not be called without a delivery");
            }
        }

        let (mut world, cat) = setup();
        let liar = world
            .insert(
                HOME,
                cat.furnace,
                TilePosition::new(0, 0),
                Default::default(),
                crate::world::WorldObject::Machine(Box::new(Liar)),
            )
            .unwrap();
        let mapping = mapping_for(&world);

        let meta = mapping.get(HOME).unwrap().machine(liar).unwrap().clone();
        assert_eq!(process_machine(&mut world, &meta), Err(ObjectError::MissingOutput));
        assert_eq!(run_pass(&mapping, &mut world).failed, 1);
    }

    #[test]
    fn summaries_add_up() {
        let mut total = TickSummary::default();
        total += TickSummary {
            visited: 2,
            started: 1,
            idle: 1,
            ..TickSummary::default()
        };
        total += TickSummary {
            visited: 1,
            failed: 1,
            ..TickSummary::default()
        };
        assert_eq!(total.visited, 3);
        assert_eq!(total.started, 1);
        assert_eq!(total.failed, 1);
    }

    #[test]
    fn manual_graph_with_unknown_machine_counts_stale() {
        let (mut world, cat) = setup();
        let chest = world.spawn(HOME, cat.chest, TilePosition::new(0, 0)).unwrap();
        // A handle that points at a container, not a machine.
        let mut mapping = LocationMapping::new();
        mapping.replace(LocationGraph::new(
            HOME,
            vec![MachineMetadata::new(chest, KindId(0), TilePosition::new(0, 0), Vec::new())],
        ));
        assert_eq!(run_pass(&mapping, &mut world).stale, 1);
    }
}
