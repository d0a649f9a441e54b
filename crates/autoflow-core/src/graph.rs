//! Location graphs: which machines exist in each location and which
//! containers each one is connected to.
//!
//! Graphs are rebuilt from world snapshots and never patched. A full rebuild
//! clears the [`LocationMapping`]; a partial rebuild swaps a single entry and
//! leaves every other entry pointer-identical.

use crate::id::{KindId, LocationId, ObjectId};
use crate::registry::{Registry, Role};
use crate::resolver::{
    pull_order, push_order, Connection, ConnectionResolver, LayoutEntry, LocationLayout,
};
use crate::spatial::TilePosition;
use crate::world::World;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Graph types
// ---------------------------------------------------------------------------

/// One machine and the containers it exchanges items with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineMetadata {
    pub machine: ObjectId,
    pub kind: KindId,
    pub tile: TilePosition,
    /// Reachable containers in resolved order.
    pub connections: Vec<Connection>,
    /// Delivery order derived from each container's store preference.
    pub push_targets: Vec<ObjectId>,
    /// Input order derived from each container's take preference.
    pub pull_sources: Vec<ObjectId>,
}

impl MachineMetadata {
    pub fn new(machine: ObjectId, kind: KindId, tile: TilePosition, connections: Vec<Connection>) -> Self {
        Self {
            machine,
            kind,
            tile,
            push_targets: push_order(&connections),
            pull_sources: pull_order(&connections),
            connections,
        }
    }
}

/// The captured machines of one location, in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationGraph {
    location: LocationId,
    machines: Vec<MachineMetadata>,
}

impl LocationGraph {
    pub fn new(location: LocationId, machines: Vec<MachineMetadata>) -> Self {
        Self { location, machines }
    }

    pub fn location(&self) -> LocationId {
        self.location
    }

    pub fn machines(&self) -> &[MachineMetadata] {
        &self.machines
    }

    pub fn machine(&self, id: ObjectId) -> Option<&MachineMetadata> {
        self.machines.iter().find(|m| m.machine == id)
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }
}

/// `LocationId -> LocationGraph`, one entry per location with machines.
#[derive(Debug, Clone, Default)]
pub struct LocationMapping {
    entries: BTreeMap<LocationId, Arc<LocationGraph>>,
}

impl LocationMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, location: LocationId) -> Option<&Arc<LocationGraph>> {
        self.entries.get(&location)
    }

    /// Replace a location's entry wholesale. Returns the old one.
    pub fn replace(&mut self, graph: LocationGraph) -> Option<Arc<LocationGraph>> {
        self.entries.insert(graph.location(), Arc::new(graph))
    }

    pub fn remove(&mut self, location: LocationId) -> Option<Arc<LocationGraph>> {
        self.entries.remove(&location)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries in ascending location order.
    pub fn iter(&self) -> impl Iterator<Item = (LocationId, &Arc<LocationGraph>)> {
        self.entries.iter().map(|(&loc, graph)| (loc, graph))
    }

    pub fn locations(&self) -> Vec<LocationId> {
        self.entries.keys().copied().collect()
    }

    /// Total machines across every location.
    pub fn machine_count(&self) -> usize {
        self.entries.values().map(|g| g.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Scans world snapshots into [`LocationGraph`]s.
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder<'a> {
    registry: &'a Registry,
    resolver: ConnectionResolver,
    extra_connectors: &'a BTreeSet<KindId>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        registry: &'a Registry,
        resolver: ConnectionResolver,
        extra_connectors: &'a BTreeSet<KindId>,
    ) -> Self {
        Self {
            registry,
            resolver,
            extra_connectors,
        }
    }

    /// The automation role of a kind, `None` if unrecognized.
    pub fn classify(&self, kind: KindId) -> Option<Role> {
        if self.extra_connectors.contains(&kind) {
            return Some(Role::Connector);
        }
        self.registry.role(kind)
    }

    /// Snapshot and classify one location.
    pub fn layout<W: World>(&self, world: &W, location: LocationId) -> LocationLayout {
        let mut layout = LocationLayout::new();
        for placed in world.placed_objects(location) {
            let role = self.classify(placed.kind);
            if role.is_none() {
                tracing::trace!(?location, object = ?placed.id, kind = ?placed.kind, "ignoring unrecognized object");
            }
            let entry = LayoutEntry {
                kind: placed.kind,
                tile: placed.tile,
                role,
                options: placed.options,
            };
            if let Err(err) = layout.insert(placed.id, placed.footprint, entry) {
                tracing::debug!(?location, object = ?placed.id, %err, "skipping overlapping placement");
            }
        }
        layout
    }

    /// Build a location's graph. `None` when it holds no machines.
    pub fn build_location<W: World>(
        &self,
        world: &W,
        location: LocationId,
    ) -> Option<LocationGraph> {
        let layout = self.layout(world, location);
        let machines: Vec<MachineMetadata> = layout
            .machines()
            .into_iter()
            .filter_map(|id| {
                let entry = layout.get(id)?;
                let connections = self.resolver.resolve(&layout, id);
                if connections.is_empty() {
                    tracing::debug!(?location, machine = ?id, "machine has no connected containers");
                }
                Some(MachineMetadata::new(id, entry.kind, entry.tile, connections))
            })
            .collect();

        if machines.is_empty() {
            return None;
        }
        Some(LocationGraph::new(location, machines))
    }

    /// Clear the mapping and rebuild every loaded location.
    pub fn rebuild_all<W: World>(&self, mapping: &mut LocationMapping, world: &W) {
        mapping.clear();
        for location in world.locations() {
            if let Some(graph) = self.build_location(world, location) {
                mapping.replace(graph);
            }
        }
        tracing::info!(
            locations = mapping.len(),
            machines = mapping.machine_count(),
            "rebuilt automation graph"
        );
    }

    /// Rebuild a single location, replacing or removing only its entry.
    pub fn rebuild_location<W: World>(
        &self,
        mapping: &mut LocationMapping,
        world: &W,
        location: LocationId,
    ) {
        let loaded = world.locations().contains(&location);
        let graph = if loaded {
            self.build_location(world, location)
        } else {
            None
        };
        match graph {
            Some(graph) => {
                let machines = graph.len();
                mapping.replace(graph);
                tracing::debug!(?location, machines, "rebuilt location");
            }
            None => {
                if mapping.remove(location).is_some() {
                    tracing::debug!(?location, loaded, "dropped location from automation");
                }
            }
        }
    }
}
