//! An in-memory [`World`] that owns its objects outright.
//!
//! Used by tests, benches and the headless runner. Every structural edit is
//! recorded in a [`ChangeTracker`]; hosts drain it with
//! [`take_changes`](MemoryWorld::take_changes) and pass the batch to the
//! engine.
//!
//! Each location keeps its own object list, so snapshots and lending only
//! touch the objects involved, never the whole world.

use crate::changes::{ChangeTracker, WorldChanges};
use crate::container::{Container, ContainerOptions, ContainerSet};
use crate::id::{KindId, LocationId, ObjectId};
use crate::machine::{Machine, MachineState};
use crate::registry::Registry;
use crate::spatial::{Footprint, SpatialError, TileIndex, TilePosition};
use crate::world::{MachineView, PlacedObject, World, WorldObject};
use slotmap::SlotMap;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("location {0:?} is not loaded")]
    LocationNotLoaded(LocationId),
    #[error("unknown kind: {0:?}")]
    UnknownKind(KindId),
    #[error("object not found: {0:?}")]
    ObjectNotFound(ObjectId),
    #[error("object {0:?} is not a container")]
    NotAContainer(ObjectId),
    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

#[derive(Debug)]
struct Entry {
    object: WorldObject,
    kind: KindId,
    location: LocationId,
    tile: TilePosition,
    footprint: Footprint,
    options: ContainerOptions,
}

/// One loaded location: its tiles and the objects placed on them.
#[derive(Debug, Default)]
struct Site {
    index: TileIndex,
    objects: BTreeSet<ObjectId>,
}

/// Locations, objects and placements held entirely in memory.
#[derive(Debug)]
pub struct MemoryWorld {
    registry: Arc<Registry>,
    objects: SlotMap<ObjectId, Entry>,
    locations: BTreeMap<LocationId, Site>,
    changes: ChangeTracker,
}

impl MemoryWorld {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            objects: SlotMap::with_key(),
            locations: BTreeMap::new(),
            changes: ChangeTracker::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // -- Locations --

    /// Load an empty location. Returns `false` if it was already loaded.
    pub fn add_location(&mut self, location: LocationId) -> bool {
        if self.locations.contains_key(&location) {
            return false;
        }
        self.locations.insert(location, Site::default());
        self.changes.mark_locations();
        true
    }

    /// Unload a location and everything in it. Returns `false` if it wasn't
    /// loaded.
    pub fn remove_location(&mut self, location: LocationId) -> bool {
        let Some(site) = self.locations.remove(&location) else {
            return false;
        };
        for id in site.objects {
            self.objects.remove(id);
        }
        self.changes.mark_locations();
        true
    }

    pub fn is_loaded(&self, location: LocationId) -> bool {
        self.locations.contains_key(&location)
    }

    // -- Objects --

    /// Create a fresh object of a registered kind.
    pub fn spawn(
        &mut self,
        location: LocationId,
        kind: KindId,
        tile: TilePosition,
    ) -> Result<ObjectId, WorldError> {
        let footprint = self
            .registry
            .get_kind(kind)
            .ok_or(WorldError::UnknownKind(kind))?
            .footprint;
        let object = self
            .registry
            .instantiate(kind)
            .ok_or(WorldError::UnknownKind(kind))?;
        self.insert(location, kind, tile, footprint, object)
    }

    /// Place a caller-built object. The kind need not be registered;
    /// unregistered kinds are invisible to automation.
    pub fn insert(
        &mut self,
        location: LocationId,
        kind: KindId,
        tile: TilePosition,
        footprint: Footprint,
        object: WorldObject,
    ) -> Result<ObjectId, WorldError> {
        let site = self
            .locations
            .get_mut(&location)
            .ok_or(WorldError::LocationNotLoaded(location))?;
        let id = self.objects.insert(Entry {
            object,
            kind,
            location,
            tile,
            footprint,
            options: ContainerOptions::default(),
        });
        if let Err(err) = site.index.place(id, tile, footprint) {
            self.objects.remove(id);
            return Err(err.into());
        }
        site.objects.insert(id);
        self.changes.mark_location(location);
        Ok(id)
    }

    /// Remove an object, handing it back.
    pub fn despawn(&mut self, id: ObjectId) -> Result<WorldObject, WorldError> {
        let entry = self
            .objects
            .remove(id)
            .ok_or(WorldError::ObjectNotFound(id))?;
        if let Some(site) = self.locations.get_mut(&entry.location) {
            site.objects.remove(&id);
            site.index.remove(id)?;
        }
        self.changes.mark_location(entry.location);
        Ok(entry.object)
    }

    pub fn set_container_options(
        &mut self,
        id: ObjectId,
        options: ContainerOptions,
    ) -> Result<(), WorldError> {
        let entry = self
            .objects
            .get_mut(id)
            .ok_or(WorldError::ObjectNotFound(id))?;
        if entry.object.as_container().is_none() {
            return Err(WorldError::NotAContainer(id));
        }
        if entry.options != options {
            entry.options = options;
            self.changes.mark_location(entry.location);
        }
        Ok(())
    }

    pub fn placement(&self, id: ObjectId) -> Option<PlacedObject> {
        self.objects.get(id).map(|entry| placed(id, entry))
    }

    pub fn location_of(&self, id: ObjectId) -> Option<LocationId> {
        self.objects.get(id).map(|entry| entry.location)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn machine(&self, id: ObjectId) -> Option<&dyn Machine> {
        self.objects.get(id)?.object.as_machine()
    }

    pub fn machine_mut(&mut self, id: ObjectId) -> Option<&mut dyn Machine> {
        self.objects.get_mut(id)?.object.as_machine_mut()
    }

    pub fn container(&self, id: ObjectId) -> Option<&dyn Container> {
        self.objects.get(id)?.object.as_container()
    }

    pub fn container_mut(&mut self, id: ObjectId) -> Option<&mut dyn Container> {
        self.objects.get_mut(id)?.object.as_container_mut()
    }

    // -- Time and notifications --

    /// Let every machine's internal timer run.
    pub fn advance_time(&mut self, ticks: u32) {
        for entry in self.objects.values_mut() {
            if let Some(machine) = entry.object.as_machine_mut() {
                machine.elapse(ticks);
            }
        }
    }

    /// Drain the notifications accumulated since the last call.
    pub fn take_changes(&mut self) -> WorldChanges {
        self.changes.take()
    }

    // -- Lending --

    fn lend_machine(&mut self, id: ObjectId) -> Option<Box<dyn Machine>> {
        let entry = self.objects.get_mut(id)?;
        match std::mem::replace(&mut entry.object, WorldObject::Connector) {
            WorldObject::Machine(machine) => Some(machine),
            other => {
                entry.object = other;
                None
            }
        }
    }

    fn lend_container(&mut self, id: ObjectId) -> Option<Box<dyn Container>> {
        let entry = self.objects.get_mut(id)?;
        match std::mem::replace(&mut entry.object, WorldObject::Connector) {
            WorldObject::Container(container) => Some(container),
            other => {
                entry.object = other;
                None
            }
        }
    }

    fn give_back(&mut self, id: ObjectId, object: WorldObject) {
        if let Some(entry) = self.objects.get_mut(id) {
            entry.object = object;
        }
    }
}

fn placed(id: ObjectId, entry: &Entry) -> PlacedObject {
    PlacedObject {
        id,
        kind: entry.kind,
        tile: entry.tile,
        footprint: entry.footprint,
        options: entry.options,
    }
}

impl World for MemoryWorld {
    fn locations(&self) -> Vec<LocationId> {
        self.locations.keys().copied().collect()
    }

    fn placed_objects(&self, location: LocationId) -> Vec<PlacedObject> {
        let Some(site) = self.locations.get(&location) else {
            return Vec::new();
        };
        site.objects
            .iter()
            .filter_map(|&id| self.objects.get(id).map(|entry| placed(id, entry)))
            .collect()
    }

    fn machine_state(&self, machine: ObjectId) -> Option<MachineState> {
        self.machine(machine).map(|m| m.state())
    }

    /// The machine and its containers are moved out of their slots for the
    /// duration of `f` and put back afterwards. A panic inside `f` loses them.
    fn with_machine<R>(
        &mut self,
        machine: ObjectId,
        containers: &[ObjectId],
        f: impl FnOnce(MachineView<'_>) -> R,
    ) -> Option<R> {
        let mut lent_machine = self.lend_machine(machine)?;
        // A repeated or non-container id finds nothing to lend and is skipped.
        let mut lent: Vec<(ObjectId, Box<dyn Container>)> = containers
            .iter()
            .filter_map(|&id| self.lend_container(id).map(|c| (id, c)))
            .collect();

        let entries = lent
            .iter_mut()
            .map(|(id, c)| {
                let c: &mut dyn Container = c.as_mut();
                (*id, c)
            })
            .collect();
        let result = f(MachineView {
            machine: lent_machine.as_mut(),
            containers: ContainerSet::new(entries),
        });

        for (id, container) in lent {
            self.give_back(id, WorldObject::Container(container));
        }
        self.give_back(machine, WorldObject::Machine(lent_machine));
        Some(result)
    }
}
