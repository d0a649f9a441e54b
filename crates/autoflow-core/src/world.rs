//! The world-index boundary.
//!
//! The world owns every machine and container. The engine only holds
//! [`ObjectId`] handles and reaches live objects through [`World`] for the
//! duration of a single machine's processing.

use crate::container::{Container, ContainerOptions, ContainerSet};
use crate::id::{KindId, LocationId, ObjectId};
use crate::machine::{Machine, MachineState};
use crate::spatial::{Footprint, TilePosition};

/// One object as seen in a location snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedObject {
    pub id: ObjectId,
    pub kind: KindId,
    /// Top-left tile.
    pub tile: TilePosition,
    pub footprint: Footprint,
    /// Only meaningful for containers.
    pub options: ContainerOptions,
}

/// A live world object in one of the roles automation understands.
#[derive(Debug)]
pub enum WorldObject {
    Machine(Box<dyn Machine>),
    Container(Box<dyn Container>),
    /// Extends reach between machines and containers; holds nothing.
    Connector,
}

impl WorldObject {
    pub fn as_machine(&self) -> Option<&dyn Machine> {
        match self {
            WorldObject::Machine(m) => Some(m.as_ref()),
            _ => None,
        }
    }

    pub fn as_machine_mut(&mut self) -> Option<&mut dyn Machine> {
        match self {
            WorldObject::Machine(m) => Some(m.as_mut()),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&dyn Container> {
        match self {
            WorldObject::Container(c) => Some(c.as_ref()),
            _ => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        match self {
            WorldObject::Container(c) => Some(c.as_mut()),
            _ => None,
        }
    }
}

/// A machine and its containers, mutably borrowed together for one call.
#[derive(Debug)]
pub struct MachineView<'w> {
    pub machine: &'w mut dyn Machine,
    pub containers: ContainerSet<'w>,
}

/// The world-index collaborator the engine scans and mutates through.
pub trait World {
    /// Every currently loaded location.
    fn locations(&self) -> Vec<LocationId>;

    /// Every object in a location. Unknown locations yield nothing.
    fn placed_objects(&self, location: LocationId) -> Vec<PlacedObject>;

    /// The live state of a machine, `None` when the handle no longer
    /// resolves to one.
    fn machine_state(&self, machine: ObjectId) -> Option<MachineState>;

    /// Run `f` on a machine together with the listed containers, in list
    /// order.
    ///
    /// Returns `None` without calling `f` when `machine` no longer resolves
    /// to a machine. Container handles that no longer resolve, and repeats,
    /// are left out of the view.
    fn with_machine<R>(
        &mut self,
        machine: ObjectId,
        containers: &[ObjectId],
        f: impl FnOnce(MachineView<'_>) -> R,
    ) -> Option<R>;
}
