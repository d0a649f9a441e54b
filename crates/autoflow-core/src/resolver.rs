//! Connection resolution: which containers a machine can reach.
//!
//! A [`LocationLayout`] is a classified snapshot of one location. The
//! [`ConnectionResolver`] walks it breadth-first from a machine, collecting
//! containers in discovery order. The same layout always resolves to the
//! same ordered list.

use crate::container::{ContainerOptions, Preference};
use crate::id::{KindId, ObjectId};
use crate::registry::Role;
use crate::spatial::{Footprint, SpatialError, TileIndex, TilePosition};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// One container reachable from a machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub container: ObjectId,
    pub kind: KindId,
    pub options: ContainerOptions,
}

/// What the layout knows about one placed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEntry {
    pub kind: KindId,
    pub tile: TilePosition,
    /// `None` for kinds automation doesn't recognize.
    pub role: Option<Role>,
    pub options: ContainerOptions,
}

/// A classified, spatially indexed snapshot of one location.
#[derive(Debug, Clone, Default)]
pub struct LocationLayout {
    index: TileIndex,
    entries: BTreeMap<ObjectId, LayoutEntry>,
}

impl LocationLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object. Fails without side effects if its tiles are taken.
    pub fn insert(
        &mut self,
        id: ObjectId,
        footprint: Footprint,
        entry: LayoutEntry,
    ) -> Result<(), SpatialError> {
        self.index.place(id, entry.tile, footprint)?;
        self.entries.insert(id, entry);
        Ok(())
    }

    pub fn get(&self, id: ObjectId) -> Option<&LayoutEntry> {
        self.entries.get(&id)
    }

    pub fn role(&self, id: ObjectId) -> Option<Role> {
        self.entries.get(&id).and_then(|e| e.role)
    }

    /// Machines in ascending `(tile, id)` order.
    pub fn machines(&self) -> Vec<ObjectId> {
        let mut machines: Vec<(TilePosition, ObjectId)> = self
            .entries
            .iter()
            .filter(|(_, e)| e.role == Some(Role::Machine))
            .map(|(&id, e)| (e.tile, id))
            .collect();
        machines.sort();
        machines.into_iter().map(|(_, id)| id).collect()
    }

    pub fn index(&self) -> &TileIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Breadth-first reach search from a machine's tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionResolver {
    pub join_through_containers: bool,
    pub join_through_connectors: bool,
}

impl Default for ConnectionResolver {
    fn default() -> Self {
        Self {
            join_through_containers: true,
            join_through_connectors: true,
        }
    }
}

impl ConnectionResolver {
    /// Ordered containers reachable from `machine`. Empty when nothing is
    /// reachable or the machine isn't in the layout.
    pub fn resolve(&self, layout: &LocationLayout, machine: ObjectId) -> Vec<Connection> {
        let mut connections = Vec::new();
        if layout.get(machine).is_none() {
            return connections;
        }

        let mut visited = BTreeSet::from([machine]);
        let mut queue = VecDeque::from([machine]);

        while let Some(current) = queue.pop_front() {
            for (_, neighbor) in layout.index.neighbors_4(current) {
                if !visited.insert(neighbor) {
                    continue;
                }
                let Some(entry) = layout.get(neighbor) else {
                    continue;
                };
                match entry.role {
                    Some(Role::Container) => {
                        connections.push(Connection {
                            container: neighbor,
                            kind: entry.kind,
                            options: entry.options,
                        });
                        if self.join_through_containers {
                            queue.push_back(neighbor);
                        }
                    }
                    Some(Role::Connector) => {
                        if self.join_through_connectors {
                            queue.push_back(neighbor);
                        }
                    }
                    // Machines and unrecognized objects block.
                    Some(Role::Machine) | None => {}
                }
            }
        }
        connections
    }
}

/// Containers to try when delivering, `Prefer` before `Allow`.
pub fn push_order(connections: &[Connection]) -> Vec<ObjectId> {
    ranked(connections, |o| o.store)
}

/// Containers to draw inputs from, `Prefer` before `Allow`.
pub fn pull_order(connections: &[Connection]) -> Vec<ObjectId> {
    ranked(connections, |o| o.take)
}

fn ranked(
    connections: &[Connection],
    preference: impl Fn(&ContainerOptions) -> Preference,
) -> Vec<ObjectId> {
    let mut order = Vec::with_capacity(connections.len());
    for wanted in [Preference::Prefer, Preference::Allow] {
        order.extend(
            connections
                .iter()
                .filter(|c| preference(&c.options) == wanted)
                .map(|c| c.container),
        );
    }
    order
}
