//! Tile index for object placement and adjacency queries.
//!
//! Maps tile positions to world objects, supporting multi-tile objects and
//! 4-directional neighbour lookups. Iteration orders are fully determined by
//! positions and directions, so the same layout always answers the same way.

use crate::id::ObjectId;
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A tile within a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePosition {
    pub x: i32,
    pub y: i32,
}

impl TilePosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent tile in a direction, `None` past the edge of the grid.
    pub fn step(&self, dir: Direction) -> Option<TilePosition> {
        let (dx, dy) = dir.offset();
        Some(TilePosition::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }

    fn offset_by(&self, dx: u32, dy: u32) -> Option<TilePosition> {
        let x = i32::try_from(i64::from(self.x) + i64::from(dx)).ok()?;
        let y = i32::try_from(i64::from(self.y) + i64::from(dy)).ok()?;
        Some(TilePosition::new(x, y))
    }
}

/// The size of an object in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    pub width: u32,
    pub height: u32,
}

impl Default for Footprint {
    fn default() -> Self {
        Self::single()
    }
}

impl Footprint {
    /// A 1x1 object.
    pub fn single() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Iterate over all tiles covered at the given origin (top-left corner).
    /// Tiles past the edge of the grid are left out.
    pub fn tiles(self, origin: TilePosition) -> impl Iterator<Item = TilePosition> {
        (0..self.height)
            .flat_map(move |dy| (0..self.width).filter_map(move |dx| origin.offset_by(dx, dy)))
    }

    /// Whether every tile of the footprint lies on the grid.
    pub fn fits(self, origin: TilePosition) -> bool {
        let far = origin.offset_by(self.width.saturating_sub(1), self.height.saturating_sub(1));
        far.is_some()
    }
}

/// Cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All four cardinal directions, in neighbour-visit order.
    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
    }

    /// Offset for this direction.
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }
}

/// Errors from spatial operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpatialError {
    #[error("tile {0:?} is occupied")]
    Occupied(TilePosition),
    #[error("object is not placed")]
    NotPlaced,
    #[error("object is already placed")]
    AlreadyPlaced,
    #[error("footprint at {0:?} runs off the grid")]
    OutOfBounds(TilePosition),
}

// ---------------------------------------------------------------------------
// TileIndex
// ---------------------------------------------------------------------------

/// Bidirectional mapping between tiles and the objects covering them.
#[derive(Debug, Default, Clone)]
pub struct TileIndex {
    tiles: BTreeMap<TilePosition, ObjectId>,
    origins: SecondaryMap<ObjectId, TilePosition>,
    footprints: SecondaryMap<ObjectId, Footprint>,
}

impl TileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Placement --

    /// Place an object. Fails without side effects if any tile is taken.
    pub fn place(
        &mut self,
        object: ObjectId,
        origin: TilePosition,
        footprint: Footprint,
    ) -> Result<(), SpatialError> {
        if self.origins.contains_key(object) {
            return Err(SpatialError::AlreadyPlaced);
        }
        if !footprint.fits(origin) {
            return Err(SpatialError::OutOfBounds(origin));
        }
        if let Some(taken) = footprint.tiles(origin).find(|t| self.tiles.contains_key(t)) {
            return Err(SpatialError::Occupied(taken));
        }

        for tile in footprint.tiles(origin) {
            self.tiles.insert(tile, object);
        }
        self.origins.insert(object, origin);
        self.footprints.insert(object, footprint);
        Ok(())
    }

    /// Remove an object. Returns its origin.
    pub fn remove(&mut self, object: ObjectId) -> Result<TilePosition, SpatialError> {
        let origin = *self.origins.get(object).ok_or(SpatialError::NotPlaced)?;
        let footprint = *self.footprints.get(object).ok_or(SpatialError::NotPlaced)?;

        for tile in footprint.tiles(origin) {
            self.tiles.remove(&tile);
        }
        self.origins.remove(object);
        self.footprints.remove(object);
        Ok(origin)
    }

    // -- Point queries --

    pub fn object_at(&self, tile: TilePosition) -> Option<ObjectId> {
        self.tiles.get(&tile).copied()
    }

    pub fn contains(&self, object: ObjectId) -> bool {
        self.origins.contains_key(object)
    }

    // -- Adjacency --

    /// Unique 4-directional neighbours of an object.
    ///
    /// Directions are visited North, East, South, West; within a direction,
    /// the object's edge tiles are visited in ascending tile order.
    pub fn neighbors_4(&self, object: ObjectId) -> Vec<(Direction, ObjectId)> {
        let Some(&origin) = self.origins.get(object) else {
            return Vec::new();
        };
        let Some(&footprint) = self.footprints.get(object) else {
            return Vec::new();
        };

        let own_tiles: BTreeSet<TilePosition> = footprint.tiles(origin).collect();
        let mut result = Vec::new();
        let mut seen = BTreeSet::new();

        for dir in Direction::all() {
            for tile in &own_tiles {
                let Some(neighbor_pos) = tile.step(dir) else {
                    continue;
                };
                if own_tiles.contains(&neighbor_pos) {
                    continue;
                }
                if let Some(&neighbor) = self.tiles.get(&neighbor_pos) {
                    if seen.insert(neighbor) {
                        result.push((dir, neighbor));
                    }
                }
            }
        }
        result
    }

    /// Number of objects placed.
    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}
