use crate::id::LocationId;
use std::collections::BTreeSet;

/// A drained batch of world notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldChanges {
    /// The set of loaded locations changed; everything must be rebuilt.
    pub locations_changed: bool,
    /// Locations whose contents changed since the last drain.
    pub dirty_locations: BTreeSet<LocationId>,
}

impl WorldChanges {
    /// Returns `true` if nothing needs rebuilding.
    pub fn is_empty(&self) -> bool {
        !self.locations_changed && self.dirty_locations.is_empty()
    }
}

/// Tracks which locations have been modified since the last drain.
///
/// The world marks changes as they happen; the host drains them with
/// [`take`](ChangeTracker::take) and hands the batch to the engine.
#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    pending: WorldChanges,
}

impl ChangeTracker {
    /// Create a new tracker with nothing dirty.
    pub fn new() -> Self {
        Self::default()
    }

    /// A location was added or removed.
    pub fn mark_locations(&mut self) {
        self.pending.locations_changed = true;
    }

    /// Something inside a location was added, removed or reconfigured.
    pub fn mark_location(&mut self, location: LocationId) {
        self.pending.dirty_locations.insert(location);
    }

    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_location_dirty(&self, location: LocationId) -> bool {
        self.pending.dirty_locations.contains(&location)
    }

    /// Drain everything marked so far, leaving the tracker clean.
    pub fn take(&mut self) -> WorldChanges {
        std::mem::take(&mut self.pending)
    }
}
