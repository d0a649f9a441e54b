//! The automation engine: owns the cached location mapping and drives the
//! pull/push pass each tick.
//!
//! # Architecture
//!
//! The `AutomationEngine` owns:
//! - The frozen [`Registry`] used to classify objects
//! - The [`EngineConfig`]
//! - A [`LocationMapping`] (location -> machines and their connections)
//!
//! The world owns every machine and container. The engine only keeps handles
//! and borrows live objects through [`World`] during a pass.
//!
//! # Inbound calls
//!
//! - [`on_locations_changed`](AutomationEngine::on_locations_changed):
//!   full rebuild.
//! - [`on_location_contents_changed`](AutomationEngine::on_location_contents_changed):
//!   partial rebuild of one location.
//! - [`apply_changes`](AutomationEngine::apply_changes): a drained batch of
//!   both.
//! - [`tick`](AutomationEngine::tick): one tick signal.
//!
//! Every entry point takes `&mut self`, so a rebuild never interleaves with a
//! pass.

use crate::changes::WorldChanges;
use crate::config::EngineConfig;
use crate::graph::{GraphBuilder, LocationGraph, LocationMapping};
use crate::id::{KindId, LocationId};
use crate::registry::Registry;
use crate::resolver::ConnectionResolver;
use crate::scheduler::{self, TickSummary};
use crate::world::World;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Discovery and scheduling for every loaded location.
#[derive(Debug)]
pub struct AutomationEngine {
    registry: Arc<Registry>,
    config: EngineConfig,
    /// Kinds from `config.extra_connectors` that resolved.
    extra_connectors: BTreeSet<KindId>,
    mapping: LocationMapping,
    paused: bool,
    /// Tick signals received, including skipped ones.
    ticks: u64,
    /// Passes actually run.
    passes: u64,
}

impl AutomationEngine {
    pub fn new(registry: Arc<Registry>, config: EngineConfig) -> Self {
        let extra_connectors = resolve_connectors(&registry, &config);
        Self {
            registry,
            config,
            extra_connectors,
            mapping: LocationMapping::new(),
            paused: false,
            ticks: 0,
            passes: 0,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Swap the configuration. Reach rules take effect at the next rebuild.
    pub fn set_config(&mut self, config: EngineConfig) {
        self.extra_connectors = resolve_connectors(&self.registry, &config);
        self.config = config;
    }

    // -- Rebuilds --

    fn builder(&self) -> GraphBuilder<'_> {
        let resolver = ConnectionResolver {
            join_through_containers: self.config.join_through_containers,
            join_through_connectors: self.config.join_through_connectors,
        };
        GraphBuilder::new(&self.registry, resolver, &self.extra_connectors)
    }

    /// The set of loaded locations changed: rebuild everything.
    pub fn on_locations_changed<W: World>(&mut self, world: &W) {
        let mut mapping = std::mem::take(&mut self.mapping);
        self.builder().rebuild_all(&mut mapping, world);
        self.mapping = mapping;
    }

    /// Something inside `location` changed: rebuild only its entry.
    pub fn on_location_contents_changed<W: World>(
        &mut self,
        world: &W,
        location: LocationId,
    ) {
        let mut mapping = std::mem::take(&mut self.mapping);
        self.builder().rebuild_location(&mut mapping, world, location);
        self.mapping = mapping;
    }

    /// Apply a drained batch of notifications.
    pub fn apply_changes<W: World>(&mut self, world: &W, changes: &WorldChanges) {
        if changes.locations_changed {
            self.on_locations_changed(world);
            return;
        }
        for &location in &changes.dirty_locations {
            self.on_location_contents_changed(world, location);
        }
    }

    // -- Ticking --

    /// One tick signal. Returns the pass summary, or `None` when no pass ran
    /// (paused, disabled, or between intervals).
    pub fn tick<W: World>(&mut self, world: &mut W) -> Option<TickSummary> {
        self.ticks += 1;
        if self.paused || !self.config.enabled {
            tracing::debug!(paused = self.paused, enabled = self.config.enabled, "automation pass skipped");
            return None;
        }
        if (self.ticks - 1) % u64::from(self.config.interval()) != 0 {
            return None;
        }

        let summary = scheduler::run_pass(&self.mapping, world);
        self.passes += 1;
        tracing::trace!(pass = self.passes, ?summary, "automation pass complete");
        Some(summary)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // -- Queries --

    pub fn mapping(&self) -> &LocationMapping {
        &self.mapping
    }

    pub fn location_graph(&self, location: LocationId) -> Option<Arc<LocationGraph>> {
        self.mapping.get(location).cloned()
    }

    pub fn machine_count(&self) -> usize {
        self.mapping.machine_count()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }
}

fn resolve_connectors(registry: &Registry, config: &EngineConfig) -> BTreeSet<KindId> {
    config
        .extra_connectors
        .iter()
        .filter_map(|name| {
            let kind = registry.kind_id(name);
            if kind.is_none() {
                tracing::warn!(name = %name, "unknown connector kind in config");
            }
            kind
        })
        .collect()
}
