//! Autoflow Core -- resource automation between machines and storage.
//!
//! This crate discovers, per location, which machines exist and which
//! containers each one can reach, then moves items between them every tick.
//! The world owns all objects; the engine only keeps non-owning handles and
//! a cached connection graph it rebuilds when told the world changed.
//!
//! # Machine Cycle
//!
//! Each pass visits every captured machine once:
//!
//! 1. **Empty** -- pull inputs from connected containers and start a cycle.
//! 2. **Processing** -- left alone; the machine's own timer finishes it.
//! 3. **Done** -- push the product into the first container that accepts all
//!    of it, then reset. A machine nobody accepts from stays `Done`.
//!
//! # Rebuilds
//!
//! ```rust,ignore
//! let changes = world.take_changes();
//! engine.apply_changes(&world, &changes); // full or per-location rebuild
//! engine.tick(&mut world);
//! ```
//!
//! # Key Types
//!
//! - [`engine::AutomationEngine`] -- Owns the mapping; rebuilds and ticks.
//! - [`machine::Machine`] / [`container::Container`] -- Object contracts.
//! - [`resolver::ConnectionResolver`] -- Which containers a machine reaches.
//! - [`graph::LocationMapping`] -- Cached per-location machine graphs.
//! - [`scheduler`] -- The pull/push pass.
//! - [`registry::Registry`] -- Immutable catalog of items, recipes and kinds.
//! - [`world::World`] -- The boundary to whatever owns the objects.
//! - [`memory::MemoryWorld`] -- In-memory reference world.

pub mod changes;
pub mod config;
pub mod container;
pub mod engine;
pub mod error;
pub mod graph;
pub mod id;
pub mod item;
pub mod machine;
pub mod memory;
pub mod registry;
pub mod resolver;
pub mod scheduler;
pub mod spatial;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
