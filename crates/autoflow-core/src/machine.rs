//! The machine contract and the recipe-driven reference machine.
//!
//! The scheduler only ever talks to [`Machine`]. How long a cycle takes and
//! what flips a machine from `Processing` to `Done` belongs to the machine
//! itself; the engine observes the state and never infers it.

use crate::container::ContainerSet;
use crate::error::ObjectError;
use crate::item::ItemStack;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Machine state
// ---------------------------------------------------------------------------

/// Where a machine is in its production cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineState {
    /// Idle and ready to pull inputs.
    Empty,
    /// Mid-cycle. The engine leaves it alone.
    Processing,
    /// Holding a finished product waiting to be pushed.
    Done,
}

// ---------------------------------------------------------------------------
// Machine trait
// ---------------------------------------------------------------------------

/// Uniform interface over every machine kind.
pub trait Machine: fmt::Debug {
    /// Current state, derived from live object data.
    fn state(&self) -> MachineState;

    /// Try to consume inputs from `inputs` and start a cycle.
    ///
    /// Returns `Ok(false)` when nothing eligible is available; in that case
    /// neither the machine nor any container may change.
    fn pull(&mut self, inputs: &mut ContainerSet<'_>) -> Result<bool, ObjectError>;

    /// The finished product, without removing it. `None` unless `Done`.
    fn output(&self) -> Option<ItemStack>;

    /// Clear the machine back to `Empty`. With `successful == true` the
    /// product is removed; callers only pass `true` after a confirmed push.
    fn reset(&mut self, successful: bool);

    /// Let world time pass for the machine's internal timer.
    ///
    /// Driven by the world simulation, never by the engine.
    fn elapse(&mut self, ticks: u32) {
        let _ = ticks;
    }
}

// ---------------------------------------------------------------------------
// RecipeMachine
// ---------------------------------------------------------------------------

/// One production recipe: consume `inputs`, wait `duration` ticks, yield
/// `output`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineRecipe {
    pub inputs: Vec<ItemStack>,
    pub output: ItemStack,
    pub duration: u32,
}

/// A machine that runs the first of its recipes whose inputs are available.
///
/// Recipes with no inputs start unconditionally (tappers, hives). A
/// zero-duration recipe is `Done` as soon as it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeMachine {
    recipes: Vec<MachineRecipe>,
    held: Option<ItemStack>,
    remaining: u32,
}

impl RecipeMachine {
    pub fn new(recipes: Vec<MachineRecipe>) -> Self {
        Self {
            recipes,
            held: None,
            remaining: 0,
        }
    }

    pub fn recipes(&self) -> &[MachineRecipe] {
        &self.recipes
    }

    /// The product being made or waiting to be collected.
    pub fn held(&self) -> Option<&ItemStack> {
        self.held.as_ref()
    }

    /// Ticks left until the held product is done.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Put a product in the machine directly, bypassing inputs.
    pub fn load(&mut self, output: ItemStack, duration: u32) {
        self.held = Some(output);
        self.remaining = duration;
    }
}

impl Machine for RecipeMachine {
    fn state(&self) -> MachineState {
        match self.held {
            None => MachineState::Empty,
            Some(_) if self.remaining > 0 => MachineState::Processing,
            Some(_) => MachineState::Done,
        }
    }

    fn pull(&mut self, inputs: &mut ContainerSet<'_>) -> Result<bool, ObjectError> {
        if self.held.is_some() {
            return Ok(false);
        }
        for recipe in &self.recipes {
            if inputs.consume(&recipe.inputs)? {
                self.held = Some(recipe.output.clone());
                self.remaining = recipe.duration;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn output(&self) -> Option<ItemStack> {
        match self.state() {
            MachineState::Done => self.held.clone(),
            _ => None,
        }
    }

    fn reset(&mut self, successful: bool) {
        // Nothing was delivered; keep the product.
        if !successful {
            return;
        }
        self.held = None;
        self.remaining = 0;
    }

    fn elapse(&mut self, ticks: u32) {
        if self.held.is_some() {
            self.remaining = self.remaining.saturating_sub(ticks);
        }
    }
}
