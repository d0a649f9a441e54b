//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Runtime knobs for the automation engine. Every field has a default, so a
/// partial config file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// When false, ticks perform no pass.
    pub enabled: bool,
    /// Run a pass every N tick signals. Values below 1 behave as 1.
    pub automation_interval: u32,
    /// Continue connection search through chained containers.
    pub join_through_containers: bool,
    /// Continue connection search through connector objects.
    pub join_through_connectors: bool,
    /// Kind names treated as connectors in addition to registry roles.
    pub extra_connectors: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            automation_interval: 1,
            join_through_containers: true,
            join_through_connectors: true,
            extra_connectors: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// The effective pass interval, never zero.
    pub fn interval(&self) -> u32 {
        self.automation_interval.max(1)
    }
}
