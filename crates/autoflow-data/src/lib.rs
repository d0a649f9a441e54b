//! Data-file loading for the automation engine.
//!
//! A data directory holds `items`, `recipes` (optional), `kinds` and
//! `automation` (optional) files, each in RON, TOML or JSON.

pub mod loader;
pub mod schema;

pub use loader::{
    load_automation_data, load_catalog, load_config, AutomationData, DataLoadError,
};
