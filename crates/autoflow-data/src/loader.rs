//! Reads a data directory into a [`Registry`] and an [`EngineConfig`].
//!
//! Each logical file (`items`, `recipes`, `kinds`, `automation`) may be
//! written as RON, TOML or JSON; the extension picks the parser, and two
//! extensions for the same file is an error. TOML has no top-level arrays,
//! so TOML list files keep their entries under a key named after the file
//! (`[[kinds]]`).
//!
//! Names are resolved against the [`RegistryBuilder`] as files are read, in
//! dependency order: items, then recipes, then kinds.

use autoflow_core::config::EngineConfig;
use autoflow_core::registry::{KindDef, RecipeEntry, Registry, RegistryBuilder, RegistryError};
use autoflow_core::spatial::Footprint;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::schema::{ItemData, KindData, RecipeData, RoleData};

/// Errors that can occur while loading a data directory.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("required file '{stem}' not found in {}", dir.display())]
    MissingRequired { stem: &'static str, dir: PathBuf },

    /// The same logical file exists in two formats.
    #[error("conflicting formats: {} and {}", a.display(), b.display())]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {}: {detail}", file.display())]
    Parse { file: PathBuf, detail: String },

    #[error("{} refers to unknown {expected_kind} '{name}'", file.display())]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    #[error("{} defines '{name}' more than once", file.display())]
    DuplicateName { file: PathBuf, name: String },

    /// The resolved catalog failed registry validation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("cannot read {}: {source}", file.display())]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Data files
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Ron,
    Toml,
    Json,
}

const EXTENSIONS: [(Format, &str); 3] = [
    (Format::Ron, "ron"),
    (Format::Toml, "toml"),
    (Format::Json, "json"),
];

/// One logical file located on disk.
#[derive(Debug)]
struct DataFile {
    path: PathBuf,
    format: Format,
}

impl DataFile {
    fn find(dir: &Path, stem: &str) -> Result<Option<Self>, DataLoadError> {
        let mut found: Option<DataFile> = None;
        for (format, ext) in EXTENSIONS {
            let path = dir.join(format!("{stem}.{ext}"));
            if !path.exists() {
                continue;
            }
            if let Some(existing) = found.take() {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.path,
                    b: path,
                });
            }
            found = Some(DataFile { path, format });
        }
        Ok(found)
    }

    fn require(dir: &Path, stem: &'static str) -> Result<Self, DataLoadError> {
        Self::find(dir, stem)?.ok_or_else(|| DataLoadError::MissingRequired {
            stem,
            dir: dir.to_path_buf(),
        })
    }

    /// Deserialize the whole document.
    fn read<T: DeserializeOwned>(&self) -> Result<T, DataLoadError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| DataLoadError::Io {
            file: self.path.clone(),
            source,
        })?;
        match self.format {
            Format::Ron => ron::from_str(&text).map_err(|e| self.parse_error(e)),
            Format::Toml => toml::from_str(&text).map_err(|e| self.parse_error(e)),
            Format::Json => serde_json::from_str(&text).map_err(|e| self.parse_error(e)),
        }
    }

    /// Deserialize a list of entries, found under `key` in TOML files.
    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, DataLoadError> {
        if self.format != Format::Toml {
            return self.read();
        }
        let mut table: toml::Table = self.read()?;
        let list = table
            .remove(key)
            .ok_or_else(|| self.parse_error(format!("missing top-level key '{key}'")))?;
        list.try_into()
            .map_err(|e: toml::de::Error| self.parse_error(e))
    }

    fn parse_error(&self, detail: impl fmt::Display) -> DataLoadError {
        DataLoadError::Parse {
            file: self.path.clone(),
            detail: detail.to_string(),
        }
    }

    fn unresolved(&self, name: &str, expected_kind: &'static str) -> DataLoadError {
        DataLoadError::UnresolvedRef {
            file: self.path.clone(),
            name: name.to_string(),
            expected_kind,
        }
    }

    fn duplicate(&self, name: &str) -> DataLoadError {
        DataLoadError::DuplicateName {
            file: self.path.clone(),
            name: name.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Everything the engine needs from a data directory.
#[derive(Debug)]
pub struct AutomationData {
    pub registry: Arc<Registry>,
    pub config: EngineConfig,
}

/// Load the catalog and the engine configuration from `dir`.
pub fn load_automation_data(dir: &Path) -> Result<AutomationData, DataLoadError> {
    let registry = Arc::new(load_catalog(dir)?);
    let config = load_config(dir)?;
    Ok(AutomationData { registry, config })
}

/// Load `automation.{ron,toml,json}`. A missing file means defaults.
pub fn load_config(dir: &Path) -> Result<EngineConfig, DataLoadError> {
    let Some(file) = DataFile::find(dir, "automation")? else {
        tracing::debug!(dir = %dir.display(), "no automation config, using defaults");
        return Ok(EngineConfig::default());
    };
    let config: EngineConfig = file.read()?;
    if config.automation_interval == 0 {
        tracing::warn!(file = %file.path.display(), "automation_interval of 0 treated as 1");
    }
    Ok(config)
}

/// Load `items`, `recipes` (optional) and `kinds` and resolve them into a
/// registry.
pub fn load_catalog(dir: &Path) -> Result<Registry, DataLoadError> {
    let mut builder = RegistryBuilder::new();

    let items = DataFile::require(dir, "items")?;
    for item in items.read_list::<ItemData>("items")? {
        if builder.item_id(&item.name).is_some() {
            return Err(items.duplicate(&item.name));
        }
        builder.register_item(&item.name);
    }

    if let Some(recipes) = DataFile::find(dir, "recipes")? {
        for recipe in recipes.read_list::<RecipeData>("recipes")? {
            if builder.recipe_id(&recipe.name).is_some() {
                return Err(recipes.duplicate(&recipe.name));
            }
            let entry = |name: &str, quantity: u32| {
                let item = builder
                    .item_id(name)
                    .ok_or_else(|| recipes.unresolved(name, "item"))?;
                Ok::<_, DataLoadError>(RecipeEntry { item, quantity })
            };
            let inputs = recipe
                .inputs
                .iter()
                .map(|input| entry(input.item(), input.quantity()))
                .collect::<Result<Vec<_>, _>>()?;
            let output = entry(&recipe.output.0, recipe.output.1)?;
            builder.register_recipe(&recipe.name, inputs, output, recipe.duration);
        }
    }

    let kinds = DataFile::require(dir, "kinds")?;
    for kind in kinds.read_list::<KindData>("kinds")? {
        if builder.kind_id(&kind.name).is_some() {
            return Err(kinds.duplicate(&kind.name));
        }
        let def = resolve_kind(&builder, &kind, &kinds)?;
        builder.register_kind(def);
    }

    let registry = builder.build()?;
    tracing::debug!(
        dir = %dir.display(),
        items = registry.item_count(),
        recipes = registry.recipe_count(),
        kinds = registry.kind_count(),
        "loaded catalog"
    );
    Ok(registry)
}

fn resolve_kind(
    builder: &RegistryBuilder,
    kind: &KindData,
    file: &DataFile,
) -> Result<KindDef, DataLoadError> {
    let def = match kind.role {
        RoleData::Machine => {
            let recipes = kind
                .recipes
                .iter()
                .map(|name| {
                    builder
                        .recipe_id(name)
                        .ok_or_else(|| file.unresolved(name, "recipe"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            if recipes.is_empty() {
                tracing::warn!(kind = %kind.name, "machine kind has no recipes and will never start");
            }
            KindDef::machine(&kind.name, recipes)
        }
        RoleData::Container => {
            let def = KindDef::container(&kind.name, kind.capacity);
            match &kind.accepts {
                Some(names) => {
                    let accepted = names
                        .iter()
                        .map(|name| builder.item_id(name).ok_or_else(|| file.unresolved(name, "item")))
                        .collect::<Result<Vec<_>, _>>()?;
                    def.with_filter(accepted)
                }
                None => def,
            }
        }
        RoleData::Connector => KindDef::connector(&kind.name),
    };
    let footprint = Footprint::new(kind.footprint.width, kind.footprint.height);
    Ok(def.with_footprint(footprint))
}
