use crate::container::Chest;
use crate::id::*;
use crate::item::{ItemStack, Storage};
use crate::machine::{MachineRecipe, RecipeMachine};
use crate::spatial::Footprint;
use crate::world::WorldObject;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What automation does with objects of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Machine,
    Container,
    Connector,
}

/// An item type definition in the registry.
#[derive(Debug, Clone)]
pub struct ItemTypeDef {
    pub name: String,
}

/// A recipe input/output entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeEntry {
    pub item: ItemTypeId,
    pub quantity: u32,
}

/// A recipe definition.
#[derive(Debug, Clone)]
pub struct RecipeDef {
    pub name: String,
    pub inputs: Vec<RecipeEntry>,
    pub output: RecipeEntry,
    pub duration: u32,
}

/// An object kind definition.
#[derive(Debug, Clone)]
pub struct KindDef {
    pub name: String,
    pub role: Role,
    pub footprint: Footprint,
    /// Machine kinds: recipes tried in order.
    pub recipes: Vec<RecipeId>,
    /// Container kinds: item capacity.
    pub capacity: u32,
    /// Container kinds: accepted item types (`None` = anything).
    pub accepts: Option<Vec<ItemTypeId>>,
}

impl KindDef {
    pub fn machine(name: &str, recipes: Vec<RecipeId>) -> Self {
        Self::with_role(name, Role::Machine).with_recipes(recipes)
    }

    pub fn container(name: &str, capacity: u32) -> Self {
        let mut def = Self::with_role(name, Role::Container);
        def.capacity = capacity;
        def
    }

    pub fn connector(name: &str) -> Self {
        Self::with_role(name, Role::Connector)
    }

    fn with_role(name: &str, role: Role) -> Self {
        Self {
            name: name.to_string(),
            role,
            footprint: Footprint::single(),
            recipes: Vec::new(),
            capacity: 0,
            accepts: None,
        }
    }

    pub fn with_recipes(mut self, recipes: Vec<RecipeId>) -> Self {
        self.recipes = recipes;
        self
    }

    pub fn with_footprint(mut self, footprint: Footprint) -> Self {
        self.footprint = footprint;
        self
    }

    pub fn with_filter(mut self, accepts: Vec<ItemTypeId>) -> Self {
        self.accepts = Some(accepts);
        self
    }
}

/// Collects items, recipes and kinds, then validates them into a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    items: Vec<ItemTypeDef>,
    item_name_to_id: HashMap<String, ItemTypeId>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    kinds: Vec<KindDef>,
    kind_name_to_id: HashMap<String, KindId>,
    duplicates: Vec<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item type. Returns its ID.
    pub fn register_item(&mut self, name: &str) -> ItemTypeId {
        let id = ItemTypeId(self.items.len() as u32);
        self.items.push(ItemTypeDef {
            name: name.to_string(),
        });
        if self.item_name_to_id.insert(name.to_string(), id).is_some() {
            self.duplicates.push(name.to_string());
        }
        id
    }

    /// Register a recipe. Returns its ID.
    pub fn register_recipe(
        &mut self,
        name: &str,
        inputs: Vec<RecipeEntry>,
        output: RecipeEntry,
        duration: u32,
    ) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipes.push(RecipeDef {
            name: name.to_string(),
            inputs,
            output,
            duration,
        });
        if self.recipe_name_to_id.insert(name.to_string(), id).is_some() {
            self.duplicates.push(name.to_string());
        }
        id
    }

    /// Register an object kind. Returns its ID.
    pub fn register_kind(&mut self, def: KindDef) -> KindId {
        let id = KindId(self.kinds.len() as u32);
        if self.kind_name_to_id.insert(def.name.clone(), id).is_some() {
            self.duplicates.push(def.name.clone());
        }
        self.kinds.push(def);
        id
    }

    pub fn item_id(&self, name: &str) -> Option<ItemTypeId> {
        self.item_name_to_id.get(name).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    pub fn kind_id(&self, name: &str) -> Option<KindId> {
        self.kind_name_to_id.get(name).copied()
    }

    /// Validate every cross-reference and freeze the catalog.
    pub fn build(self) -> Result<Registry, RegistryError> {
        if let Some(name) = self.duplicates.into_iter().next() {
            return Err(RegistryError::DuplicateName(name));
        }

        let item_count = self.items.len();
        for recipe in &self.recipes {
            for entry in recipe.inputs.iter().chain(std::iter::once(&recipe.output)) {
                if entry.item.0 as usize >= item_count {
                    return Err(RegistryError::InvalidItemRef(entry.item));
                }
            }
        }
        for kind in &self.kinds {
            if let Some(&bad) = kind
                .recipes
                .iter()
                .find(|r| r.0 as usize >= self.recipes.len())
            {
                return Err(RegistryError::InvalidRecipeRef(bad));
            }
            if let Some(&bad) = kind
                .accepts
                .iter()
                .flatten()
                .find(|i| i.0 as usize >= item_count)
            {
                return Err(RegistryError::InvalidItemRef(bad));
            }
        }

        Ok(Registry {
            items: self.items,
            item_name_to_id: self.item_name_to_id,
            recipes: self.recipes,
            recipe_name_to_id: self.recipe_name_to_id,
            kinds: self.kinds,
            kind_name_to_id: self.kind_name_to_id,
        })
    }
}

/// Immutable catalog of items, recipes and object kinds. Frozen after
/// `build()`; share it behind an `Arc`.
#[derive(Debug)]
pub struct Registry {
    items: Vec<ItemTypeDef>,
    item_name_to_id: HashMap<String, ItemTypeId>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    kinds: Vec<KindDef>,
    kind_name_to_id: HashMap<String, KindId>,
}

impl Registry {
    pub fn get_recipe(&self, id: RecipeId) -> Option<&RecipeDef> {
        self.recipes.get(id.0 as usize)
    }

    pub fn get_kind(&self, id: KindId) -> Option<&KindDef> {
        self.kinds.get(id.0 as usize)
    }

    pub fn item_id(&self, name: &str) -> Option<ItemTypeId> {
        self.item_name_to_id.get(name).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    pub fn kind_id(&self, name: &str) -> Option<KindId> {
        self.kind_name_to_id.get(name).copied()
    }

    /// Role of a kind, or `None` if automation doesn't recognize it.
    pub fn role(&self, kind: KindId) -> Option<Role> {
        self.get_kind(kind).map(|k| k.role)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn kind_count(&self) -> usize {
        self.kinds.len()
    }

    /// The machine recipes for a kind, in registration order.
    pub fn machine_recipes(&self, kind: KindId) -> Vec<MachineRecipe> {
        let Some(def) = self.get_kind(kind) else {
            return Vec::new();
        };
        def.recipes
            .iter()
            .filter_map(|&id| self.get_recipe(id))
            .map(|recipe| MachineRecipe {
                inputs: recipe
                    .inputs
                    .iter()
                    .map(|e| ItemStack::new(e.item, e.quantity))
                    .collect(),
                output: ItemStack::new(recipe.output.item, recipe.output.quantity),
                duration: recipe.duration,
            })
            .collect()
    }

    /// Create the live wrapper for a fresh object of this kind.
    pub fn instantiate(&self, kind: KindId) -> Option<WorldObject> {
        let def = self.get_kind(kind)?;
        let object = match def.role {
            Role::Machine => {
                WorldObject::Machine(Box::new(RecipeMachine::new(self.machine_recipes(kind))))
            }
            Role::Container => {
                let mut storage = Storage::new(def.capacity);
                if let Some(accepts) = &def.accepts {
                    storage = storage.with_filter(accepts.clone());
                }
                WorldObject::Container(Box::new(Chest::with_storage(storage)))
            }
            Role::Connector => WorldObject::Connector,
        };
        Some(object)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate name: {0}")]
    DuplicateName(String),
    #[error("invalid item reference: {0:?}")]
    InvalidItemRef(ItemTypeId),
    #[error("invalid recipe reference: {0:?}")]
    InvalidRecipeRef(RecipeId),
}
