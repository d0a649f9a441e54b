//! Serde data file structs for automation content definitions.
//!
//! These structs define the on-disk format for items, recipes and object
//! kinds. They are deserialized from RON, JSON, or TOML data files and then
//! resolved into registry types by the loader.

use serde::Deserialize;

// ===========================================================================
// Items
// ===========================================================================

/// An item type definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
}

// ===========================================================================
// Recipes
// ===========================================================================

/// A recipe input entry, in short tuple form or full form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeInputData {
    /// Short form: `("item_name", quantity)`.
    Short(String, u32),
    /// Full form with explicit fields.
    Full { item: String, quantity: u32 },
}

impl RecipeInputData {
    pub fn item(&self) -> &str {
        match self {
            RecipeInputData::Short(item, _) | RecipeInputData::Full { item, .. } => item,
        }
    }

    pub fn quantity(&self) -> u32 {
        match self {
            RecipeInputData::Short(_, quantity) | RecipeInputData::Full { quantity, .. } => {
                *quantity
            }
        }
    }
}

/// A recipe definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<RecipeInputData>,
    pub output: (String, u32),
    /// Ticks from start to done. Zero finishes immediately.
    #[serde(default)]
    pub duration: u32,
}

// ===========================================================================
// Kinds
// ===========================================================================

/// What automation does with an object kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleData {
    Machine,
    Container,
    Connector,
}

/// An object kind definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct KindData {
    pub name: String,
    pub role: RoleData,
    #[serde(default = "default_footprint")]
    pub footprint: FootprintData,
    /// Machine kinds: recipe names, tried in order.
    #[serde(default)]
    pub recipes: Vec<String>,
    /// Container kinds: item capacity.
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    /// Container kinds: accepted item names. Absent means anything.
    #[serde(default)]
    pub accepts: Option<Vec<String>>,
}

/// The footprint (size) of an object on the grid.
#[derive(Debug, Clone, Deserialize)]
pub struct FootprintData {
    pub width: u32,
    pub height: u32,
}

fn default_footprint() -> FootprintData {
    FootprintData {
        width: 1,
        height: 1,
    }
}

fn default_capacity() -> u32 {
    36
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // RON deserialization
    // -----------------------------------------------------------------------

    #[test]
    fn item_data_from_ron() {
        let item: ItemData = ron::from_str(r#"(name: "copper_ore")"#).unwrap();
        assert_eq!(item.name, "copper_ore");
    }

    #[test]
    fn recipe_data_from_ron() {
        let ron = r#"
            (
                name: "smelt_copper",
                inputs: [("copper_ore", 5), ("coal", 1)],
                output: ("copper_bar", 1),
                duration: 30,
            )
        "#;
        let recipe: RecipeData = ron::from_str(ron).unwrap();
        assert_eq!(recipe.name, "smelt_copper");
        assert_eq!(recipe.inputs.len(), 2);
        match &recipe.inputs[0] {
            RecipeInputData::Short(name, qty) => {
                assert_eq!(name, "copper_ore");
                assert_eq!(*qty, 5);
            }
            other => panic!("expected Short variant, got {other:?}"),
        }
        assert_eq!(recipe.inputs[1].item(), "coal");
        assert_eq!(recipe.inputs[1].quantity(), 1);
        assert_eq!(recipe.output, ("copper_bar".to_string(), 1));
        assert_eq!(recipe.duration, 30);
    }

    #[test]
    fn recipe_without_inputs_from_ron() {
        let recipe: RecipeData =
            ron::from_str(r#"(name: "tap", output: ("syrup", 1))"#).unwrap();
        assert!(recipe.inputs.is_empty());
        assert_eq!(recipe.duration, 0);
    }

    #[test]
    fn kind_data_from_ron() {
        let ron = r#"
            (
                name: "furnace",
                role: machine,
                footprint: (width: 2, height: 2),
                recipes: ["smelt_copper"],
            )
        "#;
        let kind: KindData = ron::from_str(ron).unwrap();
        assert_eq!(kind.role, RoleData::Machine);
        assert_eq!(kind.footprint.width, 2);
        assert_eq!(kind.recipes, vec!["smelt_copper".to_string()]);
    }

    #[test]
    fn kind_data_defaults_from_ron() {
        let kind: KindData = ron::from_str(r#"(name: "chest", role: container)"#).unwrap();
        assert_eq!(kind.role, RoleData::Container);
        assert_eq!(kind.footprint.width, 1);
        assert_eq!(kind.footprint.height, 1);
        assert_eq!(kind.capacity, 36);
        assert!(kind.accepts.is_none());
        assert!(kind.recipes.is_empty());
    }

    // -----------------------------------------------------------------------
    // JSON deserialization
    // -----------------------------------------------------------------------

    #[test]
    fn kind_data_from_json() {
        let json = r#"{"name": "ore_bin", "role": "container", "capacity": 10, "accepts": ["ore"]}"#;
        let kind: KindData = serde_json::from_str(json).unwrap();
        assert_eq!(kind.capacity, 10);
        assert_eq!(kind.accepts, Some(vec!["ore".to_string()]));
    }

    #[test]
    fn recipe_data_from_json() {
        let json = r#"{
            "name": "smelt",
            "inputs": [["ore", 5], {"item": "coal", "quantity": 1}],
            "output": ["bar", 1],
            "duration": 3
        }"#;
        let recipe: RecipeData = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.inputs[0].item(), "ore");
        assert!(matches!(
            &recipe.inputs[1],
            RecipeInputData::Full { item, quantity: 1 } if item == "coal"
        ));
        assert_eq!(recipe.output.1, 1);
    }

    // -----------------------------------------------------------------------
    // TOML deserialization
    // -----------------------------------------------------------------------

    #[test]
    fn kinds_from_toml() {
        let toml_str = r#"
[[kinds]]
name = "path"
role = "connector"

[[kinds]]
name = "tapper"
role = "machine"
recipes = ["tap"]
"#;
        #[derive(Deserialize)]
        struct Listed {
            kinds: Vec<KindData>,
        }
        let wrapper: Listed = toml::from_str(toml_str).unwrap();
        assert_eq!(wrapper.kinds.len(), 2);
        assert_eq!(wrapper.kinds[0].role, RoleData::Connector);
        assert_eq!(wrapper.kinds[1].recipes, vec!["tap".to_string()]);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let result: Result<KindData, _> = ron::from_str(r#"(name: "x", role: conveyor)"#);
        assert!(result.is_err());
    }
}
