//! Item catalog: статические определения предметов (defaults + RON).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Item identifier (unique string ID), например "short_sword".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Reflect)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Reflect)]
pub enum EquipmentSlot {
    Weapon,
    Armor,
    Ring,
    Amulet,
}

/// Поправка к боевому компоненту (экипировка, навыки).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ItemModifier {
    Defense(f32),
    Resistance(f32),
    CriticalChance(f32),
    Mitigation(f32),
    DamageCaused(f32),
    MaxHealth(u32),
}

/// Static item definition (blueprint).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub id: ItemId,
    pub name: String,
    /// Максимум в одном стаке инвентаря
    #[serde(default = "default_max_stack")]
    pub max_stack: u32,
    #[serde(default)]
    pub slot: Option<EquipmentSlot>,
    #[serde(default)]
    pub modifiers: Vec<ItemModifier>,
}

fn default_max_stack() -> u32 {
    1
}

impl ItemDefinition {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            max_stack: 1,
            slot: None,
            modifiers: Vec::new(),
        }
    }

    pub fn stackable(mut self, max_stack: u32) -> Self {
        self.max_stack = max_stack.max(1);
        self
    }

    pub fn equippable(mut self, slot: EquipmentSlot, modifiers: Vec<ItemModifier>) -> Self {
        self.slot = Some(slot);
        self.modifiers = modifiers;
        self
    }
}

/// Item definitions lookup table (resource).
#[derive(Resource, Debug, Clone)]
pub struct ItemCatalog {
    definitions: HashMap<ItemId, ItemDefinition>,
}

impl Default for ItemCatalog {
    fn default() -> Self {
        Self::from_definitions([
            ItemDefinition::new("gold", "Gold").stackable(999),
            ItemDefinition::new("health_potion", "Health Potion").stackable(10),
            ItemDefinition::new("throwing_knife", "Throwing Knife").stackable(20),
            ItemDefinition::new("short_sword", "Short Sword")
                .equippable(EquipmentSlot::Weapon, vec![ItemModifier::DamageCaused(0.1)]),
            ItemDefinition::new("leather_armor", "Leather Armor").equippable(
                EquipmentSlot::Armor,
                vec![ItemModifier::Defense(0.05), ItemModifier::Mitigation(1.0)],
            ),
            ItemDefinition::new("ring_of_precision", "Ring of Precision")
                .equippable(EquipmentSlot::Ring, vec![ItemModifier::CriticalChance(0.1)]),
            ItemDefinition::new("amulet_of_warding", "Amulet of Warding").equippable(
                EquipmentSlot::Amulet,
                vec![ItemModifier::Resistance(0.1), ItemModifier::MaxHealth(10)],
            ),
        ])
    }
}

impl ItemCatalog {
    pub fn from_definitions(definitions: impl IntoIterator<Item = ItemDefinition>) -> Self {
        Self {
            definitions: definitions
                .into_iter()
                .map(|definition| (definition.id.clone(), definition))
                .collect(),
        }
    }

    /// RON: список `ItemDefinition`. Поверх defaults (одноимённые заменяются).
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let definitions: Vec<ItemDefinition> = ron::from_str(source)?;
        let mut catalog = Self::default();
        for definition in definitions {
            catalog.insert(definition);
        }
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        Self::from_ron_str(&contents)
    }

    pub fn insert(&mut self, definition: ItemDefinition) {
        self.definitions.insert(definition.id.clone(), definition);
    }

    pub fn get(&self, id: &ItemId) -> Option<&ItemDefinition> {
        self.definitions.get(id)
    }

    /// Неизвестные предметы не стакаются
    pub fn max_stack(&self, id: &ItemId) -> u32 {
        self.get(id).map_or(1, |definition| definition.max_stack)
    }

    pub fn name(&self, id: &ItemId) -> String {
        self.get(id)
            .map_or_else(|| id.0.clone(), |definition| definition.name.clone())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_lookup() {
        let catalog = ItemCatalog::default();
        let sword = catalog.get(&"short_sword".into()).unwrap();
        assert_eq!(sword.slot, Some(EquipmentSlot::Weapon));
        assert_eq!(catalog.max_stack(&"gold".into()), 999);
        assert_eq!(catalog.max_stack(&"mystery".into()), 1);
        assert_eq!(catalog.name(&"mystery".into()), "mystery");
    }

    #[test]
    fn test_ron_overrides_and_extends_defaults() {
        let source = r#"[
            (id: "gold", name: "Coins", max_stack: 50),
            (id: "war_axe", name: "War Axe", slot: Some(Weapon), modifiers: [DamageCaused(0.3)]),
        ]"#;
        let catalog = ItemCatalog::from_ron_str(source).unwrap();

        assert_eq!(catalog.max_stack(&"gold".into()), 50);
        assert_eq!(catalog.name(&"gold".into()), "Coins");
        let axe = catalog.get(&"war_axe".into()).unwrap();
        assert_eq!(axe.modifiers, vec![ItemModifier::DamageCaused(0.3)]);
        assert_eq!(axe.max_stack, 1);
    }

    #[test]
    fn test_invalid_ron_is_parse_error() {
        assert!(matches!(
            ItemCatalog::from_ron_str("[(id: 5)]"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
