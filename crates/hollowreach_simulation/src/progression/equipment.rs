//! Equipment: надетые предметы по слотам, их модификаторы применены к
//! боевым компонентам владельца.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{apply_modifier, give_item, take_item, EquipmentSlot, Inventory, ItemCatalog, ItemId};
use crate::composable;
use crate::entity::{broadcast, id_of, ComponentKind};
use crate::logger;
use crate::presentation::note;

#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    slots: BTreeMap<EquipmentSlot, ItemId>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: EquipmentSlot) -> Option<&ItemId> {
        self.slots.get(&slot)
    }

    pub fn is_slot_empty(&self, slot: EquipmentSlot) -> bool {
        !self.slots.contains_key(&slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EquipmentSlot, &ItemId)> {
        self.slots.iter().map(|(slot, item)| (*slot, item))
    }
}

composable!(Equipment => Equipment, requires [Inventory]);

/// Надеть предмет из inventory. Занятый слот сначала освобождается.
pub fn equip(world: &mut World, entity: Entity, item: &ItemId) -> bool {
    let Some(definition) = world
        .get_resource::<ItemCatalog>()
        .and_then(|catalog| catalog.get(item))
        .cloned()
    else {
        return false;
    };
    let Some(slot) = definition.slot else {
        note(world, "Can't equip that");
        return false;
    };
    if world.get::<Equipment>(entity).is_none() {
        return false;
    }
    if take_item(world, entity, item, 1) == 0 {
        return false;
    }

    if world
        .get::<Equipment>(entity)
        .is_some_and(|equipment| !equipment.is_slot_empty(slot))
        && !unequip(world, entity, slot)
    {
        // Старый предмет некуда деть: вернуть новый на место
        give_item(world, entity, item, 1);
        return false;
    }

    if let Some(mut equipment) = world.get_mut::<Equipment>(entity) {
        equipment.slots.insert(slot, item.clone());
    }
    for modifier in &definition.modifiers {
        apply_modifier(world, entity, modifier, 1.0);
    }
    logger::log(&format!(
        "{} equipped {} ({:?})",
        id_of(world, entity).unwrap_or_default(),
        item,
        slot
    ));
    broadcast(world, entity, ComponentKind::Equipment);
    true
}

/// Снять предмет в inventory. false: слот пуст или inventory full.
pub fn unequip(world: &mut World, entity: Entity, slot: EquipmentSlot) -> bool {
    let Some(item) = world
        .get::<Equipment>(entity)
        .and_then(|equipment| equipment.get(slot))
        .cloned()
    else {
        return false;
    };
    if give_item(world, entity, &item, 1) == 0 {
        note(world, "Inventory full");
        return false;
    }

    if let Some(mut equipment) = world.get_mut::<Equipment>(entity) {
        equipment.slots.remove(&slot);
    }
    let modifiers = world
        .get_resource::<ItemCatalog>()
        .and_then(|catalog| catalog.get(&item))
        .map(|definition| definition.modifiers.clone())
        .unwrap_or_default();
    for modifier in &modifiers {
        apply_modifier(world, entity, modifier, -1.0);
    }
    broadcast(world, entity, ComponentKind::Equipment);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{DamageAdjustment, DamageType, Defense, Mitigation};
    use crate::components::Health;
    use crate::entity::EntityBlueprint;
    use crate::progression::{ItemDefinition, ItemModifier};

    fn spawn_hero(world: &mut World, capacity: usize) -> Entity {
        EntityBlueprint::new("hero")
            .with(Health::new(100))
            .with(Defense::new(0.1))
            .with(Mitigation::new(0.0))
            .with(DamageAdjustment::new())
            .with(Inventory::new(capacity))
            .with(Equipment::new())
            .spawn(world)
            .unwrap()
    }

    #[test]
    fn test_equip_applies_and_unequip_reverts() {
        let mut world = crate::testing::world();
        let hero = spawn_hero(&mut world, 4);
        give_item(&mut world, hero, &"leather_armor".into(), 1);

        assert!(equip(&mut world, hero, &"leather_armor".into()));
        assert_eq!(world.get::<Inventory>(hero).unwrap().count(&"leather_armor".into()), 0);
        assert!((world.get::<Defense>(hero).unwrap().defense() - 0.15).abs() < 1e-5);
        assert_eq!(world.get::<Mitigation>(hero).unwrap().mitigation(DamageType::Physical), 1.0);

        assert!(unequip(&mut world, hero, EquipmentSlot::Armor));
        assert!((world.get::<Defense>(hero).unwrap().defense() - 0.1).abs() < 1e-5);
        assert_eq!(world.get::<Inventory>(hero).unwrap().count(&"leather_armor".into()), 1);
    }

    #[test]
    fn test_equip_requires_item_in_inventory() {
        let mut world = crate::testing::world();
        let hero = spawn_hero(&mut world, 4);
        assert!(!equip(&mut world, hero, &"short_sword".into()));
        give_item(&mut world, hero, &"gold".into(), 5);
        assert!(!equip(&mut world, hero, &"gold".into()));
    }

    #[test]
    fn test_unequip_fails_when_inventory_full() {
        let mut world = crate::testing::world();
        let hero = spawn_hero(&mut world, 1);
        give_item(&mut world, hero, &"short_sword".into(), 1);
        assert!(equip(&mut world, hero, &"short_sword".into()));
        give_item(&mut world, hero, &"gold".into(), 1);

        assert!(!unequip(&mut world, hero, EquipmentSlot::Weapon));
        assert!(world.get::<Equipment>(hero).unwrap().get(EquipmentSlot::Weapon).is_some());
        let caused = world.get::<DamageAdjustment>(hero).unwrap().damage_caused(DamageType::Fire);
        assert!((caused - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_equip_swaps_occupied_slot() {
        let mut world = crate::testing::world();
        let hero = spawn_hero(&mut world, 4);
        give_item(&mut world, hero, &"short_sword".into(), 1);
        world
            .resource_mut::<ItemCatalog>()
            .insert(ItemDefinition::new("war_axe", "War Axe").equippable(
                EquipmentSlot::Weapon,
                vec![ItemModifier::DamageCaused(0.3)],
            ));
        give_item(&mut world, hero, &"war_axe".into(), 1);

        assert!(equip(&mut world, hero, &"short_sword".into()));
        assert!(equip(&mut world, hero, &"war_axe".into()));

        let equipment = world.get::<Equipment>(hero).unwrap();
        assert_eq!(equipment.get(EquipmentSlot::Weapon), Some(&"war_axe".into()));
        assert_eq!(world.get::<Inventory>(hero).unwrap().count(&"short_sword".into()), 1);
        let caused = world.get::<DamageAdjustment>(hero).unwrap().damage_caused(DamageType::Physical);
        assert!((caused - 0.3).abs() < 1e-5);
    }
}
