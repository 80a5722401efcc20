//! PickUp: предметы на земле переходят в inventory при контакте.

use bevy::prelude::*;

use crate::components::position_of;
use crate::contact::{contacts_of, ContactGroup, Contactable, DetectionField, Interaction};
use crate::entity::{broadcast, despawn_entity, ComponentKind};
use crate::presentation::{note, play_sound, Notice};
use crate::progression::{give_item, ItemCatalog, ItemId};
use crate::{composable, contactable_composable, logger};

/// Предмет, лежащий в мире.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Pickable {
    pub item: ItemId,
    pub quantity: u32,
}

impl Pickable {
    pub fn new(item: impl Into<ItemId>, quantity: u32) -> Self {
        Self {
            item: item.into(),
            quantity,
        }
    }
}

composable!(Pickable => Pickable, requires [Body]);

#[derive(Component, Debug, Clone, PartialEq)]
pub struct PickUp {
    field: DetectionField,
}

impl PickUp {
    pub fn new(radius: f32) -> Self {
        Self {
            field: DetectionField::new(radius, Interaction::new(ContactGroup::ITEM)),
        }
    }
}

contactable_composable!(PickUp => PickUp, requires [Position, SceneNode, Inventory]);

impl Contactable for PickUp {
    fn field(&self) -> &DetectionField {
        &self.field
    }

    fn field_mut(&mut self) -> &mut DetectionField {
        &mut self.field
    }

    fn contact_did_begin(world: &mut World, receiver: Entity, other: Entity) {
        pick_up(world, receiver, other);
    }
}

/// Переложить предмет в inventory. Возвращает число взятых единиц.
///
/// Полный inventory: "Inventory full", предмет остаётся на месте.
/// Частично взятый стек остаётся с уменьшенным quantity.
pub fn pick_up(world: &mut World, picker: Entity, item_entity: Entity) -> u32 {
    let Some(pickable) = world.get::<Pickable>(item_entity).cloned() else {
        return 0;
    };
    if pickable.quantity == 0 {
        return 0;
    }

    let added = give_item(world, picker, &pickable.item, pickable.quantity);
    if added == 0 {
        note(world, "Inventory full");
        return 0;
    }

    let name = world
        .get_resource::<ItemCatalog>()
        .map(|catalog| catalog.name(&pickable.item))
        .unwrap_or_else(|| pickable.item.to_string());
    let label = if added > 1 { format!("{name} x{added}") } else { name };
    logger::log(&format!("picked up {label}"));
    world.send_event(Notice::PickUp(label));
    if let Some(at) = position_of(world, picker) {
        play_sound(world, "pickup", at);
    }

    if added >= pickable.quantity {
        despawn_entity(world, item_entity);
    } else if let Some(mut remaining) = world.get_mut::<Pickable>(item_entity) {
        remaining.quantity -= added;
        broadcast(world, item_entity, ComponentKind::Pickable);
    }
    added
}

/// Предметы, которые сейчас в радиусе подбора.
pub fn items_in_reach(world: &World, picker: Entity) -> Vec<Entity> {
    contacts_of::<PickUp>(world, picker)
        .into_iter()
        .filter(|other| world.get::<Pickable>(*other).is_some())
        .collect()
}
