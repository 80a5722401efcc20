//! Stealth: entity скрыта, пока в её поле нет живого врага.

use bevy::prelude::*;

use crate::components::{are_hostile, is_living};
use crate::contact::{contacts_of, Contactable, DetectionField, Interaction};
use crate::entity::{broadcast, id_of, ComponentKind};
use crate::presentation::note;
use crate::{contactable_composable, logger};

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Stealth {
    field: DetectionField,
    hidden: bool,
}

impl Stealth {
    pub fn new(radius: f32) -> Self {
        Self {
            field: DetectionField::new(radius, Interaction::actors()),
            hidden: true,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }
}

contactable_composable!(Stealth => Stealth, requires [Position, SceneNode]);

impl Contactable for Stealth {
    fn field(&self) -> &DetectionField {
        &self.field
    }

    fn field_mut(&mut self) -> &mut DetectionField {
        &mut self.field
    }

    fn contact_did_begin(world: &mut World, receiver: Entity, _other: Entity) {
        refresh(world, receiver);
    }

    fn contact_did_end(world: &mut World, receiver: Entity, _other: Entity) {
        refresh(world, receiver);
    }
}

/// false для entity без Stealth.
pub fn is_hidden(world: &World, entity: Entity) -> bool {
    world.get::<Stealth>(entity).is_some_and(Stealth::is_hidden)
}

fn refresh(world: &mut World, entity: Entity) {
    let exposed = contacts_of::<Stealth>(world, entity)
        .into_iter()
        .any(|other| is_living(world, other) && are_hostile(world, entity, other));

    let was_hidden = {
        let Some(mut stealth) = world.get_mut::<Stealth>(entity) else {
            return;
        };
        let hidden = !exposed;
        if stealth.hidden == hidden {
            return;
        }
        let was_hidden = stealth.hidden;
        stealth.hidden = hidden;
        was_hidden
    };

    if was_hidden {
        note(world, "Spotted!");
        logger::log(&format!("{} spotted", id_of(world, entity).unwrap_or_default()));
    }
    broadcast(world, entity, ComponentKind::Stealth);
}

/// Система: враги умирают внутри поля без contact end, пересчитываем.
pub fn update_stealth(world: &mut World) {
    let mut query = world.query_filtered::<Entity, With<Stealth>>();
    let mut entities: Vec<Entity> = query.iter(world).collect();
    entities.sort_by_key(|entity| entity.index());
    for entity in entities {
        refresh(world, entity);
    }
}
