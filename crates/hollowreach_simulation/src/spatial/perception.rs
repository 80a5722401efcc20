use bevy::prelude::*;

use crate::contact::{contacts_of, Contactable, DetectionField, Interaction};
use crate::contactable_composable;
use crate::entity::{broadcast, ComponentKind};

/// Что entity видит вокруг себя (живые акторы в радиусе).
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Perception {
    field: DetectionField,
}

impl Perception {
    pub fn new(radius: f32) -> Self {
        Self::with_interaction(radius, Interaction::actors())
    }

    pub fn with_interaction(radius: f32, interaction: Interaction) -> Self {
        Self {
            field: DetectionField::new(radius, interaction),
        }
    }

    pub fn radius(&self) -> f32 {
        self.field.radius
    }
}

contactable_composable!(Perception => Perception, requires [Position, SceneNode]);

impl Contactable for Perception {
    fn field(&self) -> &DetectionField {
        &self.field
    }

    fn field_mut(&mut self) -> &mut DetectionField {
        &mut self.field
    }

    fn contact_did_begin(world: &mut World, receiver: Entity, _other: Entity) {
        broadcast(world, receiver, ComponentKind::Perception);
    }

    fn contact_did_end(world: &mut World, receiver: Entity, _other: Entity) {
        broadcast(world, receiver, ComponentKind::Perception);
    }
}

/// Воспринимаемые entity (живые handles, в порядке появления).
pub fn perceived(world: &World, entity: Entity) -> Vec<Entity> {
    contacts_of::<Perception>(world, entity)
}
