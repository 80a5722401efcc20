//! Influence: условия действуют, пока цель внутри поля.

use bevy::prelude::*;
use std::sync::Arc;

use super::entities_with;
use crate::components::{are_hostile, is_living};
use crate::conditions::{apply_condition, remove_condition, Condition};
use crate::contact::{contacts_of, Contactable, DetectionField, Interaction};
use crate::contactable_composable;

#[derive(Component, Debug, Clone)]
pub struct Influence {
    field: DetectionField,
    pub conditions: Vec<Arc<dyn Condition>>,
    /// true: на врагов, false: на союзников
    pub hostile: bool,
}

impl Influence {
    pub fn new(radius: f32, hostile: bool) -> Self {
        Self {
            field: DetectionField::new(radius, Interaction::actors()),
            conditions: Vec::new(),
            hostile,
        }
    }

    pub fn with_condition(mut self, condition: Arc<dyn Condition>) -> Self {
        self.conditions.push(condition);
        self
    }
}

contactable_composable!(Influence => Influence, requires [Position, SceneNode]);

fn influenced(world: &World, owner: Entity, other: Entity) -> Option<Vec<Arc<dyn Condition>>> {
    let influence = world.get::<Influence>(owner)?;
    (are_hostile(world, owner, other) == influence.hostile).then(|| influence.conditions.clone())
}

/// Другое Influence с тем же условием всё ещё держит `target` в поле.
fn still_covered(world: &mut World, except: Entity, target: Entity, identifier: &str) -> bool {
    entities_with::<Influence>(world)
        .into_iter()
        .filter(|owner| *owner != except)
        .any(|owner| {
            contacts_of::<Influence>(world, owner).contains(&target)
                && influenced(world, owner, target)
                    .is_some_and(|conditions| conditions.iter().any(|c| c.identifier() == identifier))
        })
}

impl Contactable for Influence {
    fn field(&self) -> &DetectionField {
        &self.field
    }

    fn field_mut(&mut self) -> &mut DetectionField {
        &mut self.field
    }

    fn contact_did_begin(world: &mut World, receiver: Entity, other: Entity) {
        if !is_living(world, other) {
            return;
        }
        let Some(conditions) = influenced(world, receiver, other) else {
            return;
        };
        for condition in conditions {
            apply_condition(world, other, condition);
        }
    }

    fn contact_did_end(world: &mut World, receiver: Entity, other: Entity) {
        let Some(conditions) = influenced(world, receiver, other) else {
            return;
        };
        for condition in conditions {
            if !still_covered(world, receiver, other, condition.identifier()) {
                remove_condition(world, other, condition.identifier());
            }
        }
    }
}
