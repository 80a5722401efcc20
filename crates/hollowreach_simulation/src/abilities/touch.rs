//! Touch: урон при касании (шипы, слизь), с перезарядкой на каждую цель.

use bevy::prelude::*;
use std::sync::Arc;

use super::{entities_with, strike};
use crate::combat::{Damage, Medium};
use crate::components::{are_hostile, is_living};
use crate::conditions::Condition;
use crate::contact::{contacts_of, Contactable, DetectionField, Interaction};
use crate::contactable_composable;

#[derive(Component, Debug, Clone)]
pub struct Touch {
    field: DetectionField,
    pub damage: Option<Damage>,
    pub conditions: Vec<Arc<dyn Condition>>,
    /// Пауза перед повторным касанием той же цели
    pub cooldown: f32,
    recent: Vec<(Entity, f32)>,
}

impl Touch {
    pub fn new(radius: f32, damage: Damage, cooldown: f32) -> Self {
        Self {
            field: DetectionField::new(radius, Interaction::actors()),
            damage: Some(damage),
            conditions: Vec::new(),
            cooldown,
            recent: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Arc<dyn Condition>) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn is_cooling_down(&self, target: Entity) -> bool {
        self.recent.iter().any(|(entity, _)| *entity == target)
    }

    fn tick(&mut self, delta: f32) {
        for (_, remaining) in self.recent.iter_mut() {
            *remaining -= delta;
        }
        self.recent.retain(|(_, remaining)| *remaining > 0.0);
    }
}

contactable_composable!(Touch => Touch, requires [Position, SceneNode]);

impl Contactable for Touch {
    fn field(&self) -> &DetectionField {
        &self.field
    }

    fn field_mut(&mut self) -> &mut DetectionField {
        &mut self.field
    }
}

/// Система: касания всех враждебных контактов вне перезарядки.
pub fn tick_touches(world: &mut World) {
    let delta = crate::frame_delta(world);
    for owner in entities_with::<Touch>(world) {
        if !is_living(world, owner) {
            continue;
        }
        let (damage, conditions, cooldown) = {
            let Some(mut touch) = world.get_mut::<Touch>(owner) else {
                continue;
            };
            touch.tick(delta);
            (touch.damage.clone(), touch.conditions.clone(), touch.cooldown)
        };

        let targets: Vec<Entity> = {
            let Some(touch) = world.get::<Touch>(owner) else {
                continue;
            };
            contacts_of::<Touch>(world, owner)
                .into_iter()
                .filter(|other| !touch.is_cooling_down(*other))
                .filter(|other| is_living(world, *other) && are_hostile(world, owner, *other))
                .collect()
        };

        for target in targets {
            if let Some(mut touch) = world.get_mut::<Touch>(owner) {
                touch.recent.push((target, cooldown));
            }
            strike(world, owner, target, Medium::Melee, damage.as_ref(), &conditions);
        }
    }
}
