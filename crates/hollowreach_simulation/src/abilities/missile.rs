//! Missile: летит по прямой, бьёт первого задетого врага, исчезает
//! при попадании или после `range`.

use bevy::prelude::*;

use super::{entities_with, Effect};
use crate::components::{position_of, Position};
use crate::contact::{Contactable, DetectionField, Interaction};
use crate::entity::{despawn_entity, id_of};
use crate::presentation::play_sound;
use crate::{contactable_composable, logger};

#[derive(Component, Debug, Clone)]
pub struct Missile {
    field: DetectionField,
    pub effect: Effect,
    pub velocity: Vec2,
    pub range: f32,
    travelled: f32,
    owner: Option<Entity>,
    spent: bool,
}

impl Missile {
    pub fn new(radius: f32, velocity: Vec2, range: f32, effect: Effect) -> Self {
        Self {
            field: DetectionField::new(radius, Interaction::actors()),
            effect,
            velocity,
            range,
            travelled: 0.0,
            owner: None,
            spent: false,
        }
    }

    pub fn from_owner(mut self, owner: Entity) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn travelled(&self) -> f32 {
        self.travelled
    }
}

contactable_composable!(Missile => Missile, requires [Position, SceneNode]);

impl Contactable for Missile {
    fn field(&self) -> &DetectionField {
        &self.field
    }

    fn field_mut(&mut self) -> &mut DetectionField {
        &mut self.field
    }

    fn contact_did_begin(world: &mut World, receiver: Entity, other: Entity) {
        hit(world, receiver, other);
    }
}

fn hit(world: &mut World, missile: Entity, target: Entity) -> bool {
    let Some(component) = world.get::<Missile>(missile) else {
        return false;
    };
    if component.spent || Some(target) == component.owner || !component.effect.affects(world, missile, target) {
        return false;
    }
    let (effect, owner) = (component.effect.clone(), component.owner);
    if let Some(mut component) = world.get_mut::<Missile>(missile) {
        component.spent = true;
    }

    if let Some(at) = position_of(world, target) {
        play_sound(world, "impact", at);
    }
    logger::log(&format!(
        "{} hits {}",
        id_of(world, missile).unwrap_or_default(),
        id_of(world, target).unwrap_or_default()
    ));
    effect.apply(world, owner, target);
    despawn_entity(world, missile);
    true
}

/// Система: полёт и исчезновение по дальности.
pub fn tick_missiles(world: &mut World) {
    let delta = crate::frame_delta(world);
    for missile in entities_with::<Missile>(world) {
        let (step, out_of_range) = match world.get_mut::<Missile>(missile) {
            Some(mut component) => {
                let step = component.velocity * delta;
                component.travelled += step.length();
                (step, component.travelled >= component.range)
            }
            None => continue,
        };
        if out_of_range {
            despawn_entity(world, missile);
            continue;
        }
        if let Some(mut position) = world.get_mut::<Position>(missile) {
            position.0 += step;
        }
    }
}
