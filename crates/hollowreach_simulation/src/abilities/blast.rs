//! Blast: после `delay` один раз действует на всех в радиусе и исчезает.

use bevy::prelude::*;

use super::{entities_with, Effect};
use crate::components::position_of;
use crate::contact::{contacts_of, Contactable, DetectionField, Interaction};
use crate::entity::{despawn_entity, id_of};
use crate::presentation::play_sound;
use crate::{contactable_composable, logger};

#[derive(Component, Debug, Clone)]
pub struct Blast {
    field: DetectionField,
    pub effect: Effect,
    pub delay: f32,
    elapsed: f32,
    owner: Option<Entity>,
}

impl Blast {
    pub fn new(radius: f32, delay: f32, effect: Effect) -> Self {
        Self {
            field: DetectionField::new(radius, Interaction::actors()),
            effect,
            delay,
            elapsed: 0.0,
            owner: None,
        }
    }

    /// Урон засчитывается владельцу (опыт, retribution)
    pub fn from_owner(mut self, owner: Entity) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn owner(&self) -> Option<Entity> {
        self.owner
    }
}

contactable_composable!(Blast => Blast, requires [Position, SceneNode]);

impl Contactable for Blast {
    fn field(&self) -> &DetectionField {
        &self.field
    }

    fn field_mut(&mut self) -> &mut DetectionField {
        &mut self.field
    }
}

fn detonate(world: &mut World, blast: Entity) -> usize {
    let Some(component) = world.get::<Blast>(blast) else {
        return 0;
    };
    let (effect, owner) = (component.effect.clone(), component.owner);
    let targets: Vec<Entity> = contacts_of::<Blast>(world, blast)
        .into_iter()
        .filter(|target| effect.affects(world, blast, *target))
        .collect();

    if let Some(at) = position_of(world, blast) {
        play_sound(world, "blast", at);
    }
    let hits = targets
        .into_iter()
        .filter(|target| effect.apply(world, owner, *target))
        .count();
    logger::log(&format!(
        "{} detonated, {} hit",
        id_of(world, blast).unwrap_or_default(),
        hits
    ));
    hits
}

/// Система: отсчёт и детонация.
pub fn tick_blasts(world: &mut World) {
    let delta = crate::frame_delta(world);
    for blast in entities_with::<Blast>(world) {
        let due = match world.get_mut::<Blast>(blast) {
            Some(mut component) => {
                component.elapsed += delta;
                component.elapsed >= component.delay
            }
            None => continue,
        };
        if due {
            detonate(world, blast);
            despawn_entity(world, blast);
        }
    }
}
