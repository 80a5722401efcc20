//! Aura: раз в `interval` секунд действует на всех в радиусе.

use bevy::prelude::*;

use super::{entities_with, Effect};
use crate::contact::{contacts_of, Contactable, DetectionField, Interaction};
use crate::contactable_composable;

/// Минимальный интервал: один шаг FixedUpdate (60 Hz)
pub const MIN_INTERVAL: f32 = 1.0 / 60.0;
/// Потолок пульсов за кадр, остаток накопленного времени сгорает
const MAX_PULSES_PER_FRAME: u32 = 8;

#[derive(Component, Debug, Clone)]
pub struct Aura {
    field: DetectionField,
    pub effect: Effect,
    pub interval: f32,
    elapsed: f32,
    /// Дружественная аура действует и на владельца
    pub includes_owner: bool,
}

impl Aura {
    pub fn new(radius: f32, interval: f32, effect: Effect) -> Self {
        let includes_owner = !effect.is_hostile();
        Self {
            field: DetectionField::new(radius, Interaction::actors()),
            effect,
            interval: interval.max(MIN_INTERVAL),
            elapsed: 0.0,
            includes_owner,
        }
    }

    pub fn with_interaction(mut self, interaction: Interaction) -> Self {
        self.field = DetectionField::new(self.field.radius, interaction);
        self
    }

    /// Сколько срабатываний накопилось за `delta`.
    fn advance(&mut self, delta: f32) -> u32 {
        let interval = self.interval.max(MIN_INTERVAL);
        self.elapsed += delta.max(0.0);
        let due = (self.elapsed / interval).floor();
        if due < 1.0 {
            return 0;
        }
        if due > MAX_PULSES_PER_FRAME as f32 {
            self.elapsed = 0.0;
            return MAX_PULSES_PER_FRAME;
        }
        self.elapsed = (self.elapsed - due * interval).max(0.0);
        due as u32
    }
}

contactable_composable!(Aura => Aura, requires [Position, SceneNode]);

impl Contactable for Aura {
    fn field(&self) -> &DetectionField {
        &self.field
    }

    fn field_mut(&mut self) -> &mut DetectionField {
        &mut self.field
    }
}

fn pulse(world: &mut World, owner: Entity) -> usize {
    let Some(aura) = world.get::<Aura>(owner) else {
        return 0;
    };
    let effect = aura.effect.clone();
    let mut targets = contacts_of::<Aura>(world, owner);
    if aura.includes_owner {
        targets.insert(0, owner);
    }
    targets.retain(|target| effect.affects(world, owner, *target));

    targets
        .into_iter()
        .filter(|target| effect.apply(world, Some(owner), *target))
        .count()
}

/// Система: пульсы аур.
pub fn tick_auras(world: &mut World) {
    let delta = crate::frame_delta(world);
    for owner in entities_with::<Aura>(world) {
        let pulses = match world.get_mut::<Aura>(owner) {
            Some(mut aura) => aura.advance(delta),
            None => continue,
        };
        for _ in 0..pulses {
            pulse(world, owner);
        }
    }
}
