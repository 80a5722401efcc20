//! Throwing: бросок снаряда в точку (нож, бомба), с перезарядкой и
//! опциональным расходом предмета из inventory.

use bevy::prelude::*;

use super::{entities_with, Cooldown, Effect, Missile};
use crate::components::{position_of, Faction, Position, SceneNode};
use crate::entity::{id_of, EntityBlueprint};
use crate::presentation::{note, play_sound};
use crate::progression::{take_item, ItemId, Inventory};
use crate::{composable, logger};

#[derive(Component, Debug, Clone)]
pub struct Throwing {
    pub effect: Effect,
    pub speed: f32,
    pub range: f32,
    /// Радиус detection field снаряда
    pub radius: f32,
    /// Предмет, расходуемый за бросок
    pub ammunition: Option<ItemId>,
    cooldown: Cooldown,
    thrown: u32,
}

impl Throwing {
    pub fn new(effect: Effect, speed: f32, range: f32) -> Self {
        Self {
            effect,
            speed,
            range,
            radius: 0.25,
            ammunition: None,
            cooldown: Cooldown::new(0.0),
            thrown: 0,
        }
    }

    pub fn with_cooldown(mut self, cooldown: f32) -> Self {
        self.cooldown = Cooldown::new(cooldown);
        self
    }

    pub fn with_ammunition(mut self, item: impl Into<ItemId>) -> Self {
        self.ammunition = Some(item.into());
        self
    }

    pub fn is_ready(&self) -> bool {
        self.cooldown.is_ready()
    }

    pub fn thrown(&self) -> u32 {
        self.thrown
    }
}

composable!(Throwing => Throwing, requires [Position]);

/// Бросить снаряд в точку `at`. Возвращает entity снаряда.
///
/// None: перезарядка, нулевое направление или нет боеприпаса.
pub fn throw(world: &mut World, thrower: Entity, at: Vec2) -> Option<Entity> {
    let origin = position_of(world, thrower)?;
    let throwing = world.get::<Throwing>(thrower)?.clone();
    if !throwing.is_ready() {
        return None;
    }
    let direction = (at - origin).normalize_or_zero();
    if direction == Vec2::ZERO {
        return None;
    }

    if let Some(item) = &throwing.ammunition {
        let has_ammunition = world
            .get::<Inventory>(thrower)
            .is_some_and(|inventory| inventory.count(item) > 0);
        if !has_ammunition {
            note(world, "Nothing to throw");
            return None;
        }
    }

    let owner_id = id_of(world, thrower).unwrap_or_else(|| format!("{thrower}"));
    let missile_id = format!("{}-thrown-{}", owner_id, throwing.thrown);
    let mut blueprint = EntityBlueprint::new(missile_id)
        .with(Position(origin))
        .with(SceneNode::default());
    if let Some(faction) = world.get::<Faction>(thrower).copied() {
        blueprint = blueprint.with(faction);
    }
    let blueprint = blueprint.with(
        Missile::new(throwing.radius, direction * throwing.speed, throwing.range, throwing.effect.clone())
            .from_owner(thrower),
    );

    let missile = match blueprint.spawn(world) {
        Ok(missile) => missile,
        Err(error) => {
            logger::log_error(&format!("throw failed: {error}"));
            return None;
        }
    };
    // Боеприпас списывается только за реально выпущенный снаряд
    if let Some(item) = &throwing.ammunition {
        take_item(world, thrower, item, 1);
    }

    if let Some(mut throwing) = world.get_mut::<Throwing>(thrower) {
        throwing.cooldown.start();
        throwing.thrown += 1;
    }
    play_sound(world, "throw", origin);
    Some(missile)
}

/// Система: перезарядка бросков.
pub fn tick_throwing(world: &mut World) {
    let delta = crate::frame_delta(world);
    for thrower in entities_with::<Throwing>(world) {
        if let Some(mut throwing) = world.get_mut::<Throwing>(thrower) {
            throwing.cooldown.tick(delta);
        }
    }
}
