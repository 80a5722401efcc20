//! Targeting: ближайший живой враждебный актор из Perception.

use bevy::prelude::*;

use super::{is_hidden, perceived};
use crate::components::{are_hostile, is_living, position_of};
use crate::composable;
use crate::entity::{broadcast, ComponentKind};

#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Targeting {
    target: Option<Entity>,
    /// Дальше этого цель сбрасывается
    pub range: f32,
}

impl Targeting {
    pub fn new(range: f32) -> Self {
        Self { target: None, range }
    }

    /// Сохранённый handle; может быть устаревшим до следующего тика
    pub fn raw_target(&self) -> Option<Entity> {
        self.target
    }
}

composable!(Targeting => Targeting, requires [Perception]);

fn is_valid_target(world: &World, seeker: Entity, target: Entity, range: f32) -> bool {
    if target == seeker || !is_living(world, target) || !are_hostile(world, seeker, target) {
        return false;
    }
    if is_hidden(world, target) {
        return false;
    }
    match (position_of(world, seeker), position_of(world, target)) {
        (Some(from), Some(to)) => from.distance(to) <= range,
        _ => false,
    }
}

/// Текущая цель, если она всё ещё валидна.
pub fn target_of(world: &World, seeker: Entity) -> Option<Entity> {
    let targeting = world.get::<Targeting>(seeker)?;
    let target = targeting.target?;
    is_valid_target(world, seeker, target, targeting.range).then_some(target)
}

/// Назначить цель вручную (игрок). true: цель изменилась.
pub fn set_target(world: &mut World, seeker: Entity, target: Option<Entity>) -> bool {
    let changed = match world.get_mut::<Targeting>(seeker) {
        Some(mut targeting) if targeting.target != target => {
            targeting.target = target;
            true
        }
        _ => false,
    };
    if changed {
        broadcast(world, seeker, ComponentKind::Targeting);
    }
    changed
}

fn select_target(world: &World, seeker: Entity, range: f32) -> Option<Entity> {
    let origin = position_of(world, seeker)?;
    perceived(world, seeker)
        .into_iter()
        .filter(|candidate| is_valid_target(world, seeker, *candidate, range))
        .filter_map(|candidate| position_of(world, candidate).map(|at| (candidate, origin.distance(at))))
        .min_by(|(a, da), (b, db)| da.total_cmp(db).then(a.index().cmp(&b.index())))
        .map(|(candidate, _)| candidate)
}

/// Система: сбросить устаревшие цели и выбрать новые.
pub fn update_targeting(world: &mut World) {
    let mut query = world.query::<(Entity, &Targeting)>();
    let mut seekers: Vec<(Entity, Targeting)> = query.iter(world).map(|(e, t)| (e, *t)).collect();
    seekers.sort_by_key(|(entity, _)| entity.index());

    for (seeker, targeting) in seekers {
        let keep = targeting
            .target
            .filter(|target| is_valid_target(world, seeker, *target, targeting.range));
        let next = keep.or_else(|| select_target(world, seeker, targeting.range));
        set_target(world, seeker, next);
    }
}
