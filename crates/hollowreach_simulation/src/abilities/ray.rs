//! Ray: мгновенный луч, задевает ближайшее тело на отрезке.

use bevy::prelude::*;

use super::{entities_with, Cooldown, Effect};
use crate::components::{position_of, Body, Position};
use crate::entity::{id_of, EntityId};
use crate::presentation::{scene, SceneCommand};
use crate::{composable, logger};

#[derive(Component, Debug, Clone)]
pub struct Ray {
    pub length: f32,
    pub effect: Effect,
    cooldown: Cooldown,
}

impl Ray {
    pub fn new(length: f32, effect: Effect) -> Self {
        Self {
            length,
            effect,
            cooldown: Cooldown::new(0.0),
        }
    }

    pub fn with_cooldown(mut self, cooldown: f32) -> Self {
        self.cooldown = Cooldown::new(cooldown);
        self
    }

    pub fn is_ready(&self) -> bool {
        self.cooldown.is_ready()
    }
}

composable!(Ray => Ray, requires [Position]);

/// Параметр `t` (расстояние вдоль луча) первого пересечения отрезка с кругом.
fn intersect(origin: Vec2, direction: Vec2, length: f32, center: Vec2, radius: f32) -> Option<f32> {
    let to_center = center - origin;
    let along = to_center.dot(direction);
    let closest_sq = to_center.length_squared() - along * along;
    let radius_sq = radius * radius;
    if closest_sq > radius_sq {
        return None;
    }
    let half_chord = (radius_sq - closest_sq).sqrt();
    let (entry, exit) = (along - half_chord, along + half_chord);
    if exit < 0.0 || entry > length {
        return None;
    }
    // Луч начинается внутри круга
    Some(entry.max(0.0))
}

/// Выстрелить лучом в направлении `direction`. Возвращает задетую entity.
pub fn cast_ray(world: &mut World, caster: Entity, direction: Vec2) -> Option<Entity> {
    let direction = direction.normalize_or_zero();
    if direction == Vec2::ZERO {
        return None;
    }
    let origin = position_of(world, caster)?;
    let (length, effect) = {
        let ray = world.get::<Ray>(caster)?;
        if !ray.is_ready() {
            return None;
        }
        (ray.length, ray.effect.clone())
    };

    let mut bodies = world.query::<(Entity, &Position, &Body)>();
    let mut hits: Vec<(Entity, f32)> = bodies
        .iter(world)
        .filter(|(entity, _, _)| *entity != caster)
        .filter_map(|(entity, position, body)| {
            intersect(origin, direction, length, position.0, body.radius).map(|t| (entity, t))
        })
        .collect();
    hits.retain(|(entity, _)| effect.affects(world, caster, *entity));
    hits.sort_by(|(a, ta), (b, tb)| ta.total_cmp(tb).then(a.index().cmp(&b.index())));

    if let Some(mut ray) = world.get_mut::<Ray>(caster) {
        ray.cooldown.start();
    }
    if let Some(node) = world.get::<EntityId>(caster).map(|id| id.0.clone()) {
        scene(
            world,
            SceneCommand::PlayAnimation {
                node,
                animation: "ray".to_string(),
            },
        );
    }

    let (target, _) = hits.first().copied()?;
    logger::log(&format!(
        "{} ray hits {}",
        id_of(world, caster).unwrap_or_default(),
        id_of(world, target).unwrap_or_default()
    ));
    effect.apply(world, Some(caster), target);
    Some(target)
}

/// Система: перезарядка лучей.
pub fn tick_rays(world: &mut World) {
    let delta = crate::frame_delta(world);
    for caster in entities_with::<Ray>(world) {
        if let Some(mut ray) = world.get_mut::<Ray>(caster) {
            ray.cooldown.tick(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersect_hits_circle_on_segment() {
        let t = intersect(Vec2::ZERO, Vec2::X, 10.0, Vec2::new(5.0, 0.0), 1.0).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_intersect_misses_beyond_length_and_behind() {
        assert!(intersect(Vec2::ZERO, Vec2::X, 3.0, Vec2::new(5.0, 0.0), 1.0).is_none());
        assert!(intersect(Vec2::ZERO, Vec2::X, 10.0, Vec2::new(-5.0, 0.0), 1.0).is_none());
        assert!(intersect(Vec2::ZERO, Vec2::X, 10.0, Vec2::new(5.0, 2.0), 1.0).is_none());
    }
}
