//! Базовые компоненты акторов: Health, Position, Body, SceneNode, Faction

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::composable;
use crate::contact::{ContactGroup, ContactNotifier};
use crate::entity::{id_of, Composable, ComponentKind};
use crate::error::AssemblyError;

/// Здоровье актора
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// current / max (0.0 для max == 0)
    pub fn ratio(&self) -> f32 {
        if self.max == 0 {
            return 0.0;
        }
        self.current as f32 / self.max as f32
    }

    /// Возвращает реально снятое количество
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let before = self.current;
        self.current = self.current.saturating_sub(amount);
        before - self.current
    }

    /// Возвращает реально восстановленное количество
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.current;
        self.current = self.current.saturating_add(amount).min(self.max);
        self.current - before
    }
}

composable!(Health => Health);

/// Позиция в мире (2D, единицы scene graph'а).
///
/// Единственное, что симуляция читает у presentation слоя.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct Position(pub Vec2);

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }
}

composable!(Position => Position);

/// Physics body entity: круг + contact groups, к которым он принадлежит.
///
/// Имя body = stable id entity; по нему ContactNotifier находит entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Body {
    pub radius: f32,
    pub groups: u32,
}

impl Body {
    pub fn new(radius: f32, groups: u32) -> Self {
        Self { radius, groups }
    }

    pub fn player(radius: f32) -> Self {
        Self::new(radius, ContactGroup::PLAYER)
    }

    pub fn monster(radius: f32) -> Self {
        Self::new(radius, ContactGroup::MONSTER)
    }
}

impl Composable for Body {
    const KIND: ComponentKind = ComponentKind::Body;
    const REQUIRES: &'static [ComponentKind] = &[ComponentKind::Position];

    fn did_add_to_entity(world: &mut World, entity: Entity) -> Result<(), AssemblyError> {
        if let Some(name) = id_of(world, entity) {
            world
                .get_resource_or_insert_with(ContactNotifier::default)
                .register_body(&name, entity);
        }
        Ok(())
    }

    fn will_remove_from_entity(world: &mut World, entity: Entity) {
        if let Some(name) = id_of(world, entity) {
            if let Some(mut notifier) = world.get_resource_mut::<ContactNotifier>() {
                notifier.deregister_body(&name);
            }
        }
    }
}

/// Presentation node entity. Detection nodes компонентов добавляются
/// сюда как children (addChild / removeFromParent).
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct SceneNode {
    pub children: Vec<String>,
}

impl SceneNode {
    pub fn has_child(&self, name: &str) -> bool {
        self.children.iter().any(|child| child == name)
    }
}

composable!(SceneNode => SceneNode);

/// Фракция. Entity разных фракций враждебны друг другу.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Reflect)]
#[reflect(Component)]
pub struct Faction {
    pub id: u64,
}

impl Faction {
    pub const PLAYER: Faction = Faction { id: 1 };
    pub const MONSTERS: Faction = Faction { id: 2 };

    pub fn is_hostile_to(&self, other: &Faction) -> bool {
        self.id != other.id
    }
}

composable!(Faction => Faction);

/// Entity (снаряд, взрыв, труп) будет despawned через `remaining` секунд.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Expiry {
    pub remaining: f32,
}

impl Expiry {
    pub fn after(seconds: f32) -> Self {
        Self { remaining: seconds }
    }
}

composable!(Expiry => Expiry);

/// Две entity враждебны (обе с Faction, фракции разные).
pub fn are_hostile(world: &World, a: Entity, b: Entity) -> bool {
    match (world.get::<Faction>(a), world.get::<Faction>(b)) {
        (Some(fa), Some(fb)) => fa.is_hostile_to(fb),
        _ => false,
    }
}

/// Entity жива: существует и (если есть Health) current > 0.
pub fn is_living(world: &World, entity: Entity) -> bool {
    if !crate::entity::is_alive(world, entity) {
        return false;
    }
    world.get::<Health>(entity).map_or(true, |h| h.is_alive())
}

pub fn position_of(world: &World, entity: Entity) -> Option<Vec2> {
    world.get::<Position>(entity).map(|p| p.0)
}

/// Система: отсчёт Expiry и despawn истёкших entity.
pub fn despawn_expired(world: &mut World) {
    let delta = crate::frame_delta(world);

    let mut query = world.query::<(Entity, &mut Expiry)>();
    let mut expired = Vec::new();
    for (entity, mut expiry) in query.iter_mut(world) {
        expiry.remaining -= delta;
        if expiry.remaining <= 0.0 {
            expired.push(entity);
        }
    }
    expired.sort_by_key(|entity| entity.index());

    for entity in expired {
        crate::entity::despawn_entity(world, entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage() {
        let mut health = Health::new(100);
        assert_eq!(health.take_damage(30), 30);
        assert_eq!(health.current, 70);
        assert!(health.is_alive());

        assert_eq!(health.take_damage(100), 70); // Saturating sub
        assert_eq!(health.current, 0);
        assert!(!health.is_alive());
    }

    #[test]
    fn test_health_heal() {
        let mut health = Health::new(100);
        health.take_damage(50);

        assert_eq!(health.heal(30), 30);
        assert_eq!(health.current, 80);

        assert_eq!(health.heal(100), 20); // Clamped to max
        assert!(health.is_full());
    }

    #[test]
    fn test_health_ratio() {
        let mut health = Health::new(40);
        health.take_damage(10);
        assert_eq!(health.ratio(), 0.75);
        assert_eq!(Health { current: 0, max: 0 }.ratio(), 0.0);
    }

    #[test]
    fn test_faction_hostility() {
        assert!(Faction::PLAYER.is_hostile_to(&Faction::MONSTERS));
        assert!(!Faction::MONSTERS.is_hostile_to(&Faction::MONSTERS));
    }
}
