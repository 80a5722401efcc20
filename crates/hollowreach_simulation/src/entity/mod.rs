//! Entity model: stable ids, закрытый набор component kinds, сборка и
//! уничтожение entity.
//!
//! Entity = bevy `Entity` (index + generation). Устаревший handle после
//! despawn просто не находится в World, поэтому ссылки на чужие entity
//! (target, lift subject, observers) хранятся как `Entity` без ручной
//! отписки.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::AssemblyError;

pub mod blueprint;
pub mod observe;

pub use blueprint::{add_component, despawn_entity, remove_component, Composition, EntityBlueprint};
pub use observe::{broadcast, broadcast_of, ChangeBus, ComponentChanged};

/// Stable id entity (переживает save/load, используется в именах nodes).
#[derive(Component, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
#[reflect(Component)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lookup stable id → Entity.
#[derive(Resource, Debug, Default)]
pub struct EntityIndex {
    by_id: HashMap<String, Entity>,
}

impl EntityIndex {
    pub fn get(&self, id: &str) -> Option<Entity> {
        self.by_id.get(id).copied()
    }

    pub(crate) fn insert(&mut self, id: &str, entity: Entity) {
        self.by_id.insert(id.to_string(), entity);
    }

    pub(crate) fn remove(&mut self, id: &str, entity: Entity) {
        if self.by_id.get(id) == Some(&entity) {
            self.by_id.remove(id);
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Entity по stable id (только живые).
pub fn lookup(world: &World, id: &str) -> Option<Entity> {
    let entity = world.get_resource::<EntityIndex>()?.get(id)?;
    is_alive(world, entity).then_some(entity)
}

/// Handle ещё указывает на существующую entity.
pub fn is_alive(world: &World, entity: Entity) -> bool {
    world.entities().contains(entity)
}

pub fn id_of(world: &World, entity: Entity) -> Option<String> {
    world.get::<EntityId>(entity).map(|id| id.0.clone())
}

/// Закрытый набор типов компонентов.
///
/// Используется для composition-проверок, имён detection nodes и
/// адресации broadcast'ов.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    // Actor
    Health,
    Position,
    Body,
    SceneNode,
    Faction,
    Expiry,
    StateMachine,
    Conditions,
    // Combat support
    Immunity,
    Defense,
    Resistance,
    CriticalHit,
    DamageAdjustment,
    Mitigation,
    Barrier,
    FirstStrike,
    FinishingStrike,
    Counter,
    Retribution,
    StunningDefense,
    // Abilities
    Attack,
    Aura,
    Blast,
    Missile,
    Ray,
    Throwing,
    Touch,
    Influence,
    Steal,
    // Spatial
    Perception,
    Targeting,
    Interactor,
    Interactable,
    PickUp,
    Pickable,
    Stealth,
    // Paired transitions
    Lift,
    Liftable,
    DisarmDevice,
    Disarmable,
    // Progression
    Progression,
    Skills,
    Inventory,
    Equipment,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Health => "health",
            ComponentKind::Position => "position",
            ComponentKind::Body => "body",
            ComponentKind::SceneNode => "node",
            ComponentKind::Faction => "faction",
            ComponentKind::Expiry => "expiry",
            ComponentKind::StateMachine => "state",
            ComponentKind::Conditions => "conditions",
            ComponentKind::Immunity => "immunity",
            ComponentKind::Defense => "defense",
            ComponentKind::Resistance => "resistance",
            ComponentKind::CriticalHit => "critical",
            ComponentKind::DamageAdjustment => "adjustment",
            ComponentKind::Mitigation => "mitigation",
            ComponentKind::Barrier => "barrier",
            ComponentKind::FirstStrike => "first_strike",
            ComponentKind::FinishingStrike => "finishing_strike",
            ComponentKind::Counter => "counter",
            ComponentKind::Retribution => "retribution",
            ComponentKind::StunningDefense => "stunning_defense",
            ComponentKind::Attack => "attack",
            ComponentKind::Aura => "aura",
            ComponentKind::Blast => "blast",
            ComponentKind::Missile => "missile",
            ComponentKind::Ray => "ray",
            ComponentKind::Throwing => "throwing",
            ComponentKind::Touch => "touch",
            ComponentKind::Influence => "influence",
            ComponentKind::Steal => "steal",
            ComponentKind::Perception => "perception",
            ComponentKind::Targeting => "targeting",
            ComponentKind::Interactor => "interaction",
            ComponentKind::Interactable => "interactable",
            ComponentKind::PickUp => "pickup",
            ComponentKind::Pickable => "pickable",
            ComponentKind::Stealth => "stealth",
            ComponentKind::Lift => "lift",
            ComponentKind::Liftable => "liftable",
            ComponentKind::DisarmDevice => "disarm",
            ComponentKind::Disarmable => "disarmable",
            ComponentKind::Progression => "progression",
            ComponentKind::Skills => "skills",
            ComponentKind::Inventory => "inventory",
            ComponentKind::Equipment => "equipment",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Компонент, который можно собрать в entity через `EntityBlueprint`.
///
/// `REQUIRES`: sibling компоненты, без которых этот не работает.
/// Проверяется один раз при сборке, а не при каждом обращении.
pub trait Composable: Component + Sized {
    const KIND: ComponentKind;
    const REQUIRES: &'static [ComponentKind] = &[];

    /// Вызывается после того, как все компоненты blueprint вставлены.
    fn did_add_to_entity(_world: &mut World, _entity: Entity) -> Result<(), AssemblyError> {
        Ok(())
    }

    /// Вызывается до удаления компонента (или despawn entity).
    fn will_remove_from_entity(_world: &mut World, _entity: Entity) {}
}

/// `impl Composable` для компонентов без lifecycle hooks.
#[macro_export]
macro_rules! composable {
    ($ty:ty => $kind:ident) => {
        impl $crate::entity::Composable for $ty {
            const KIND: $crate::entity::ComponentKind = $crate::entity::ComponentKind::$kind;
        }
    };
    ($ty:ty => $kind:ident, requires [$($req:ident),* $(,)?]) => {
        impl $crate::entity::Composable for $ty {
            const KIND: $crate::entity::ComponentKind = $crate::entity::ComponentKind::$kind;
            const REQUIRES: &'static [$crate::entity::ComponentKind] =
                &[$($crate::entity::ComponentKind::$req),*];
        }
    };
}

/// `impl Composable` для detection компонентов: attach/detach к
/// ContactNotifier в lifecycle hooks.
#[macro_export]
macro_rules! contactable_composable {
    ($ty:ty => $kind:ident, requires [$($req:ident),* $(,)?]) => {
        impl $crate::entity::Composable for $ty {
            const KIND: $crate::entity::ComponentKind = $crate::entity::ComponentKind::$kind;
            const REQUIRES: &'static [$crate::entity::ComponentKind] =
                &[$($crate::entity::ComponentKind::$req),*];

            fn did_add_to_entity(
                world: &mut bevy::prelude::World,
                entity: bevy::prelude::Entity,
            ) -> Result<(), $crate::error::AssemblyError> {
                $crate::contact::attach::<Self>(world, entity)?;
                Ok(())
            }

            fn will_remove_from_entity(world: &mut bevy::prelude::World, entity: bevy::prelude::Entity) {
                $crate::contact::detach::<Self>(world, entity);
            }
        }
    };
}
