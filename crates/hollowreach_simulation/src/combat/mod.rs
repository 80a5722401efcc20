//! Combat: спецификации урона, модификаторы, барьеры, иммунитеты,
//! реакции защищающейся стороны и resolver действий.

use bevy::prelude::*;

pub mod barrier;
pub mod damage;
pub mod health;
pub mod immunity;
pub mod modifiers;
pub mod reactions;
pub mod resolver;


pub use barrier::{tick_barriers, Barrier};
pub use damage::{Damage, DamageType, Healing, Medium};
pub use health::{cause_damage, restore};
pub use immunity::{Immunity, ImmunityKind};
pub use modifiers::{
    Bounded, CriticalHit, DamageAdjustment, Defense, FinishingStrike, FirstStrike, Mitigation, Resistance,
};
pub use reactions::{Counter, Retribution, StunningDefense};
pub use resolver::{
    carry_out_friendly_action, carry_out_hostile_action, resolve_hostile_action, ActionOutcome, FriendlyAction,
    FriendlyOutcome, HostileAction,
};

/// Event: здоровье цели уменьшилось.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageDealt {
    pub target: Entity,
    pub source: Option<Entity>,
    pub amount: u32,
}

/// Event: entity умерла (Health → 0).
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}
