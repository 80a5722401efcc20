//! Реакции защищающейся стороны: контратака, оглушающая защита, возмездие.
//!
//! Каждая реакция это новое `unavoidable` действие: его нельзя отразить,
//! поэтому контратака на контратаку не возникает.

use bevy::prelude::*;
use rand::Rng;
use std::sync::Arc;

use super::resolver::{resolve_hostile_action, HostileAction};
use super::{Damage, Medium};
use crate::composable;
use crate::conditions::QuellCondition;

/// Контратака после успешной защиты от ближнего удара.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Counter {
    pub damage: Damage,
    pub chance: f32,
}

impl Counter {
    pub fn new(damage: Damage, chance: f32) -> Self {
        Self { damage, chance }
    }
}

composable!(Counter => Counter, requires [Defense]);

/// Оглушает атакующего после успешной защиты от физического удара.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct StunningDefense {
    pub duration: f32,
    pub chance: f32,
}

impl StunningDefense {
    pub fn new(duration: f32, chance: f32) -> Self {
        Self { duration, chance }
    }
}

composable!(StunningDefense => StunningDefense, requires [Defense]);

/// Урон атакующему за каждый пропущенный ближний удар.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Retribution {
    pub damage: Damage,
}

impl Retribution {
    pub fn new(damage: Damage) -> Self {
        Self { damage }
    }
}

composable!(Retribution => Retribution);

/// Цель отразила действие.
pub(crate) fn after_negation<R: Rng + ?Sized>(world: &mut World, rng: &mut R, action: &HostileAction) {
    let Some(attacker) = action.source else {
        return;
    };
    let defender = action.target;

    if action.medium.is_counterable() {
        if let Some(counter) = world.get::<Counter>(defender).cloned() {
            if rng.gen::<f32>() < counter.chance {
                let riposte = HostileAction::new(Medium::Melee, attacker)
                    .by(defender)
                    .with_damage(counter.damage)
                    .unavoidable();
                resolve_hostile_action(world, rng, &riposte);
            }
        }
    }

    if action.medium.is_physical() {
        if let Some(stunning) = world.get::<StunningDefense>(defender).cloned() {
            if rng.gen::<f32>() < stunning.chance {
                let stun = HostileAction::new(Medium::None, attacker)
                    .by(defender)
                    .with_condition(Arc::new(QuellCondition::new("stunned", stunning.duration)))
                    .unavoidable();
                resolve_hostile_action(world, rng, &stun);
            }
        }
    }
}

/// Цель получила урон.
pub(crate) fn after_damage<R: Rng + ?Sized>(world: &mut World, rng: &mut R, action: &HostileAction) {
    if action.medium != Medium::Melee {
        return;
    }
    let Some(attacker) = action.source else {
        return;
    };
    if let Some(retribution) = world.get::<Retribution>(action.target).cloned() {
        // Medium::None: возмездие само не вызывает возмездие
        let strike_back = HostileAction::new(Medium::None, attacker)
            .by(action.target)
            .with_damage(retribution.damage)
            .unavoidable();
        resolve_hostile_action(world, rng, &strike_back);
    }
}
