//! Боевые способности: ближняя атака, ауры, взрывы, снаряды, лучи,
//! касание, влияние, кража.
//!
//! Все способности разрешают эффект через combat resolver
//! (`carry_out_hostile_action` / `carry_out_friendly_action`); сами
//! компоненты отвечают только за то, *кого* и *когда* задеть.

use bevy::prelude::*;
use std::sync::Arc;

use crate::combat::{
    carry_out_friendly_action, carry_out_hostile_action, ActionOutcome, Damage, FriendlyAction, Healing,
    HostileAction, Medium,
};
use crate::components::{are_hostile, is_living, Health};
use crate::conditions::Condition;
use crate::entity::is_alive;

pub mod attack;
pub mod aura;
pub mod blast;
pub mod influence;
pub mod missile;
pub mod ray;
pub mod steal;
pub mod throwing;
pub mod touch;

#[cfg(test)]
mod abilities_tests;

pub use attack::{begin_attack, interrupt_attack, is_attacking, target_in_reach, tick_attacks, trigger_attack, Attack, AttackPhase};
pub use aura::{tick_auras, Aura};
pub use blast::{tick_blasts, Blast};
pub use influence::Influence;
pub use missile::{tick_missiles, Missile};
pub use ray::{cast_ray, tick_rays, Ray};
pub use steal::{attempt_steal, steal, Steal, StealOutcome};
pub use throwing::{throw, tick_throwing, Throwing};
pub use touch::{tick_touches, Touch};

/// Перезарядка, отсчитываемая в секундах симуляции.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cooldown {
    pub duration: f32,
    remaining: f32,
}

impl Cooldown {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            remaining: 0.0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.remaining <= 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn start(&mut self) {
        self.remaining = self.duration;
    }

    pub fn tick(&mut self, delta: f32) {
        self.remaining = (self.remaining - delta).max(0.0);
    }
}

/// Что способность делает с задетой entity.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Враждебное действие против чужой фракции
    Hostile {
        medium: Medium,
        damage: Option<Damage>,
        conditions: Vec<Arc<dyn Condition>>,
    },
    /// Лечение и полезные условия для своих
    Friendly {
        healing: Option<Healing>,
        conditions: Vec<Arc<dyn Condition>>,
    },
}

impl Effect {
    pub fn damage(medium: Medium, damage: Damage) -> Self {
        Effect::Hostile {
            medium,
            damage: Some(damage),
            conditions: Vec::new(),
        }
    }

    pub fn healing(healing: Healing) -> Self {
        Effect::Friendly {
            healing: Some(healing),
            conditions: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Arc<dyn Condition>) -> Self {
        match &mut self {
            Effect::Hostile { conditions, .. } | Effect::Friendly { conditions, .. } => conditions.push(condition),
        }
        self
    }

    pub fn is_hostile(&self) -> bool {
        matches!(self, Effect::Hostile { .. })
    }

    /// Задевает ли эффект `target` со стороны `origin` (по фракциям).
    pub fn affects(&self, world: &World, origin: Entity, target: Entity) -> bool {
        if target == origin && self.is_hostile() {
            return false;
        }
        if !is_living(world, target) || world.get::<Health>(target).is_none() {
            return false;
        }
        match self {
            Effect::Hostile { .. } => are_hostile(world, origin, target),
            Effect::Friendly { .. } => !are_hostile(world, origin, target),
        }
    }

    /// Разрешить эффект. Возвращает true, если что-то подействовало.
    pub fn apply(&self, world: &mut World, source: Option<Entity>, target: Entity) -> bool {
        let source = source.filter(|source| is_alive(world, *source));
        match self {
            Effect::Hostile {
                medium,
                damage,
                conditions,
            } => {
                let mut action = HostileAction::new(*medium, target).with_conditions(conditions.iter().cloned());
                if let Some(damage) = damage {
                    action = action.with_damage(damage.clone());
                }
                if let Some(source) = source {
                    action = action.by(source);
                }
                let outcome = carry_out_hostile_action(world, action);
                !outcome.negated && (outcome.damage_dealt > 0 || outcome.conditions_applied > 0)
            }
            Effect::Friendly { healing, conditions } => {
                let mut action = FriendlyAction::new(target);
                if let Some(healing) = healing {
                    action = action.with_healing(healing.clone());
                }
                for condition in conditions {
                    action = action.with_condition(condition.clone());
                }
                if let Some(source) = source {
                    action = action.by(source);
                }
                let outcome = carry_out_friendly_action(world, action);
                outcome.healed > 0 || outcome.conditions_applied > 0
            }
        }
    }
}

/// Ближний удар способности с уроном и условиями.
pub(crate) fn strike(
    world: &mut World,
    source: Entity,
    target: Entity,
    medium: Medium,
    damage: Option<&Damage>,
    conditions: &[Arc<dyn Condition>],
) -> ActionOutcome {
    let mut action = HostileAction::new(medium, target)
        .by(source)
        .with_conditions(conditions.iter().cloned());
    if let Some(damage) = damage {
        action = action.with_damage(damage.clone());
    }
    carry_out_hostile_action(world, action)
}

/// Entity с компонентом `C`, в детерминированном порядке.
pub(crate) fn entities_with<C: Component>(world: &mut World) -> Vec<Entity> {
    let mut query = world.query_filtered::<Entity, With<C>>();
    let mut entities: Vec<Entity> = query.iter(world).collect();
    entities.sort_by_key(|entity| entity.index());
    entities
}
