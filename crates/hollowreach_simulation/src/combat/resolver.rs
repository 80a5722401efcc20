//! Resolver враждебных и дружественных действий.
//!
//! Порядок враждебного действия:
//! 1. Defense (melee/ranged) или Resistance (spell): один бросок, если
//!    действие не `unavoidable`. Успех отменяет всё действие.
//! 2. Урон: сырое значение → крит → first strike / finishing strike →
//!    damage adjustment (caused × taken) → Barrier → Mitigation →
//!    иммунитет к типу урона → `cause_damage`.
//! 3. Условия: каждое применяется независимо.
//!
//! Реакции (counter, stunning defense, retribution) запускает сторона,
//! которую атаковали, как отдельное `unavoidable` действие.

use bevy::prelude::*;
use rand::Rng;
use std::sync::Arc;

use super::reactions;
use super::{
    cause_damage, restore, Barrier, CriticalHit, Damage, DamageAdjustment, Defense, FinishingStrike, FirstStrike,
    Healing, Immunity, Medium, Mitigation, Resistance,
};
use crate::components::{is_living, Health};
use crate::conditions::{apply_condition, Condition};
use crate::entity::{id_of, remove_component};
use crate::logger;
use crate::presentation::{combat_log, note};
use crate::progression::Progression;
use crate::DeterministicRng;

#[derive(Debug, Clone)]
pub struct HostileAction {
    pub medium: Medium,
    pub target: Entity,
    pub source: Option<Entity>,
    pub damage: Option<Damage>,
    pub conditions: Vec<Arc<dyn Condition>>,
    pub unavoidable: bool,
}

impl HostileAction {
    pub fn new(medium: Medium, target: Entity) -> Self {
        Self {
            medium,
            target,
            source: None,
            damage: None,
            conditions: Vec::new(),
            unavoidable: false,
        }
    }

    pub fn by(mut self, source: Entity) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_damage(mut self, damage: Damage) -> Self {
        self.damage = Some(damage);
        self
    }

    pub fn with_condition(mut self, condition: Arc<dyn Condition>) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_conditions(mut self, conditions: impl IntoIterator<Item = Arc<dyn Condition>>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    pub fn unavoidable(mut self) -> Self {
        self.unavoidable = true;
        self
    }
}

/// Что произошло с враждебным действием.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionOutcome {
    /// Отражено Defense / Resistance
    pub negated: bool,
    pub critical: bool,
    /// Урон после крита, бонусов и поправок (до барьера)
    pub raw_damage: f32,
    pub absorbed: f32,
    pub mitigated: f32,
    pub immune: bool,
    pub damage_dealt: u32,
    pub conditions_applied: usize,
    pub killed: bool,
}

/// Разрешить враждебное действие с внешним источником случайности.
pub fn resolve_hostile_action<R: Rng + ?Sized>(
    world: &mut World,
    rng: &mut R,
    action: &HostileAction,
) -> ActionOutcome {
    let mut outcome = ActionOutcome::default();
    if !is_living(world, action.target) {
        return outcome;
    }

    if !action.unavoidable && is_negated(world, rng, action) {
        outcome.negated = true;
        let verb = if action.medium.is_physical() { "defended" } else { "resisted" };
        combat_log(
            world,
            format!("{} {}", id_of(world, action.target).unwrap_or_default(), verb),
        );
        reactions::after_negation(world, rng, action);
        return outcome;
    }

    if let Some(damage) = &action.damage {
        resolve_damage(world, rng, action, damage, &mut outcome);
    }

    // Смерть от урона снимает условия; на мёртвых они не применяются
    for condition in &action.conditions {
        if apply_condition(world, action.target, condition.clone()) {
            outcome.conditions_applied += 1;
        }
    }

    outcome
}

fn is_negated<R: Rng + ?Sized>(world: &World, rng: &mut R, action: &HostileAction) -> bool {
    let roll = rng.gen::<f32>();
    match action.medium {
        Medium::Melee | Medium::Ranged => world
            .get::<Defense>(action.target)
            .is_some_and(|defense| defense.defend(roll)),
        Medium::Spell => world
            .get::<Resistance>(action.target)
            .is_some_and(|resistance| resistance.resist(roll)),
        Medium::None => false,
    }
}

fn resolve_damage<R: Rng + ?Sized>(
    world: &mut World,
    rng: &mut R,
    action: &HostileAction,
    damage: &Damage,
    outcome: &mut ActionOutcome,
) {
    let target = action.target;
    let damage_type = damage.damage_type;

    let source_level = action
        .source
        .and_then(|source| world.get::<Progression>(source))
        .map_or(1, |progression| progression.level);
    let mut amount = damage.resolve(source_level, rng.gen::<f32>());

    if let Some(source) = action.source {
        if let Some(critical) = world.get::<CriticalHit>(source) {
            let (is_critical, critical_amount) = critical.apply_critical_to(amount, action.medium, rng.gen::<f32>());
            outcome.critical = is_critical;
            amount = critical_amount;
        }
        amount *= strike_bonus(world, source, target);

        let caused = world
            .get::<DamageAdjustment>(source)
            .map_or(0.0, |adjustment| adjustment.damage_caused(damage_type));
        amount *= 1.0 + caused;
    }
    let taken = world
        .get::<DamageAdjustment>(target)
        .map_or(0.0, |adjustment| adjustment.damage_taken(damage_type));
    amount *= 1.0 + taken;
    outcome.raw_damage = amount;

    // Барьер расходуется раньше плоской mitigation
    if let Some(mut barrier) = world.get_mut::<Barrier>(target) {
        let absorbed = barrier.absorb(amount);
        amount -= absorbed;
        outcome.absorbed = absorbed;
    }
    if let Some(mitigation) = world.get::<Mitigation>(target) {
        let after = mitigation.mitigate(amount, damage_type);
        outcome.mitigated = amount - after;
        amount = after;
    }

    if world
        .get::<Immunity>(target)
        .is_some_and(|immunity| immunity.is_immune_to_damage(damage_type))
    {
        outcome.immune = true;
        note(world, "Immune");
        logger::log(&format!("{:?} immune to {:?}", target, damage_type));
        return;
    }

    if outcome.critical {
        combat_log(world, "Critical hit!");
    }
    outcome.damage_dealt = cause_damage(world, target, amount.round() as u32, action.source);
    outcome.killed = world.get::<Health>(target).is_some_and(|health| !health.is_alive());

    if outcome.damage_dealt > 0 {
        reactions::after_damage(world, rng, action);
    }
}

/// Множитель first strike / finishing strike источника по текущей цели.
fn strike_bonus(world: &mut World, source: Entity, target: Entity) -> f32 {
    let ratio = world.get::<Health>(target).map_or(1.0, Health::ratio);
    let mut multiplier = 1.0;

    if let Some(first) = world.get::<FirstStrike>(source).cloned() {
        if first.applies_to(ratio) {
            multiplier += first.bonus;
            if first.single_use {
                remove_component::<FirstStrike>(world, source);
            }
        }
    }
    if let Some(finishing) = world.get::<FinishingStrike>(source).cloned() {
        if finishing.applies_to(ratio) {
            multiplier += finishing.bonus;
            if finishing.single_use {
                remove_component::<FinishingStrike>(world, source);
            }
        }
    }
    multiplier
}

/// Разрешить враждебное действие с глобальным `DeterministicRng`.
pub fn carry_out_hostile_action(world: &mut World, action: HostileAction) -> ActionOutcome {
    let mut rng = world.remove_resource::<DeterministicRng>().unwrap_or_else(|| {
        logger::log_warning("DeterministicRng missing, seeding with 0");
        DeterministicRng::new(0)
    });
    let outcome = resolve_hostile_action(world, &mut rng.rng, &action);
    world.insert_resource(rng);
    outcome
}

/// Лечение и полезные условия (без бросков защиты).
#[derive(Debug, Clone)]
pub struct FriendlyAction {
    pub target: Entity,
    pub source: Option<Entity>,
    pub healing: Option<Healing>,
    pub conditions: Vec<Arc<dyn Condition>>,
}

impl FriendlyAction {
    pub fn new(target: Entity) -> Self {
        Self {
            target,
            source: None,
            healing: None,
            conditions: Vec::new(),
        }
    }

    pub fn by(mut self, source: Entity) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_healing(mut self, healing: Healing) -> Self {
        self.healing = Some(healing);
        self
    }

    pub fn with_condition(mut self, condition: Arc<dyn Condition>) -> Self {
        self.conditions.push(condition);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FriendlyOutcome {
    pub healed: u32,
    pub conditions_applied: usize,
}

pub fn carry_out_friendly_action(world: &mut World, action: FriendlyAction) -> FriendlyOutcome {
    let mut outcome = FriendlyOutcome::default();
    if !is_living(world, action.target) {
        return outcome;
    }

    if let Some(healing) = &action.healing {
        let level = action
            .source
            .and_then(|source| world.get::<Progression>(source))
            .map_or(1, |progression| progression.level);
        outcome.healed = restore(world, action.target, healing.resolve(level).round() as u32);
    }

    for condition in &action.conditions {
        if apply_condition(world, action.target, condition.clone()) {
            outcome.conditions_applied += 1;
        }
    }
    outcome
}
