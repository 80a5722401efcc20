//! Конкретные условия.

use bevy::prelude::*;

use super::{Condition, ConditionKind, ConditionTick};
use crate::combat::{cause_damage, restore, DamageAdjustment, Mitigation};
use crate::state::{enter_named, is_in, StateName};

/// Урон каждую целую секунду, умноженный на число применений.
#[derive(Debug, Clone)]
pub struct PoisonCondition {
    identifier: String,
    duration: f32,
    damage_per_second: u32,
    source: Option<Entity>,
}

impl PoisonCondition {
    pub fn new(identifier: impl Into<String>, duration: f32, damage_per_second: u32) -> Self {
        Self {
            identifier: identifier.into(),
            duration,
            damage_per_second,
            source: None,
        }
    }

    /// Убийство ядом засчитывается источнику
    pub fn from_source(mut self, source: Entity) -> Self {
        self.source = Some(source);
        self
    }
}

impl Condition for PoisonCondition {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn kind(&self) -> ConditionKind {
        ConditionKind::Poison
    }

    fn duration(&self) -> Option<f32> {
        Some(self.duration)
    }

    fn is_resettable(&self) -> bool {
        true
    }

    fn apply_effects(&self, _world: &mut World, _target: Entity, _application: u32) -> bool {
        true
    }

    fn update(&self, world: &mut World, target: Entity, tick: ConditionTick) {
        let seconds = tick.whole_seconds_crossed();
        if seconds > 0 {
            let amount = seconds * self.damage_per_second * tick.applications;
            cause_damage(world, target, amount, self.source);
        }
    }
}

/// Лечение каждую целую секунду.
#[derive(Debug, Clone)]
pub struct RegenerationCondition {
    identifier: String,
    duration: Option<f32>,
    heal_per_second: u32,
}

impl RegenerationCondition {
    pub fn new(identifier: impl Into<String>, duration: f32, heal_per_second: u32) -> Self {
        Self {
            identifier: identifier.into(),
            duration: Some(duration),
            heal_per_second,
        }
    }

    /// Без срока (снимается только явно)
    pub fn permanent(identifier: impl Into<String>, heal_per_second: u32) -> Self {
        Self {
            identifier: identifier.into(),
            duration: None,
            heal_per_second,
        }
    }
}

impl Condition for RegenerationCondition {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn kind(&self) -> ConditionKind {
        ConditionKind::Regeneration
    }

    fn duration(&self) -> Option<f32> {
        self.duration
    }

    fn is_resettable(&self) -> bool {
        true
    }

    fn apply_effects(&self, _world: &mut World, _target: Entity, application: u32) -> bool {
        // Не стакается: повторное применение только продлевает
        application == 1
    }

    fn update(&self, world: &mut World, target: Entity, tick: ConditionTick) {
        let seconds = tick.whole_seconds_crossed();
        if seconds > 0 {
            restore(world, target, seconds * self.heal_per_second);
        }
    }
}

/// Снижает наносимый урон (нужен DamageAdjustment).
#[derive(Debug, Clone)]
pub struct WeaknessCondition {
    identifier: String,
    duration: f32,
    amount: f32,
}

impl WeaknessCondition {
    pub fn new(identifier: impl Into<String>, duration: f32, amount: f32) -> Self {
        Self {
            identifier: identifier.into(),
            duration,
            amount,
        }
    }
}

impl Condition for WeaknessCondition {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn kind(&self) -> ConditionKind {
        ConditionKind::Weakness
    }

    fn duration(&self) -> Option<f32> {
        Some(self.duration)
    }

    fn apply_effects(&self, world: &mut World, target: Entity, _application: u32) -> bool {
        let Some(mut adjustment) = world.get_mut::<DamageAdjustment>(target) else {
            return false;
        };
        adjustment.modify_damage_caused(-self.amount);
        true
    }

    fn remove_effects(&self, world: &mut World, target: Entity, applications: u32) {
        if let Some(mut adjustment) = world.get_mut::<DamageAdjustment>(target) {
            adjustment.modify_damage_caused(self.amount * applications as f32);
        }
    }
}

/// Увеличивает получаемый урон (нужен DamageAdjustment).
#[derive(Debug, Clone)]
pub struct VulnerabilityCondition {
    identifier: String,
    duration: f32,
    amount: f32,
}

impl VulnerabilityCondition {
    pub fn new(identifier: impl Into<String>, duration: f32, amount: f32) -> Self {
        Self {
            identifier: identifier.into(),
            duration,
            amount,
        }
    }
}

impl Condition for VulnerabilityCondition {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn kind(&self) -> ConditionKind {
        ConditionKind::Vulnerability
    }

    fn duration(&self) -> Option<f32> {
        Some(self.duration)
    }

    fn apply_effects(&self, world: &mut World, target: Entity, _application: u32) -> bool {
        let Some(mut adjustment) = world.get_mut::<DamageAdjustment>(target) else {
            return false;
        };
        adjustment.modify_damage_taken(self.amount);
        true
    }

    fn remove_effects(&self, world: &mut World, target: Entity, applications: u32) {
        if let Some(mut adjustment) = world.get_mut::<DamageAdjustment>(target) {
            adjustment.modify_damage_taken(-self.amount * applications as f32);
        }
    }
}

/// Плоская защита поверх Mitigation.
#[derive(Debug, Clone)]
pub struct ProtectionCondition {
    identifier: String,
    duration: f32,
    amount: f32,
}

impl ProtectionCondition {
    pub fn new(identifier: impl Into<String>, duration: f32, amount: f32) -> Self {
        Self {
            identifier: identifier.into(),
            duration,
            amount,
        }
    }
}

impl Condition for ProtectionCondition {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn kind(&self) -> ConditionKind {
        ConditionKind::Protection
    }

    fn duration(&self) -> Option<f32> {
        Some(self.duration)
    }

    fn is_resettable(&self) -> bool {
        true
    }

    fn apply_effects(&self, world: &mut World, target: Entity, application: u32) -> bool {
        if application > 1 {
            return false;
        }
        let Some(mut mitigation) = world.get_mut::<Mitigation>(target) else {
            return false;
        };
        mitigation.modify_mitigation(self.amount);
        true
    }

    fn remove_effects(&self, world: &mut World, target: Entity, applications: u32) {
        if let Some(mut mitigation) = world.get_mut::<Mitigation>(target) {
            mitigation.modify_mitigation(-self.amount * applications as f32);
        }
    }
}

/// Обездвиживает: цель в Quelled, пока условие активно.
#[derive(Debug, Clone)]
pub struct QuellCondition {
    identifier: String,
    duration: f32,
}

impl QuellCondition {
    pub fn new(identifier: impl Into<String>, duration: f32) -> Self {
        Self {
            identifier: identifier.into(),
            duration,
        }
    }
}

fn enter_quelled(world: &mut World, target: Entity, application: u32) -> bool {
    if application > 1 {
        return is_in(world, target, StateName::Quelled);
    }
    enter_named(world, target, StateName::Quelled)
}

fn leave_quelled(world: &mut World, target: Entity) {
    if is_in(world, target, StateName::Quelled) {
        enter_named(world, target, StateName::Standard);
    }
}

impl Condition for QuellCondition {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn kind(&self) -> ConditionKind {
        ConditionKind::Quell
    }

    fn duration(&self) -> Option<f32> {
        Some(self.duration)
    }

    fn is_exclusive(&self) -> bool {
        true
    }

    fn is_resettable(&self) -> bool {
        true
    }

    fn apply_effects(&self, world: &mut World, target: Entity, application: u32) -> bool {
        enter_quelled(world, target, application)
    }

    fn remove_effects(&self, world: &mut World, target: Entity, _applications: u32) {
        leave_quelled(world, target);
    }
}

/// Сон: как quell, но снимается любым уроном и не продлевается.
#[derive(Debug, Clone)]
pub struct SleepCondition {
    identifier: String,
    duration: f32,
}

impl SleepCondition {
    pub fn new(identifier: impl Into<String>, duration: f32) -> Self {
        Self {
            identifier: identifier.into(),
            duration,
        }
    }
}

impl Condition for SleepCondition {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn kind(&self) -> ConditionKind {
        ConditionKind::Sleep
    }

    fn duration(&self) -> Option<f32> {
        Some(self.duration)
    }

    fn is_exclusive(&self) -> bool {
        true
    }

    fn apply_effects(&self, world: &mut World, target: Entity, application: u32) -> bool {
        enter_quelled(world, target, application)
    }

    fn remove_effects(&self, world: &mut World, target: Entity, _applications: u32) {
        leave_quelled(world, target);
    }
}
