//! Attack: ближняя атака в три фазы.
//!
//! Delay (замах) → Active (удар) → Conclusion (восстановление) → Idle.
//! Фазы считаются накопленным delta; в Active каждая враждебная цель в
//! зоне задевается максимум один раз за атаку. Атака начинается только
//! входом в named state `Attack` (или напрямую у entity без машины
//! состояний).

use bevy::prelude::*;
use std::sync::Arc;

use super::{entities_with, strike, Cooldown};
use crate::combat::{Damage, Medium};
use crate::components::{are_hostile, is_living, position_of};
use crate::conditions::Condition;
use crate::contact::{contacts_of, Contactable, DetectionField, Interaction};
use crate::entity::{broadcast, id_of, ComponentKind};
use crate::presentation::play_sound;
use crate::spatial::target_of;
use crate::state::{can_enter_named, enter_named, StateMachine, StateName};
use crate::{contactable_composable, logger};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AttackPhase {
    #[default]
    Idle,
    Delay { remaining: f32 },
    Active { remaining: f32 },
    Conclusion { remaining: f32 },
}

impl AttackPhase {
    fn remaining(&self) -> Option<f32> {
        match self {
            AttackPhase::Idle => None,
            AttackPhase::Delay { remaining }
            | AttackPhase::Active { remaining }
            | AttackPhase::Conclusion { remaining } => Some(*remaining),
        }
    }

    fn with_remaining(&self, remaining: f32) -> Self {
        match self {
            AttackPhase::Idle => AttackPhase::Idle,
            AttackPhase::Delay { .. } => AttackPhase::Delay { remaining },
            AttackPhase::Active { .. } => AttackPhase::Active { remaining },
            AttackPhase::Conclusion { .. } => AttackPhase::Conclusion { remaining },
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct Attack {
    field: DetectionField,
    pub medium: Medium,
    pub damage: Option<Damage>,
    pub conditions: Vec<Arc<dyn Condition>>,
    pub delay: f32,
    pub duration: f32,
    pub conclusion: f32,
    cooldown: Cooldown,
    phase: AttackPhase,
    struck: Vec<Entity>,
}

impl Attack {
    /// Ближняя атака радиусом `reach` с таймингом по умолчанию.
    pub fn new(reach: f32, damage: Damage) -> Self {
        Self {
            field: DetectionField::new(reach, Interaction::actors()),
            medium: Medium::Melee,
            damage: Some(damage),
            conditions: Vec::new(),
            delay: 0.3,
            duration: 0.2,
            conclusion: 0.3,
            cooldown: Cooldown::new(0.0),
            phase: AttackPhase::Idle,
            struck: Vec::new(),
        }
    }

    pub fn with_timing(mut self, delay: f32, duration: f32, conclusion: f32) -> Self {
        self.delay = delay.max(0.0);
        self.duration = duration.max(0.0);
        self.conclusion = conclusion.max(0.0);
        self
    }

    pub fn with_cooldown(mut self, cooldown: f32) -> Self {
        self.cooldown = Cooldown::new(cooldown);
        self
    }

    pub fn with_medium(mut self, medium: Medium) -> Self {
        self.medium = medium;
        self
    }

    pub fn with_condition(mut self, condition: Arc<dyn Condition>) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn reach(&self) -> f32 {
        self.field.radius
    }

    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == AttackPhase::Idle && self.cooldown.is_ready()
    }

    pub fn has_struck(&self, target: Entity) -> bool {
        self.struck.contains(&target)
    }

    /// Продвинуть фазы на `delta`. true: атака была в Active в этом тике.
    fn advance(&mut self, delta: f32) -> bool {
        self.cooldown.tick(delta);
        let mut active = matches!(self.phase, AttackPhase::Active { .. });
        let mut left = delta;
        while let Some(remaining) = self.phase.remaining() {
            if remaining > left {
                self.phase = self.phase.with_remaining(remaining - left);
                break;
            }
            left -= remaining;
            self.phase = match self.phase {
                AttackPhase::Delay { .. } => {
                    active = true;
                    AttackPhase::Active {
                        remaining: self.duration,
                    }
                }
                AttackPhase::Active { .. } => AttackPhase::Conclusion {
                    remaining: self.conclusion,
                },
                _ => {
                    self.cooldown.start();
                    AttackPhase::Idle
                }
            };
        }
        active
    }
}

contactable_composable!(Attack => Attack, requires [Position, SceneNode]);

impl Contactable for Attack {
    fn field(&self) -> &DetectionField {
        &self.field
    }

    fn field_mut(&mut self) -> &mut DetectionField {
        &mut self.field
    }
}

/// Начать атаку (вызывается из `AttackState::did_enter`).
pub fn begin_attack(world: &mut World, entity: Entity) -> bool {
    {
        let Some(mut attack) = world.get_mut::<Attack>(entity) else {
            return false;
        };
        if !attack.is_ready() {
            return false;
        }
        attack.phase = AttackPhase::Delay {
            remaining: attack.delay,
        };
        attack.struck.clear();
    }
    logger::log(&format!("{} begins attack", id_of(world, entity).unwrap_or_default()));
    broadcast(world, entity, ComponentKind::Attack);
    true
}

/// Прервать атаку (выход из `AttackState` раньше времени).
pub fn interrupt_attack(world: &mut World, entity: Entity) {
    let interrupted = match world.get_mut::<Attack>(entity) {
        Some(mut attack) if attack.phase != AttackPhase::Idle => {
            attack.phase = AttackPhase::Idle;
            attack.cooldown.start();
            true
        }
        _ => false,
    };
    if interrupted {
        broadcast(world, entity, ComponentKind::Attack);
    }
}

pub fn is_attacking(world: &World, entity: Entity) -> bool {
    world
        .get::<Attack>(entity)
        .is_some_and(|attack| attack.phase != AttackPhase::Idle)
}

/// Есть кого бить и атака готова.
///
/// С Targeting: только текущая цель, без него любой живой враг в зоне.
pub fn target_in_reach(world: &World, entity: Entity) -> bool {
    let Some(attack) = world.get::<Attack>(entity) else {
        return false;
    };
    if !attack.is_ready() {
        return false;
    }
    let contacts = contacts_of::<Attack>(world, entity);
    if world.get::<crate::spatial::Targeting>(entity).is_some() {
        return target_of(world, entity).is_some_and(|target| contacts.contains(&target));
    }
    contacts
        .into_iter()
        .any(|other| is_living(world, other) && are_hostile(world, entity, other))
}

/// Команда атаки (ввод игрока). Через машину состояний, если она есть.
pub fn trigger_attack(world: &mut World, entity: Entity) -> bool {
    let Some(attack) = world.get::<Attack>(entity) else {
        return false;
    };
    if !attack.is_ready() {
        return false;
    }
    if world.get::<StateMachine>(entity).is_some() {
        can_enter_named(world, entity, StateName::Attack) && enter_named(world, entity, StateName::Attack)
    } else {
        begin_attack(world, entity)
    }
}

fn strike_contacts(world: &mut World, entity: Entity) {
    let Some(attack) = world.get::<Attack>(entity) else {
        return;
    };
    let (medium, damage, conditions) = (attack.medium, attack.damage.clone(), attack.conditions.clone());
    let targets: Vec<Entity> = contacts_of::<Attack>(world, entity)
        .into_iter()
        .filter(|other| !attack.has_struck(*other))
        .filter(|other| is_living(world, *other) && are_hostile(world, entity, *other))
        .collect();

    for target in targets {
        // Атакующий мог умереть от контратаки
        if !is_living(world, entity) {
            break;
        }
        if let Some(mut attack) = world.get_mut::<Attack>(entity) {
            attack.struck.push(target);
        }
        if let Some(at) = position_of(world, target) {
            play_sound(world, "hit", at);
        }
        strike(world, entity, target, medium, damage.as_ref(), &conditions);
    }
}

/// Система: фазы атак и удары в Active.
pub fn tick_attacks(world: &mut World) {
    let delta = crate::frame_delta(world);
    for entity in entities_with::<Attack>(world) {
        let (active, finished) = {
            let Some(mut attack) = world.get_mut::<Attack>(entity) else {
                continue;
            };
            let was_attacking = attack.phase != AttackPhase::Idle;
            let active = attack.advance(delta);
            (active, was_attacking && attack.phase == AttackPhase::Idle)
        };
        if active {
            strike_contacts(world, entity);
        }
        if finished {
            broadcast(world, entity, ComponentKind::Attack);
        }
    }
}
