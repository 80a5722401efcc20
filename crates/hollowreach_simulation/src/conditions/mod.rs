//! Conditions: временные, стакающиеся статус-эффекты.
//!
//! Активное условие хранится как `(condition, elapsed, applications)` по
//! identifier. Эффекты (apply / update / remove) мутируют другие
//! компоненты цели через `&mut World`, поэтому `Conditions` никогда не
//! держится заимствованным во время вызова эффекта.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::combat::{Immunity, ImmunityKind};
use crate::components::{is_living, position_of};
use crate::composable;
use crate::entity::{broadcast, id_of, ComponentKind};
use crate::logger;
use crate::presentation::{combat_log, note, play_sound, scene, SceneCommand};

pub mod kinds;


pub use kinds::{
    PoisonCondition, ProtectionCondition, QuellCondition, RegenerationCondition, SleepCondition,
    VulnerabilityCondition, WeaknessCondition,
};

/// Конкретный тип условия (для exclusivity, иммунитетов и UI глифов).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConditionKind {
    Poison,
    Regeneration,
    Weakness,
    Vulnerability,
    Protection,
    Quell,
    Sleep,
}

impl ConditionKind {
    /// Категория иммунитета, блокирующая этот тип (None: не блокируется)
    pub fn immunity(&self) -> Option<ImmunityKind> {
        match self {
            ConditionKind::Poison => Some(ImmunityKind::Poison),
            ConditionKind::Weakness => Some(ImmunityKind::Weakness),
            ConditionKind::Vulnerability => Some(ImmunityKind::Vulnerability),
            ConditionKind::Quell => Some(ImmunityKind::Quell),
            ConditionKind::Sleep => Some(ImmunityKind::Sleep),
            ConditionKind::Regeneration | ConditionKind::Protection => None,
        }
    }

    /// Полезное условие (friendly action)
    pub fn is_beneficial(&self) -> bool {
        matches!(self, ConditionKind::Regeneration | ConditionKind::Protection)
    }

    pub fn color(&self) -> [f32; 4] {
        match self {
            ConditionKind::Poison => [0.4, 0.9, 0.3, 1.0],
            ConditionKind::Regeneration => [0.3, 1.0, 0.6, 1.0],
            ConditionKind::Weakness => [0.6, 0.5, 0.4, 1.0],
            ConditionKind::Vulnerability => [0.9, 0.5, 0.2, 1.0],
            ConditionKind::Protection => [0.5, 0.7, 1.0, 1.0],
            ConditionKind::Quell => [0.8, 0.8, 0.3, 1.0],
            ConditionKind::Sleep => [0.5, 0.4, 0.9, 1.0],
        }
    }

    /// "<target> is <verb>" для combat log
    pub fn verb(&self) -> &'static str {
        match self {
            ConditionKind::Poison => "poisoned",
            ConditionKind::Regeneration => "regenerating",
            ConditionKind::Weakness => "weakened",
            ConditionKind::Vulnerability => "vulnerable",
            ConditionKind::Protection => "protected",
            ConditionKind::Quell => "quelled",
            ConditionKind::Sleep => "asleep",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Параметры одного тика активного условия.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionTick {
    pub delta: f32,
    /// Elapsed после этого тика
    pub elapsed: f32,
    pub applications: u32,
}

impl ConditionTick {
    /// Сколько целых секунд пересёк этот тик (для периодических эффектов).
    pub fn whole_seconds_crossed(&self) -> u32 {
        let before = (self.elapsed - self.delta).max(0.0);
        (self.elapsed.floor() - before.floor()).max(0.0) as u32
    }
}

/// Статус-эффект.
///
/// Реализации неизменяемы и разделяются через `Arc`: состояние
/// (elapsed, applications) живёт в `Conditions`.
pub trait Condition: fmt::Debug + Send + Sync {
    /// Ключ активной записи. Повторное применение того же identifier
    /// не создаёт новую запись.
    fn identifier(&self) -> &str;

    fn kind(&self) -> ConditionKind;

    /// None: не истекает сам
    fn duration(&self) -> Option<f32>;

    /// Не больше одного активного условия этого типа
    fn is_exclusive(&self) -> bool {
        false
    }

    /// Повторное применение обнуляет elapsed
    fn is_resettable(&self) -> bool {
        false
    }

    /// `application`: номер применения (1 для нового). false: эффект
    /// не применился, запись не создаётся / счётчик не растёт.
    fn apply_effects(&self, world: &mut World, target: Entity, application: u32) -> bool;

    fn update(&self, _world: &mut World, _target: Entity, _tick: ConditionTick) {}

    /// Вызывается ровно один раз при снятии, со всеми applications.
    fn remove_effects(&self, _world: &mut World, _target: Entity, _applications: u32) {}
}

#[derive(Debug, Clone)]
pub struct ActiveCondition {
    pub condition: Arc<dyn Condition>,
    pub elapsed: f32,
    pub applications: u32,
}

impl ActiveCondition {
    pub fn identifier(&self) -> &str {
        self.condition.identifier()
    }

    pub fn is_expired(&self) -> bool {
        self.condition
            .duration()
            .is_some_and(|duration| self.elapsed >= duration)
    }
}

/// Активные условия entity + счётчики UI глифов по типу.
#[derive(Component, Debug, Default)]
pub struct Conditions {
    active: Vec<ActiveCondition>,
    symbols: HashMap<ConditionKind, u32>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_condition(&self, identifier: &str) -> bool {
        self.index_of(identifier).is_some()
    }

    pub fn has_kind(&self, kind: ConditionKind) -> bool {
        self.active.iter().any(|entry| entry.condition.kind() == kind)
    }

    pub fn get(&self, identifier: &str) -> Option<&ActiveCondition> {
        self.active.iter().find(|entry| entry.identifier() == identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveCondition> {
        self.active.iter()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Сколько глифов этого типа показывает UI
    pub fn symbol_count(&self, kind: ConditionKind) -> u32 {
        self.symbols.get(&kind).copied().unwrap_or(0)
    }

    fn index_of(&self, identifier: &str) -> Option<usize> {
        self.active.iter().position(|entry| entry.identifier() == identifier)
    }

    /// Новое exclusive условие блокируется тем же типом с другим id
    /// или любым другим активным exclusive условием.
    fn blocks_exclusive(&self, condition: &dyn Condition) -> bool {
        self.active.iter().any(|entry| {
            entry.identifier() != condition.identifier()
                && (entry.condition.kind() == condition.kind() || entry.condition.is_exclusive())
        })
    }

    fn insert(&mut self, condition: Arc<dyn Condition>) {
        *self.symbols.entry(condition.kind()).or_insert(0) += 1;
        self.active.push(ActiveCondition {
            condition,
            elapsed: 0.0,
            applications: 1,
        });
    }

    fn take(&mut self, identifier: &str) -> Option<ActiveCondition> {
        let index = self.index_of(identifier)?;
        let entry = self.active.remove(index);
        if let Some(count) = self.symbols.get_mut(&entry.condition.kind()) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.symbols.remove(&entry.condition.kind());
            }
        }
        Some(entry)
    }
}

composable!(Conditions => Conditions, requires [Health]);

/// Применить условие к цели. true: условие активно после вызова.
pub fn apply_condition(world: &mut World, target: Entity, condition: Arc<dyn Condition>) -> bool {
    if !is_living(world, target) || world.get::<Conditions>(target).is_none() {
        return false;
    }
    let target_name = id_of(world, target).unwrap_or_default();

    if let Some(immunity) = condition.kind().immunity() {
        if world
            .get::<Immunity>(target)
            .is_some_and(|immunities| immunities.is_immune_to(immunity))
        {
            note(world, "Immune");
            logger::log(&format!("{} immune to {}", target_name, condition.kind()));
            return false;
        }
    }

    // Повторное применение активного identifier
    let existing = world
        .get::<Conditions>(target)
        .and_then(|conditions| conditions.get(condition.identifier()))
        .map(|entry| (entry.applications + 1, entry.condition.clone()));
    if let Some((application, active)) = existing {
        if active.is_resettable() {
            if let Some(mut conditions) = world.get_mut::<Conditions>(target) {
                if let Some(index) = conditions.index_of(active.identifier()) {
                    conditions.active[index].elapsed = 0.0;
                }
            }
        }

        if active.apply_effects(world, target, application) {
            let mut applied = false;
            if let Some(mut conditions) = world.get_mut::<Conditions>(target) {
                if let Some(index) = conditions.index_of(active.identifier()) {
                    conditions.active[index].applications = application;
                    applied = true;
                }
            }
            if applied {
                broadcast(world, target, ComponentKind::Conditions);
            }
        }
        return true;
    }

    if condition.is_exclusive()
        && world
            .get::<Conditions>(target)
            .is_some_and(|conditions| conditions.blocks_exclusive(condition.as_ref()))
    {
        logger::log(&format!(
            "{}: exclusive {} rejected",
            target_name,
            condition.identifier()
        ));
        return false;
    }

    if !condition.apply_effects(world, target, 1) {
        return false;
    }
    // Эффект мог убить цель или сменить её состояние
    {
        let Some(mut conditions) = world.get_mut::<Conditions>(target) else {
            return false;
        };
        conditions.insert(condition.clone());
    }

    let kind = condition.kind();
    scene(
        world,
        SceneCommand::FlashColor {
            node: target_name.clone(),
            color: kind.color(),
        },
    );
    combat_log(world, format!("{} is {}", target_name, kind.verb()));
    if let Some(at) = position_of(world, target) {
        play_sound(world, "condition", at);
    }
    broadcast(world, target, ComponentKind::Conditions);
    true
}

/// Снять условие по identifier. remove_effects вызывается один раз.
pub fn remove_condition(world: &mut World, target: Entity, identifier: &str) -> bool {
    let Some(entry) = world
        .get_mut::<Conditions>(target)
        .and_then(|mut conditions| conditions.take(identifier))
    else {
        return false;
    };
    entry.condition.remove_effects(world, target, entry.applications);
    broadcast(world, target, ComponentKind::Conditions);
    true
}

/// Снять все условия. Возвращает количество снятых.
pub fn remove_all_conditions(world: &mut World, target: Entity) -> usize {
    let identifiers = identifiers_where(world, target, |_| true);
    identifiers
        .iter()
        .filter(|identifier| remove_condition(world, target, identifier))
        .count()
}

/// Снять все условия данного типа (урон будит спящих).
pub fn remove_conditions_of_kind(world: &mut World, target: Entity, kind: ConditionKind) -> usize {
    let identifiers = identifiers_where(world, target, |entry| entry.condition.kind() == kind);
    identifiers
        .iter()
        .filter(|identifier| remove_condition(world, target, identifier))
        .count()
}

pub fn has_condition(world: &World, target: Entity, identifier: &str) -> bool {
    world
        .get::<Conditions>(target)
        .is_some_and(|conditions| conditions.has_condition(identifier))
}

fn identifiers_where(world: &World, target: Entity, filter: impl Fn(&ActiveCondition) -> bool) -> Vec<String> {
    world
        .get::<Conditions>(target)
        .map(|conditions| {
            conditions
                .iter()
                .filter(|entry| filter(entry))
                .map(|entry| entry.identifier().to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Один тик условий цели: elapsed += delta, истёкшие снимаются,
/// остальные получают update.
pub fn update(world: &mut World, target: Entity, delta: f32) {
    for identifier in identifiers_where(world, target, |_| true) {
        // Эффект предыдущего условия мог снять это (смерть → remove_all)
        let step = {
            let Some(mut conditions) = world.get_mut::<Conditions>(target) else {
                return;
            };
            let Some(index) = conditions.index_of(&identifier) else {
                continue;
            };
            let entry = &mut conditions.active[index];
            entry.elapsed += delta;
            if entry.is_expired() {
                None
            } else {
                Some((
                    entry.condition.clone(),
                    ConditionTick {
                        delta,
                        elapsed: entry.elapsed,
                        applications: entry.applications,
                    },
                ))
            }
        };

        match step {
            Some((condition, tick)) => condition.update(world, target, tick),
            None => {
                remove_condition(world, target, &identifier);
            }
        }
    }
}

/// Система: тик условий всех entity.
pub fn tick_conditions(world: &mut World) {
    let delta = crate::frame_delta(world);
    let mut query = world.query_filtered::<Entity, With<Conditions>>();
    let mut entities: Vec<Entity> = query.iter(world).collect();
    entities.sort_by_key(|entity| entity.index());

    for entity in entities {
        update(world, entity, delta);
    }
}
