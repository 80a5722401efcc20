//! Progression: уровни и опыт, навыки, inventory, экипировка.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::{CriticalHit, DamageAdjustment, Defense, Mitigation, Resistance};
use crate::components::Health;
use crate::composable;
use crate::config::SimulationConfig;
use crate::entity::{broadcast, id_of, ComponentKind};
use crate::logger;
use crate::presentation::{combat_log, note};

pub mod equipment;
pub mod inventory;
pub mod items;
pub mod skills;

pub use equipment::{equip, unequip, Equipment};
pub use inventory::{give_item, take_item, Inventory, ItemStack};
pub use items::{EquipmentSlot, ItemCatalog, ItemDefinition, ItemId, ItemModifier};
pub use skills::{upgrade_skill, SkillKind, Skills};

/// Уровень и опыт entity. `reward`: опыт убийце.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[reflect(Component)]
pub struct Progression {
    pub level: u32,
    /// Опыт внутри текущего уровня
    pub experience: u32,
    pub skill_points: u32,
    pub reward: u32,
}

impl Progression {
    pub fn new(level: u32) -> Self {
        Self {
            level: level.max(1),
            experience: 0,
            skill_points: 0,
            reward: 0,
        }
    }

    pub fn with_reward(mut self, reward: u32) -> Self {
        self.reward = reward;
        self
    }
}

impl Default for Progression {
    fn default() -> Self {
        Self::new(1)
    }
}

composable!(Progression => Progression);

/// Начислить опыт. Возвращает число полученных уровней.
pub fn add_experience(world: &mut World, entity: Entity, amount: u32) -> u32 {
    let config = world.get_resource::<SimulationConfig>().cloned().unwrap_or_default();
    let (gained, level) = {
        let Some(mut progression) = world.get_mut::<Progression>(entity) else {
            return 0;
        };
        progression.experience = progression.experience.saturating_add(amount);
        let mut gained = 0;
        loop {
            let threshold = config.experience_threshold(progression.level).max(1);
            if progression.experience < threshold {
                break;
            }
            progression.experience -= threshold;
            progression.level += 1;
            progression.skill_points += config.skill_points_per_level;
            gained += 1;
        }
        (gained, progression.level)
    };

    if gained > 0 {
        logger::log_info(&format!(
            "⬆ {} reached level {}",
            id_of(world, entity).unwrap_or_default(),
            level
        ));
        note(world, "Level up!");
        combat_log(world, format!("Level {} reached", level));
    }
    broadcast(world, entity, ComponentKind::Progression);
    gained
}

/// Модификатор применим: у entity есть целевой компонент.
pub fn modifier_applies(world: &World, entity: Entity, modifier: &ItemModifier) -> bool {
    match modifier {
        ItemModifier::Defense(_) => world.get::<Defense>(entity).is_some(),
        ItemModifier::Resistance(_) => world.get::<Resistance>(entity).is_some(),
        ItemModifier::CriticalChance(_) => world.get::<CriticalHit>(entity).is_some(),
        ItemModifier::Mitigation(_) => world.get::<Mitigation>(entity).is_some(),
        ItemModifier::DamageCaused(_) => world.get::<DamageAdjustment>(entity).is_some(),
        ItemModifier::MaxHealth(_) => world.get::<Health>(entity).is_some(),
    }
}

/// Применить (`sign = 1.0`) или откатить (`sign = -1.0`) модификатор.
/// Аккумуляторы не клампятся при записи, поэтому откат точен.
pub fn apply_modifier(world: &mut World, entity: Entity, modifier: &ItemModifier, sign: f32) -> bool {
    let applied = match *modifier {
        ItemModifier::Defense(by) => world
            .get_mut::<Defense>(entity)
            .map(|mut defense| defense.modify_defense(by * sign))
            .is_some(),
        ItemModifier::Resistance(by) => world
            .get_mut::<Resistance>(entity)
            .map(|mut resistance| resistance.modify_resistance(by * sign))
            .is_some(),
        ItemModifier::CriticalChance(by) => world
            .get_mut::<CriticalHit>(entity)
            .map(|mut critical| critical.modify_critical_chance(by * sign))
            .is_some(),
        ItemModifier::Mitigation(by) => world
            .get_mut::<Mitigation>(entity)
            .map(|mut mitigation| mitigation.modify_mitigation(by * sign))
            .is_some(),
        ItemModifier::DamageCaused(by) => world
            .get_mut::<DamageAdjustment>(entity)
            .map(|mut adjustment| adjustment.modify_damage_caused(by * sign))
            .is_some(),
        ItemModifier::MaxHealth(by) => match world.get_mut::<Health>(entity) {
            Some(mut health) => {
                if sign >= 0.0 {
                    health.max = health.max.saturating_add(by);
                    health.current = health.current.saturating_add(by);
                } else {
                    health.max = health.max.saturating_sub(by).max(1);
                    health.current = health.current.min(health.max);
                }
                true
            }
            None => false,
        },
    };
    if applied {
        let kind = match modifier {
            ItemModifier::Defense(_) => ComponentKind::Defense,
            ItemModifier::Resistance(_) => ComponentKind::Resistance,
            ItemModifier::CriticalChance(_) => ComponentKind::CriticalHit,
            ItemModifier::Mitigation(_) => ComponentKind::Mitigation,
            ItemModifier::DamageCaused(_) => ComponentKind::DamageAdjustment,
            ItemModifier::MaxHealth(_) => ComponentKind::Health,
        };
        broadcast(world, entity, kind);
    }
    applied
}
