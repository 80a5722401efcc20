//! Skills: ранги навыков за skill points. Каждый ранг даёт модификатор
//! соответствующего боевого компонента.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{apply_modifier, modifier_applies, ItemModifier, Progression};
use crate::composable;
use crate::config::SimulationConfig;
use crate::entity::{broadcast, id_of, ComponentKind};
use crate::logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillKind {
    /// +Defense
    Toughness,
    /// +Resistance
    Willpower,
    /// +Critical chance
    Precision,
    /// +Mitigation
    Fortitude,
    /// +Damage caused
    Might,
    /// +Max health
    Vitality,
}

impl SkillKind {
    pub fn per_rank(&self) -> ItemModifier {
        match self {
            SkillKind::Toughness => ItemModifier::Defense(0.05),
            SkillKind::Willpower => ItemModifier::Resistance(0.05),
            SkillKind::Precision => ItemModifier::CriticalChance(0.05),
            SkillKind::Fortitude => ItemModifier::Mitigation(2.0),
            SkillKind::Might => ItemModifier::DamageCaused(0.1),
            SkillKind::Vitality => ItemModifier::MaxHealth(10),
        }
    }
}

#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skills {
    ranks: BTreeMap<SkillKind, u32>,
}

impl Skills {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rank(&self, skill: SkillKind) -> u32 {
        self.ranks.get(&skill).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SkillKind, u32)> + '_ {
        self.ranks.iter().map(|(skill, rank)| (*skill, *rank))
    }
}

composable!(Skills => Skills, requires [Progression]);

/// Потратить skill point на ранг. false: нет очков, максимум ранга или
/// у entity нет компонента, который навык усиливает.
pub fn upgrade_skill(world: &mut World, entity: Entity, skill: SkillKind) -> bool {
    let max_rank = world
        .get_resource::<SimulationConfig>()
        .map_or(5, |config| config.max_skill_rank);
    let Some(rank) = world.get::<Skills>(entity).map(|skills| skills.rank(skill)) else {
        return false;
    };
    let has_points = world
        .get::<Progression>(entity)
        .is_some_and(|progression| progression.skill_points > 0);
    let modifier = skill.per_rank();
    if !has_points || rank >= max_rank || !modifier_applies(world, entity, &modifier) {
        return false;
    }

    if let Some(mut progression) = world.get_mut::<Progression>(entity) {
        progression.skill_points -= 1;
    }
    if let Some(mut skills) = world.get_mut::<Skills>(entity) {
        skills.ranks.insert(skill, rank + 1);
    }
    apply_modifier(world, entity, &modifier, 1.0);

    logger::log(&format!(
        "{} {:?} → rank {}",
        id_of(world, entity).unwrap_or_default(),
        skill,
        rank + 1
    ));
    broadcast(world, entity, ComponentKind::Skills);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{CriticalHit, Medium};
    use crate::components::Health;
    use crate::entity::EntityBlueprint;

    #[test]
    fn test_upgrade_spends_points_and_caps_rank() {
        let mut world = crate::testing::world();
        world.resource_mut::<SimulationConfig>().max_skill_rank = 2;
        let hero = EntityBlueprint::new("hero")
            .with(Health::new(100))
            .with(CriticalHit::new(0.0))
            .with(Progression {
                skill_points: 5,
                ..Progression::new(1)
            })
            .with(Skills::new())
            .spawn(&mut world)
            .unwrap();

        assert!(upgrade_skill(&mut world, hero, SkillKind::Precision));
        assert!(upgrade_skill(&mut world, hero, SkillKind::Precision));
        assert!(!upgrade_skill(&mut world, hero, SkillKind::Precision));

        assert_eq!(world.get::<Skills>(hero).unwrap().rank(SkillKind::Precision), 2);
        assert_eq!(world.get::<Progression>(hero).unwrap().skill_points, 3);
        let chance = world.get::<CriticalHit>(hero).unwrap().critical_chance(Medium::Melee);
        assert!((chance - 0.1).abs() < 1e-5);

        assert!(upgrade_skill(&mut world, hero, SkillKind::Vitality));
        assert_eq!(world.get::<Health>(hero).unwrap().max, 110);
    }

    #[test]
    fn test_upgrade_needs_points_and_target_component() {
        let mut world = crate::testing::world();
        let hero = EntityBlueprint::new("hero")
            .with(Progression {
                skill_points: 1,
                ..Progression::new(1)
            })
            .with(Skills::new())
            .spawn(&mut world)
            .unwrap();

        // Нет Defense
        assert!(!upgrade_skill(&mut world, hero, SkillKind::Toughness));
        assert_eq!(world.get::<Progression>(hero).unwrap().skill_points, 1);

        world.get_mut::<Progression>(hero).unwrap().skill_points = 0;
        assert!(!upgrade_skill(&mut world, hero, SkillKind::Might));
    }
}
