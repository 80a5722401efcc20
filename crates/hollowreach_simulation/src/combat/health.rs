//! Изменение здоровья: урон, лечение, смерть.

use bevy::prelude::*;

use super::{DamageDealt, EntityDied};
use crate::components::Health;
use crate::conditions::{remove_conditions_of_kind, ConditionKind};
use crate::entity::{broadcast, id_of, ComponentKind};
use crate::logger;
use crate::presentation::{scene, SceneCommand};
use crate::progression::{add_experience, Progression};
use crate::state::{enter_named, StateName};

const DAMAGE_FLASH: [f32; 4] = [1.0, 0.2, 0.2, 1.0];

/// Нанести урон. Возвращает реально снятое здоровье (0 для мёртвых).
///
/// Урон будит спящих. Смерть: `EntityDied`, опыт убийце, переход в Death.
pub fn cause_damage(world: &mut World, target: Entity, amount: u32, source: Option<Entity>) -> u32 {
    let (applied, alive) = match world.get_mut::<Health>(target) {
        Some(mut health) if health.is_alive() => {
            let applied = health.take_damage(amount);
            (applied, health.is_alive())
        }
        _ => return 0,
    };
    if applied == 0 {
        return 0;
    }

    world.send_event(DamageDealt {
        target,
        source,
        amount: applied,
    });
    if let Some(node) = id_of(world, target) {
        scene(
            world,
            SceneCommand::FlashColor {
                node,
                color: DAMAGE_FLASH,
            },
        );
    }
    broadcast(world, target, ComponentKind::Health);

    remove_conditions_of_kind(world, target, ConditionKind::Sleep);

    if !alive {
        on_death(world, target, source);
    }
    applied
}

/// Лечение живой цели. Возвращает реально восстановленное.
pub fn restore(world: &mut World, target: Entity, amount: u32) -> u32 {
    let restored = match world.get_mut::<Health>(target) {
        Some(mut health) if health.is_alive() => health.heal(amount),
        _ => return 0,
    };
    if restored > 0 {
        broadcast(world, target, ComponentKind::Health);
    }
    restored
}

fn on_death(world: &mut World, target: Entity, killer: Option<Entity>) {
    logger::log_info(&format!("💀 {} died", id_of(world, target).unwrap_or_default()));
    world.send_event(EntityDied {
        entity: target,
        killer,
    });

    let reward = world.get::<Progression>(target).map_or(0, |p| p.reward);
    if let Some(killer) = killer {
        if reward > 0 && killer != target {
            add_experience(world, killer, reward);
        }
    }

    enter_named(world, target, StateName::Death);
}
