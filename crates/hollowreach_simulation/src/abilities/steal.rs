//! Steal: попытка украсть случайный предмет у цели.

use bevy::prelude::*;
use rand::Rng;

use crate::components::{is_living, position_of};
use crate::entity::id_of;
use crate::presentation::{combat_log, note};
use crate::progression::{give_item, take_item, ItemCatalog, ItemId, Inventory};
use crate::{composable, logger, DeterministicRng};

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Steal {
    pub chance: f32,
    pub reach: f32,
}

impl Steal {
    pub fn new(chance: f32, reach: f32) -> Self {
        Self {
            chance: chance.clamp(0.0, 1.0),
            reach,
        }
    }
}

composable!(Steal => Steal, requires [Position, Inventory]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StealOutcome {
    Stolen(ItemId),
    /// Бросок не прошёл
    Failed,
    NothingToSteal,
    OutOfReach,
    InventoryFull,
}

/// Украсть один предмет у `victim` с заданным источником бросков.
pub fn attempt_steal<R: Rng + ?Sized>(world: &mut World, rng: &mut R, thief: Entity, victim: Entity) -> StealOutcome {
    let Some(steal) = world.get::<Steal>(thief).copied() else {
        return StealOutcome::Failed;
    };
    if !is_living(world, thief) || !is_living(world, victim) {
        return StealOutcome::Failed;
    }
    let in_reach = match (position_of(world, thief), position_of(world, victim)) {
        (Some(from), Some(to)) => from.distance(to) <= steal.reach,
        _ => false,
    };
    if !in_reach {
        return StealOutcome::OutOfReach;
    }

    let stacks: Vec<ItemId> = world
        .get::<Inventory>(victim)
        .map(|inventory| inventory.stacks().iter().map(|stack| stack.item.clone()).collect())
        .unwrap_or_default();
    if stacks.is_empty() {
        return StealOutcome::NothingToSteal;
    }

    if rng.gen::<f32>() >= steal.chance {
        combat_log(world, format!("{} fumbles", id_of(world, thief).unwrap_or_default()));
        return StealOutcome::Failed;
    }
    let item = stacks[rng.gen_range(0..stacks.len())].clone();

    let max_stack = world
        .get_resource::<ItemCatalog>()
        .map_or(1, |catalog| catalog.max_stack(&item));
    let has_room = world
        .get::<Inventory>(thief)
        .is_some_and(|inventory| inventory.room_for(&item, 1, max_stack) > 0);
    if !has_room {
        note(world, "Inventory full");
        return StealOutcome::InventoryFull;
    }

    if take_item(world, victim, &item, 1) == 0 {
        return StealOutcome::NothingToSteal;
    }
    give_item(world, thief, &item, 1);
    logger::log(&format!(
        "{} stole {} from {}",
        id_of(world, thief).unwrap_or_default(),
        item,
        id_of(world, victim).unwrap_or_default()
    ));
    StealOutcome::Stolen(item)
}

/// `attempt_steal` с глобальным `DeterministicRng`.
pub fn steal(world: &mut World, thief: Entity, victim: Entity) -> StealOutcome {
    let mut rng = world.remove_resource::<DeterministicRng>().unwrap_or_else(|| {
        logger::log_warning("DeterministicRng missing, seeding with 0");
        DeterministicRng::new(0)
    });
    let outcome = attempt_steal(world, &mut rng.rng, thief, victim);
    world.insert_resource(rng);
    outcome
}
