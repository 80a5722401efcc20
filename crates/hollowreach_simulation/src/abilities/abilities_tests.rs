//! Tests for ability components driven through full simulation frames.

use bevy::prelude::*;
use rand::rngs::mock::StepRng;
use std::sync::Arc;

use super::*;
use crate::combat::{cause_damage, Damage, DamageType, Healing, Medium};
use crate::components::{Body, Faction, Health, Position, SceneNode};
use crate::conditions::{apply_condition, has_condition, Conditions, PoisonCondition, QuellCondition};
use crate::entity::EntityBlueprint;
use crate::presentation::Notice;
use crate::progression::{give_item, Inventory, ItemId};
use crate::state::{is_in, StateMachine, StateName};
use crate::testing::frame;

fn body(id: &str, x: f32, faction: Faction, health: u32) -> EntityBlueprint {
    let groups = if faction == Faction::PLAYER {
        Body::player(0.5)
    } else {
        Body::monster(0.5)
    };
    EntityBlueprint::new(id)
        .with(Health::new(health))
        .with(Position::new(x, 0.0))
        .with(groups)
        .with(faction)
}

fn health(world: &World, entity: Entity) -> u32 {
    world.get::<Health>(entity).unwrap().current
}

fn physical(amount: f32) -> Damage {
    Damage::new(amount, DamageType::Physical)
}

fn despawned(world: &World, entity: Entity) -> bool {
    world.get_entity(entity).is_err()
}

#[test]
fn test_attack_phases_strike_each_target_once() {
    let mut world = crate::testing::world();
    let hero = body("hero", 0.0, Faction::PLAYER, 100)
        .with(SceneNode::default())
        .with(StateMachine::player().unwrap())
        .with(Attack::new(1.5, physical(10.0)).with_timing(0.1, 0.1, 0.1))
        .spawn(&mut world)
        .unwrap();
    let goblin = body("goblin", 1.0, Faction::MONSTERS, 50).spawn(&mut world).unwrap();

    frame(&mut world, 0.0);
    assert!(trigger_attack(&mut world, hero));
    assert!(is_in(&world, hero, StateName::Attack));

    frame(&mut world, 0.05);
    assert_eq!(health(&world, goblin), 50);

    frame(&mut world, 0.1);
    assert_eq!(health(&world, goblin), 40);

    frame(&mut world, 0.1);
    assert_eq!(health(&world, goblin), 40);
    assert!(is_attacking(&world, hero));

    frame(&mut world, 0.1);
    assert!(!is_attacking(&world, hero));
    frame(&mut world, 0.0);
    assert!(is_in(&world, hero, StateName::Standard));
}

#[test]
fn test_monster_attacks_hostile_in_reach() {
    let mut world = crate::testing::world();
    let ogre = body("ogre", 0.0, Faction::MONSTERS, 100)
        .with(SceneNode::default())
        .with(StateMachine::monster().unwrap())
        .with(Attack::new(1.5, physical(10.0)))
        .spawn(&mut world)
        .unwrap();

    frame(&mut world, 0.0);
    assert!(is_in(&world, ogre, StateName::Standard));

    body("hero", 1.0, Faction::PLAYER, 100).spawn(&mut world).unwrap();
    frame(&mut world, 0.0);
    assert!(is_in(&world, ogre, StateName::Attack));
}

#[test]
fn test_quelled_entity_cannot_attack() {
    let mut world = crate::testing::world();
    let hero = body("hero", 0.0, Faction::PLAYER, 100)
        .with(SceneNode::default())
        .with(StateMachine::player().unwrap())
        .with(Conditions::new())
        .with(Attack::new(1.5, physical(10.0)))
        .spawn(&mut world)
        .unwrap();

    assert!(apply_condition(&mut world, hero, Arc::new(QuellCondition::new("stun", 2.0))));
    assert!(!trigger_attack(&mut world, hero));
    assert!(!is_attacking(&world, hero));
}

#[test]
fn test_hostile_aura_pulses_on_interval() {
    let mut world = crate::testing::world();
    body("brazier", 0.0, Faction::MONSTERS, 100)
        .with(SceneNode::default())
        .with(Aura::new(3.0, 1.0, Effect::damage(Medium::None, physical(5.0))))
        .spawn(&mut world)
        .unwrap();
    let hero = body("hero", 1.0, Faction::PLAYER, 100).spawn(&mut world).unwrap();

    frame(&mut world, 0.5);
    assert_eq!(health(&world, hero), 100);
    frame(&mut world, 0.5);
    assert_eq!(health(&world, hero), 95);
}

#[test]
fn test_zero_interval_aura_is_bounded_per_frame() {
    let mut world = crate::testing::world();
    let brazier = body("brazier", 0.0, Faction::MONSTERS, 100)
        .with(SceneNode::default())
        .with(Aura::new(2.0, 0.0, Effect::damage(Medium::None, physical(1.0))))
        .spawn(&mut world)
        .unwrap();
    let hero = body("hero", 1.0, Faction::PLAYER, 1000).spawn(&mut world).unwrap();
    assert_eq!(world.get::<Aura>(brazier).unwrap().interval, aura::MIN_INTERVAL);

    // Длинный кадр: не больше 8 пульсов, накопленное время сгорает
    frame(&mut world, 4.0);
    assert_eq!(health(&world, hero), 992);
    frame(&mut world, 4.0);
    assert_eq!(health(&world, hero), 984);
}

#[test]
fn test_friendly_aura_heals_owner_and_allies_only() {
    let mut world = crate::testing::world();
    let priest = body("priest", 0.0, Faction::PLAYER, 100)
        .with(SceneNode::default())
        .with(Aura::new(3.0, 1.0, Effect::healing(Healing::new(10.0))))
        .spawn(&mut world)
        .unwrap();
    let ally = body("ally", 1.0, Faction::PLAYER, 100).spawn(&mut world).unwrap();
    let rat = body("rat", -1.0, Faction::MONSTERS, 100).spawn(&mut world).unwrap();
    for entity in [priest, ally, rat] {
        cause_damage(&mut world, entity, 50, None);
    }

    frame(&mut world, 1.0);
    assert_eq!(health(&world, priest), 60);
    assert_eq!(health(&world, ally), 60);
    assert_eq!(health(&world, rat), 50);
}

#[test]
fn test_blast_detonates_once_after_delay() {
    let mut world = crate::testing::world();
    let bomb = EntityBlueprint::new("bomb")
        .with(Position::new(0.0, 0.0))
        .with(SceneNode::default())
        .with(Faction::MONSTERS)
        .with(Blast::new(2.0, 0.5, Effect::damage(Medium::None, physical(20.0))))
        .spawn(&mut world)
        .unwrap();
    let hero = body("hero", 1.0, Faction::PLAYER, 100).spawn(&mut world).unwrap();
    let imp = body("imp", -1.0, Faction::MONSTERS, 100).spawn(&mut world).unwrap();

    frame(&mut world, 0.25);
    assert_eq!(health(&world, hero), 100);
    assert!(!despawned(&world, bomb));

    frame(&mut world, 0.25);
    assert_eq!(health(&world, hero), 80);
    assert_eq!(health(&world, imp), 100);
    assert!(despawned(&world, bomb));
}

fn arrow(world: &mut World, range: f32) -> Entity {
    EntityBlueprint::new("arrow")
        .with(Position::new(0.0, 0.0))
        .with(SceneNode::default())
        .with(Faction::PLAYER)
        .with(Missile::new(0.25, Vec2::new(10.0, 0.0), range, Effect::damage(Medium::Ranged, physical(15.0))))
        .spawn(world)
        .unwrap()
}

#[test]
fn test_missile_hits_first_hostile_and_vanishes() {
    let mut world = crate::testing::world();
    let missile = arrow(&mut world, 20.0);
    let goblin = body("goblin", 3.0, Faction::MONSTERS, 50).spawn(&mut world).unwrap();
    let troll = body("troll", 3.6, Faction::MONSTERS, 50).spawn(&mut world).unwrap();

    for _ in 0..10 {
        frame(&mut world, 0.1);
    }
    assert!(despawned(&world, missile));
    assert_eq!(health(&world, goblin), 35);
    assert_eq!(health(&world, troll), 50);
}

#[test]
fn test_missile_expires_after_range() {
    let mut world = crate::testing::world();
    let missile = arrow(&mut world, 0.5);
    frame(&mut world, 0.1);
    assert!(despawned(&world, missile));
}

#[test]
fn test_ray_strikes_nearest_hostile_on_segment() {
    let mut world = crate::testing::world();
    let mage = body("mage", 0.0, Faction::PLAYER, 100)
        .with(Ray::new(10.0, Effect::damage(Medium::Spell, physical(10.0))).with_cooldown(1.0))
        .spawn(&mut world)
        .unwrap();
    body("squire", 2.0, Faction::PLAYER, 100).spawn(&mut world).unwrap();
    let near = body("near", 5.0, Faction::MONSTERS, 50).spawn(&mut world).unwrap();
    let far = body("far", 8.0, Faction::MONSTERS, 50).spawn(&mut world).unwrap();

    assert_eq!(cast_ray(&mut world, mage, Vec2::X), Some(near));
    assert_eq!(health(&world, near), 40);
    assert_eq!(health(&world, far), 50);

    assert_eq!(cast_ray(&mut world, mage, Vec2::X), None);
    frame(&mut world, 1.0);
    assert_eq!(cast_ray(&mut world, mage, Vec2::X), Some(near));
}

#[test]
fn test_throw_consumes_ammunition_and_cools_down() {
    let mut world = crate::testing::world();
    let hero = body("hero", 0.0, Faction::PLAYER, 100)
        .with(Inventory::new(4))
        .with(
            Throwing::new(Effect::damage(Medium::Ranged, physical(12.0)), 10.0, 8.0)
                .with_cooldown(1.0)
                .with_ammunition("throwing_knife"),
        )
        .spawn(&mut world)
        .unwrap();

    assert_eq!(throw(&mut world, hero, Vec2::new(5.0, 0.0)), None);
    assert!(world
        .resource::<Events<Notice>>()
        .iter_current_update_events()
        .any(|notice| *notice == Notice::Note("Nothing to throw".into())));

    give_item(&mut world, hero, &ItemId::from("throwing_knife"), 2);
    let knife = throw(&mut world, hero, Vec2::new(5.0, 0.0)).unwrap();
    assert_eq!(world.get::<Faction>(knife), Some(&Faction::PLAYER));
    assert_eq!(crate::entity::id_of(&world, knife).as_deref(), Some("hero-thrown-0"));
    assert_eq!(world.get::<Inventory>(hero).unwrap().count(&ItemId::from("throwing_knife")), 1);

    assert_eq!(throw(&mut world, hero, Vec2::new(5.0, 0.0)), None);
    assert_eq!(throw(&mut world, hero, Vec2::new(0.0, 0.0)), None);
}

#[test]
fn test_failed_throw_keeps_ammunition() {
    let mut world = crate::testing::world();
    let hero = body("hero", 0.0, Faction::PLAYER, 100)
        .with(Inventory::new(4))
        .with(
            Throwing::new(Effect::damage(Medium::Ranged, physical(12.0)), 10.0, 8.0)
                .with_ammunition("throwing_knife"),
        )
        .spawn(&mut world)
        .unwrap();
    give_item(&mut world, hero, &ItemId::from("throwing_knife"), 2);
    // id первого снаряда уже занят, spawn отклоняется
    EntityBlueprint::new("hero-thrown-0")
        .with(Position::new(9.0, 9.0))
        .spawn(&mut world)
        .unwrap();

    assert_eq!(throw(&mut world, hero, Vec2::new(5.0, 0.0)), None);
    assert_eq!(world.get::<Inventory>(hero).unwrap().count(&ItemId::from("throwing_knife")), 2);
    assert_eq!(world.get::<Throwing>(hero).unwrap().thrown(), 0);
    assert!(world.get::<Throwing>(hero).unwrap().is_ready());
}

#[test]
fn test_touch_respects_per_target_cooldown() {
    let mut world = crate::testing::world();
    body("slime", 0.0, Faction::MONSTERS, 100)
        .with(SceneNode::default())
        .with(Touch::new(1.0, physical(5.0), 1.0))
        .spawn(&mut world)
        .unwrap();
    let hero = body("hero", 1.0, Faction::PLAYER, 100).spawn(&mut world).unwrap();

    frame(&mut world, 0.0);
    assert_eq!(health(&world, hero), 95);
    frame(&mut world, 0.5);
    assert_eq!(health(&world, hero), 95);
    frame(&mut world, 0.5);
    assert_eq!(health(&world, hero), 90);
}

#[test]
fn test_influence_applies_inside_and_removes_on_exit() {
    let mut world = crate::testing::world();
    body("totem", 0.0, Faction::MONSTERS, 100)
        .with(SceneNode::default())
        .with(Influence::new(2.0, true).with_condition(Arc::new(PoisonCondition::new("miasma", 100.0, 1))))
        .spawn(&mut world)
        .unwrap();
    let hero = body("hero", 1.0, Faction::PLAYER, 100)
        .with(Conditions::new())
        .spawn(&mut world)
        .unwrap();

    frame(&mut world, 0.0);
    assert!(has_condition(&world, hero, "miasma"));

    world.get_mut::<Position>(hero).unwrap().0 = Vec2::new(10.0, 0.0);
    frame(&mut world, 0.0);
    assert!(!has_condition(&world, hero, "miasma"));
}

#[test]
fn test_overlapping_influences_keep_condition_until_last_exit() {
    let mut world = crate::testing::world();
    for (id, x) in [("totem-a", 0.0), ("totem-b", 3.0)] {
        body(id, x, Faction::MONSTERS, 100)
            .with(SceneNode::default())
            .with(Influence::new(2.0, true).with_condition(Arc::new(PoisonCondition::new("miasma", 100.0, 1))))
            .spawn(&mut world)
            .unwrap();
    }
    let hero = body("hero", 1.5, Faction::PLAYER, 100)
        .with(Conditions::new())
        .spawn(&mut world)
        .unwrap();

    frame(&mut world, 0.0);
    assert!(has_condition(&world, hero, "miasma"));

    // Вышел из поля totem-a, но остался в поле totem-b
    world.get_mut::<Position>(hero).unwrap().0 = Vec2::new(3.0, 0.0);
    frame(&mut world, 0.0);
    assert!(has_condition(&world, hero, "miasma"));

    world.get_mut::<Position>(hero).unwrap().0 = Vec2::new(10.0, 0.0);
    frame(&mut world, 0.0);
    assert!(!has_condition(&world, hero, "miasma"));
}

fn thief_and_mark(world: &mut World, chance: f32, distance: f32) -> (Entity, Entity) {
    let thief = body("thief", 0.0, Faction::PLAYER, 100)
        .with(Inventory::new(1))
        .with(Steal::new(chance, 1.5))
        .spawn(world)
        .unwrap();
    let mark = body("merchant", distance, Faction::MONSTERS, 100)
        .with(Inventory::new(4))
        .spawn(world)
        .unwrap();
    (thief, mark)
}

#[test]
fn test_steal_moves_one_item() {
    let mut world = crate::testing::world();
    let (thief, mark) = thief_and_mark(&mut world, 0.5, 1.0);
    give_item(&mut world, mark, &ItemId::from("gold"), 10);

    let outcome = attempt_steal(&mut world, &mut StepRng::new(0, 0), thief, mark);
    assert_eq!(outcome, StealOutcome::Stolen(ItemId::from("gold")));
    assert_eq!(world.get::<Inventory>(thief).unwrap().count(&ItemId::from("gold")), 1);
    assert_eq!(world.get::<Inventory>(mark).unwrap().count(&ItemId::from("gold")), 9);
}

#[test]
fn test_steal_negative_outcomes() {
    let mut world = crate::testing::world();
    let (thief, mark) = thief_and_mark(&mut world, 0.5, 1.0);

    assert_eq!(
        attempt_steal(&mut world, &mut StepRng::new(0, 0), thief, mark),
        StealOutcome::NothingToSteal
    );

    give_item(&mut world, mark, &ItemId::from("short_sword"), 1);
    assert_eq!(
        attempt_steal(&mut world, &mut StepRng::new(u64::MAX, 0), thief, mark),
        StealOutcome::Failed
    );

    give_item(&mut world, thief, &ItemId::from("leather_armor"), 1);
    assert_eq!(
        attempt_steal(&mut world, &mut StepRng::new(0, 0), thief, mark),
        StealOutcome::InventoryFull
    );
    assert_eq!(world.get::<Inventory>(mark).unwrap().count(&ItemId::from("short_sword")), 1);

    world.get_mut::<Position>(mark).unwrap().0 = Vec2::new(5.0, 0.0);
    assert_eq!(
        attempt_steal(&mut world, &mut StepRng::new(0, 0), thief, mark),
        StealOutcome::OutOfReach
    );
}
