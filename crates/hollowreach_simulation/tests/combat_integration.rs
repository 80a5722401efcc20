//! Combat integration test
//!
//! Полный кадр (contacts → FSM → abilities → conditions → cleanup) на headless World.
//!
//! Проверяем:
//! - удар игрока доходит до цели, опыт убийце
//! - авто-атака монстра и смерть игрока (без трупа)
//! - смерть от яда засчитывается источнику
//! - труп монстра исчезает через corpse_lifetime

use bevy::prelude::*;
use std::sync::Arc;

use hollowreach_simulation::abilities::{is_attacking, trigger_attack, Attack};
use hollowreach_simulation::combat::{Damage, DamageType};
use hollowreach_simulation::conditions::{apply_condition, Conditions, PoisonCondition};
use hollowreach_simulation::progression::Progression;
use hollowreach_simulation::state::{is_in, StateMachine, StateName};
use hollowreach_simulation::*;

fn world() -> World {
    headless_world(SimulationConfig::default())
}

fn hero(world: &mut World, health: u32) -> Entity {
    EntityBlueprint::new("hero")
        .with(Health::new(health))
        .with(Position::new(0.0, 0.0))
        .with(Body::player(0.5))
        .with(Faction::PLAYER)
        .with(SceneNode::default())
        .with(StateMachine::player().unwrap())
        .with(Attack::new(1.5, Damage::new(20.0, DamageType::Physical)))
        .with(Progression::new(1))
        .spawn(world)
        .unwrap()
}

fn goblin(health: u32, x: f32) -> EntityBlueprint {
    EntityBlueprint::new("goblin")
        .with(Health::new(health))
        .with(Position::new(x, 0.0))
        .with(Body::monster(0.5))
        .with(Faction::MONSTERS)
        .with(SceneNode::default())
        .with(StateMachine::monster().unwrap())
        .with(Progression::new(1).with_reward(100))
}

fn frames(world: &mut World, count: usize, delta: f32) {
    for _ in 0..count {
        run_frame(world, delta);
    }
}

fn health(world: &World, entity: Entity) -> u32 {
    world.get::<Health>(entity).unwrap().current
}

#[test]
fn test_player_kill_grants_experience_and_corpse_expires() {
    let mut world = world();
    let hero = hero(&mut world, 100);
    let goblin = goblin(20, 1.0).spawn(&mut world).unwrap();

    run_frame(&mut world, 0.0);
    assert!(trigger_attack(&mut world, hero));
    frames(&mut world, 10, 0.1);

    assert_eq!(health(&world, goblin), 0);
    assert!(is_in(&world, goblin, StateName::Death));
    assert!(world.get::<Expiry>(goblin).is_some());

    let progression = world.get::<Progression>(hero).unwrap();
    assert_eq!(progression.level, 2);
    assert_eq!(progression.skill_points, 1);

    let died: Vec<EntityDied> = world.resource::<Events<EntityDied>>().iter_current_update_events().copied().collect();
    assert_eq!(died, vec![EntityDied { entity: goblin, killer: Some(hero) }]);

    frames(&mut world, 5, 0.5);
    assert!(world.get_entity(goblin).is_err());
    assert!(lookup(&world, "goblin").is_none());
    assert!(!is_attacking(&world, hero));
}

#[test]
fn test_monster_auto_attack_kills_player_without_corpse() {
    let mut world = world();
    let hero = EntityBlueprint::new("hero")
        .with(Health::new(40))
        .with(Position::new(0.0, 0.0))
        .with(Body::player(0.5))
        .with(Faction::PLAYER)
        .with(StateMachine::player().unwrap())
        .spawn(&mut world)
        .unwrap();
    goblin(50, 1.0)
        .with(Attack::new(1.5, Damage::new(50.0, DamageType::Physical)))
        .spawn(&mut world)
        .unwrap();

    frames(&mut world, 20, 0.1);

    assert_eq!(health(&world, hero), 0);
    assert!(is_in(&world, hero, StateName::Death));
    assert!(world.get::<Expiry>(hero).is_none());

    let notes: Vec<Notice> = world.resource::<Events<Notice>>().iter_current_update_events().cloned().collect();
    assert!(notes.contains(&Notice::Note("You died".to_string())));
}

#[test]
fn test_poison_kill_credits_source() {
    let mut world = world();
    let hero = hero(&mut world, 100);
    let goblin = goblin(30, 20.0)
        .with(Conditions::new())
        .spawn(&mut world)
        .unwrap();

    let poison = PoisonCondition::new("venom", 5.0, 10).from_source(hero);
    assert!(apply_condition(&mut world, goblin, Arc::new(poison)));

    frames(&mut world, 4, 0.5);
    assert_eq!(health(&world, goblin), 10);

    frames(&mut world, 2, 0.5);
    assert_eq!(health(&world, goblin), 0);
    assert_eq!(world.get::<Progression>(hero).unwrap().level, 2);
    assert!(world.get::<Conditions>(goblin).unwrap().is_empty());
}
