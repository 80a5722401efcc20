//! Headless симуляция Hollowreach
//!
//! Герой против пары гоблинов без рендера, фиксированный delta.
//! Аргумент: путь к RON конфигу (по умолчанию `config/simulation.ron`).

use bevy::prelude::*;

use hollowreach_simulation::abilities::{is_attacking, target_in_reach, trigger_attack, Attack};
use hollowreach_simulation::combat::{Damage, DamageType};
use hollowreach_simulation::progression::{give_item, Inventory, ItemId, Progression};
use hollowreach_simulation::spatial::{Perception, Targeting};
use hollowreach_simulation::state::StateMachine;
use hollowreach_simulation::{
    capture, headless_world, init_logger, log_error, log_info, log_warning, run_frame, Body, EntityBlueprint, Faction,
    Health, Position, SceneNode, SimulationConfig,
};

const TICKS: u32 = 600;

fn main() {
    init_logger();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/simulation.ron".to_string());
    let config = SimulationConfig::load(&path).unwrap_or_else(|err| {
        log_warning(&format!("{}, using defaults", err));
        SimulationConfig::default()
    });
    let delta = 1.0 / config.tick_hz as f32;
    log_info(&format!(
        "Starting Hollowreach headless simulation (seed: {}, {} Hz)",
        config.seed, config.tick_hz
    ));

    let mut world = headless_world(config.clone());
    let Some(hero) = spawn_party(&mut world, &config) else {
        return;
    };

    for tick in 0..TICKS {
        // У игрока нет авто-атаки: нажимаем за него
        if !is_attacking(&world, hero) && target_in_reach(&world, hero) {
            trigger_attack(&mut world, hero);
        }
        run_frame(&mut world, delta);

        if tick % 100 == 0 {
            let hp = world.get::<Health>(hero).map_or(0, |h| h.current);
            log_info(&format!(
                "Tick {}: {} entities, hero hp {}",
                tick,
                world.entities().len(),
                hp
            ));
        }
    }

    match capture(&world, hero).map(|record| record.to_ron()) {
        Some(Ok(text)) => log_info(&format!("Hero record:\n{}", text)),
        Some(Err(err)) => log_error(&err.to_string()),
        None => log_warning("Hero is gone"),
    }
    log_info("Simulation complete!");
}

fn spawn_party(world: &mut World, config: &SimulationConfig) -> Option<Entity> {
    let machine = |monster: bool| {
        let result = if monster {
            StateMachine::monster()
        } else {
            StateMachine::player()
        };
        result.map_err(|err| log_error(&err.to_string())).ok()
    };

    let hero = EntityBlueprint::new("hero")
        .with(Health::new(120))
        .with(Position::new(0.0, 0.0))
        .with(Body::player(0.5))
        .with(Faction::PLAYER)
        .with(SceneNode::default())
        .with(machine(false)?)
        .with(Perception::new(10.0))
        .with(Targeting::new(8.0))
        .with(Attack::new(1.5, Damage::new(12.0, DamageType::Physical)))
        .with(Inventory::new(config.inventory_capacity))
        .with(Progression::new(1))
        .spawn(world)
        .map_err(|err| log_error(&err.to_string()))
        .ok()?;
    give_item(world, hero, &ItemId::from("gold"), 10);

    for (index, x) in [1.0_f32, -1.2].into_iter().enumerate() {
        let spawned = EntityBlueprint::new(format!("goblin-{}", index))
            .with(Health::new(40))
            .with(Position::new(x, 0.0))
            .with(Body::monster(0.5))
            .with(Faction::MONSTERS)
            .with(SceneNode::default())
            .with(machine(true)?)
            .with(Perception::new(6.0))
            .with(Targeting::new(6.0))
            .with(Attack::new(1.2, Damage::new(4.0, DamageType::Physical)).with_cooldown(1.0))
            .with(Progression::new(1).with_reward(60))
            .spawn(world);
        if let Err(err) = spawned {
            log_error(&err.to_string());
        }
    }
    Some(hero)
}
