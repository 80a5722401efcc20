//! Hollowreach Simulation Core
//!
//! ECS-симуляция action-RPG на Bevy 0.16 (headless).
//!
//! HYBRID ARCHITECTURE:
//! - ECS = game state, combat rules, conditions, progression
//! - Engine bridge = scene graph, physics bodies, audio (читает события из `presentation`)
//!
//! Вся логика кадра идёт exclusive системами по `&mut World` в фиксированном порядке
//! (`configure_schedule`), entities внутри системы обходятся по `Entity::index()`.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod abilities;
pub mod combat;
pub mod components;
pub mod conditions;
pub mod config;
pub mod contact;
pub mod entity;
pub mod error;
pub mod logger;
pub mod persistence;
pub mod presentation;
pub mod progression;
pub mod spatial;
pub mod state;

// Re-export для удобства
pub use combat::{cause_damage, restore, DamageDealt, EntityDied};
pub use components::*;
pub use config::SimulationConfig;
pub use entity::{lookup, ChangeBus, ComponentChanged, ComponentKind, EntityBlueprint, EntityId, EntityIndex};
pub use error::{AssemblyError, ConfigError, RecordError};
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, LogLevel};
pub use persistence::{capture, EntityRecord};
pub use presentation::{Notice, SceneCommand, SoundEffect};

use abilities::{
    tick_attacks, tick_auras, tick_blasts, tick_missiles, tick_rays, tick_throwing, tick_touches, Attack, Aura, Blast,
    Influence, Missile, Touch,
};
use combat::tick_barriers;
use conditions::tick_conditions;
use contact::{dispatch_contacts, poll_detection, ContactNotifier, ContactQueue, ContactTracking};
use progression::ItemCatalog;
use spatial::{update_stealth, update_targeting, Interacted, Interactor, Perception, PickUp, Stealth};
use state::tick_state_machines;

/// Главный plugin симуляции
#[derive(Default)]
pub struct SimulationPlugin {
    pub config: SimulationConfig,
}

impl SimulationPlugin {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        set_log_level(self.config.log_level);

        app.add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_event::<ComponentChanged>()
            .add_event::<SceneCommand>()
            .add_event::<SoundEffect>()
            .add_event::<Notice>()
            .add_event::<Interacted>()
            // Fixed timestep для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(self.config.tick_hz))
            // Детерминистичный RNG (seed из конфига)
            .insert_resource(DeterministicRng::new(self.config.seed))
            .insert_resource(self.config.clone())
            .init_resource::<ItemCatalog>()
            .init_resource::<ChangeBus>()
            .init_resource::<EntityIndex>()
            .init_resource::<ContactNotifier>()
            .init_resource::<ContactQueue>()
            .init_resource::<ContactTracking>()
            .edit_schedule(FixedUpdate, configure_schedule);
    }
}

/// Порядок кадра: detection → contacts → FSM → abilities → conditions → targeting → cleanup.
pub fn configure_schedule(schedule: &mut Schedule) {
    schedule.add_systems(
        (
            (
                poll_detection::<Perception>,
                poll_detection::<Interactor>,
                poll_detection::<PickUp>,
                poll_detection::<Stealth>,
                poll_detection::<Attack>,
                poll_detection::<Aura>,
                poll_detection::<Blast>,
                poll_detection::<Missile>,
                poll_detection::<Touch>,
                poll_detection::<Influence>,
            )
                .chain(),
            dispatch_contacts,
            tick_state_machines,
            (
                tick_attacks,
                tick_auras,
                tick_blasts,
                tick_missiles,
                tick_rays,
                tick_throwing,
                tick_touches,
                tick_barriers,
            )
                .chain(),
            tick_conditions,
            (update_stealth, update_targeting).chain(),
            despawn_expired,
        )
            .chain(),
    );
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Длительность текущего кадра (0, если Time ещё не вставлен)
pub fn frame_delta(world: &World) -> f32 {
    world.get_resource::<Time>().map(|time| time.delta_secs()).unwrap_or(0.0)
}

/// Один кадр симуляции с явным delta (без wall clock).
///
/// Используется headless runner'ом и интеграционными тестами.
pub fn run_frame(world: &mut World, delta: f32) {
    if !world.contains_resource::<Time>() {
        world.init_resource::<Time>();
    }
    world.resource_mut::<Time>().advance_by(Duration::from_secs_f32(delta.max(0.0)));
    if world.try_run_schedule(FixedUpdate).is_err() {
        logger::log_warning("FixedUpdate schedule missing, frame skipped");
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    init_logger();
    let config = SimulationConfig {
        seed,
        ..Default::default()
    };

    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(SimulationPlugin::new(config));
    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}

/// Голый World со всеми resources и FixedUpdate schedule (без App).
pub fn headless_world(config: SimulationConfig) -> World {
    let mut world = World::new();
    world.init_resource::<Events<DamageDealt>>();
    world.init_resource::<Events<EntityDied>>();
    world.init_resource::<Events<ComponentChanged>>();
    world.init_resource::<Events<SceneCommand>>();
    world.init_resource::<Events<SoundEffect>>();
    world.init_resource::<Events<Notice>>();
    world.init_resource::<Events<Interacted>>();

    world.insert_resource(DeterministicRng::new(config.seed));
    world.insert_resource(config);
    world.init_resource::<Time>();
    world.init_resource::<ItemCatalog>();
    world.init_resource::<ChangeBus>();
    world.init_resource::<EntityIndex>();
    world.init_resource::<ContactNotifier>();
    world.init_resource::<ContactQueue>();
    world.init_resource::<ContactTracking>();

    let mut schedule = Schedule::new(FixedUpdate);
    configure_schedule(&mut schedule);
    world.add_schedule(schedule);
    world
}
