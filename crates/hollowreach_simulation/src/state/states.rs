//! Конкретные состояния entity.

use bevy::prelude::*;

use super::{EntityState, StateKind, StateName, Transition};
use crate::abilities::attack;
use crate::components::Expiry;
use crate::config::SimulationConfig;
use crate::conditions::remove_all_conditions;
use crate::entity::{add_component, id_of};
use crate::presentation::{note, scene, SceneCommand};

fn play_animation(world: &mut World, entity: Entity, animation: &str) {
    if let Some(node) = id_of(world, entity) {
        scene(
            world,
            SceneCommand::PlayAnimation {
                node,
                animation: animation.to_string(),
            },
        );
    }
}

/// Обычное состояние. Монстр из него сам начинает атаку.
#[derive(Debug)]
pub struct StandardState {
    kind: StateKind,
    auto_attack: bool,
}

impl StandardState {
    pub fn player() -> Self {
        Self {
            kind: StateKind::PlayerStandard,
            auto_attack: false,
        }
    }

    pub fn monster() -> Self {
        Self {
            kind: StateKind::MonsterStandard,
            auto_attack: true,
        }
    }
}

impl EntityState for StandardState {
    fn kind(&self) -> StateKind {
        self.kind
    }

    fn did_enter(&self, world: &mut World, entity: Entity, previous: Option<StateKind>) {
        if previous.is_some() {
            play_animation(world, entity, "idle");
        }
    }

    fn update(&self, world: &mut World, entity: Entity, _time_in_state: f32, _delta: f32) -> Option<Transition> {
        if self.auto_attack && attack::target_in_reach(world, entity) {
            return Some(Transition::Named(StateName::Attack));
        }
        None
    }
}

/// Атака: держится, пока Attack проходит свои фазы.
#[derive(Debug)]
pub struct AttackState {
    kind: StateKind,
}

impl AttackState {
    pub fn new(kind: StateKind) -> Self {
        Self { kind }
    }
}

impl EntityState for AttackState {
    fn kind(&self) -> StateKind {
        self.kind
    }

    fn is_valid_next_state(&self, next: StateKind) -> bool {
        !matches!(next, StateKind::Lifting | StateKind::Disarming) && next != self.kind
    }

    fn did_enter(&self, world: &mut World, entity: Entity, _previous: Option<StateKind>) {
        attack::begin_attack(world, entity);
        play_animation(world, entity, "attack");
    }

    fn will_exit(&self, world: &mut World, entity: Entity, _next: StateKind) {
        attack::interrupt_attack(world, entity);
    }

    fn update(&self, world: &mut World, entity: Entity, _time_in_state: f32, _delta: f32) -> Option<Transition> {
        if attack::is_attacking(world, entity) {
            None
        } else {
            Some(Transition::Named(StateName::Standard))
        }
    }
}

/// Короткий stagger после удара / оглушения.
#[derive(Debug)]
pub struct HurtState {
    duration: f32,
}

impl HurtState {
    pub fn new(duration: f32) -> Self {
        Self { duration }
    }
}

impl EntityState for HurtState {
    fn kind(&self) -> StateKind {
        StateKind::Hurt
    }

    fn did_enter(&self, world: &mut World, entity: Entity, _previous: Option<StateKind>) {
        play_animation(world, entity, "hurt");
    }

    fn update(&self, _world: &mut World, _entity: Entity, time_in_state: f32, _delta: f32) -> Option<Transition> {
        (time_in_state >= self.duration).then_some(Transition::Named(StateName::Standard))
    }
}

/// Обездвижен (quell / sleep). Выход: снятием условия.
#[derive(Debug)]
pub struct QuelledState;

impl EntityState for QuelledState {
    fn kind(&self) -> StateKind {
        StateKind::Quelled
    }

    fn is_valid_next_state(&self, next: StateKind) -> bool {
        next.is_standard() || next.is_death() || next == StateKind::Lifted
    }

    fn did_enter(&self, world: &mut World, entity: Entity, _previous: Option<StateKind>) {
        play_animation(world, entity, "quelled");
    }
}

/// Смерть: терминальное состояние.
#[derive(Debug)]
pub struct DeathState {
    kind: StateKind,
    leaves_corpse: bool,
}

impl DeathState {
    pub fn player() -> Self {
        Self {
            kind: StateKind::PlayerDeath,
            leaves_corpse: false,
        }
    }

    pub fn monster() -> Self {
        Self {
            kind: StateKind::MonsterDeath,
            leaves_corpse: true,
        }
    }
}

impl EntityState for DeathState {
    fn kind(&self) -> StateKind {
        self.kind
    }

    fn is_valid_next_state(&self, _next: StateKind) -> bool {
        false
    }

    fn did_enter(&self, world: &mut World, entity: Entity, _previous: Option<StateKind>) {
        remove_all_conditions(world, entity);
        play_animation(world, entity, "death");

        if self.leaves_corpse {
            let lifetime = world
                .get_resource::<SimulationConfig>()
                .map_or(2.0, |config| config.corpse_lifetime);
            // Expiry мог быть добавлен раньше (например, summon с таймером)
            let _ = add_component(world, entity, Expiry::after(lifetime));
        } else {
            note(world, "You died");
        }
    }
}

/// Держит над головой другую entity.
#[derive(Debug)]
pub struct LiftingState {
    duration: f32,
}

impl LiftingState {
    pub fn new(duration: f32) -> Self {
        Self { duration }
    }
}

impl EntityState for LiftingState {
    fn kind(&self) -> StateKind {
        StateKind::Lifting
    }

    fn is_valid_next_state(&self, next: StateKind) -> bool {
        next.is_standard() || next.is_death() || matches!(next, StateKind::Hurt | StateKind::Quelled)
    }

    fn did_enter(&self, world: &mut World, entity: Entity, _previous: Option<StateKind>) {
        play_animation(world, entity, "lift");
    }

    fn will_exit(&self, world: &mut World, entity: Entity, _next: StateKind) {
        super::paired::clear_subject(world, entity);
    }

    fn update(&self, _world: &mut World, _entity: Entity, time_in_state: f32, _delta: f32) -> Option<Transition> {
        (time_in_state >= self.duration).then_some(Transition::Named(StateName::Standard))
    }
}

/// Поднят другой entity, беспомощен до конца таймера.
#[derive(Debug)]
pub struct LiftedState {
    duration: f32,
}

impl LiftedState {
    pub fn new(duration: f32) -> Self {
        Self { duration }
    }
}

impl EntityState for LiftedState {
    fn kind(&self) -> StateKind {
        StateKind::Lifted
    }

    fn is_valid_next_state(&self, next: StateKind) -> bool {
        next.is_standard() || next.is_death()
    }

    fn did_enter(&self, world: &mut World, entity: Entity, _previous: Option<StateKind>) {
        play_animation(world, entity, "lifted");
    }

    fn update(&self, _world: &mut World, _entity: Entity, time_in_state: f32, _delta: f32) -> Option<Transition> {
        (time_in_state >= self.duration).then_some(Transition::Named(StateName::Standard))
    }
}

#[derive(Debug)]
pub struct DisarmingState {
    duration: f32,
}

impl DisarmingState {
    pub fn new(duration: f32) -> Self {
        Self { duration }
    }
}

impl EntityState for DisarmingState {
    fn kind(&self) -> StateKind {
        StateKind::Disarming
    }

    fn is_valid_next_state(&self, next: StateKind) -> bool {
        next.is_standard() || next.is_death() || matches!(next, StateKind::Hurt | StateKind::Quelled)
    }

    fn did_enter(&self, world: &mut World, entity: Entity, _previous: Option<StateKind>) {
        play_animation(world, entity, "disarm");
    }

    fn update(&self, _world: &mut World, _entity: Entity, time_in_state: f32, _delta: f32) -> Option<Transition> {
        (time_in_state >= self.duration).then_some(Transition::Named(StateName::Standard))
    }
}

/// Устройство взведено.
#[derive(Debug)]
pub struct ArmedState;

impl EntityState for ArmedState {
    fn kind(&self) -> StateKind {
        StateKind::Armed
    }

    fn is_valid_next_state(&self, next: StateKind) -> bool {
        next == StateKind::Disarmed
    }
}

/// Устройство разминировано навсегда.
#[derive(Debug)]
pub struct DisarmedState;

impl EntityState for DisarmedState {
    fn kind(&self) -> StateKind {
        StateKind::Disarmed
    }

    fn is_valid_next_state(&self, _next: StateKind) -> bool {
        false
    }

    fn did_enter(&self, world: &mut World, entity: Entity, _previous: Option<StateKind>) {
        play_animation(world, entity, "disarmed");
    }
}
