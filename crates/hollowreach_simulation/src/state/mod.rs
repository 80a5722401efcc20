//! Finite-state machine entity.
//!
//! Состояния: закрытый набор `StateKind` + объекты, реализующие
//! `EntityState`. Переход разрешает *текущее* состояние через
//! `is_valid_next_state`. `enter` без гейта не бывает: отказ = `false`,
//! ничего не изменилось. Неизвестное initial state: фатальная ошибка
//! конфигурации, ловится при создании машины (`StateError`).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::entity::{broadcast, id_of, ComponentKind, Composable};
use crate::error::{AssemblyError, StateError};
use crate::logger;

pub mod paired;
pub mod states;


pub use paired::{disarm, lift, release, DisarmDevice, Disarmable, Lift, Liftable};
pub use states::*;

/// Конкретные состояния (закрытый набор).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKind {
    PlayerStandard,
    PlayerAttack,
    PlayerDeath,
    MonsterStandard,
    MonsterAttack,
    MonsterDeath,
    Hurt,
    Quelled,
    Lifting,
    Lifted,
    Disarming,
    Armed,
    Disarmed,
}

impl StateKind {
    pub fn is_standard(&self) -> bool {
        matches!(self, StateKind::PlayerStandard | StateKind::MonsterStandard | StateKind::Armed)
    }

    pub fn is_death(&self) -> bool {
        matches!(self, StateKind::PlayerDeath | StateKind::MonsterDeath)
    }
}

/// Символьные имена состояний. Каждое имя в машине указывает максимум
/// на одно состояние.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateName {
    Standard,
    Attack,
    Death,
    Hurt,
    Quelled,
    Lifting,
    Lifted,
    Disarming,
    Disarmed,
}

/// Запрос перехода из `EntityState::update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    To(StateKind),
    Named(StateName),
}

/// Поведение одного состояния.
///
/// Объекты состояний неизменяемы и разделяются через `Arc`; время в
/// состоянии хранит машина.
pub trait EntityState: fmt::Debug + Send + Sync {
    fn kind(&self) -> StateKind;

    /// Можно ли из этого состояния перейти в `next`.
    fn is_valid_next_state(&self, next: StateKind) -> bool {
        next != self.kind()
    }

    fn did_enter(&self, _world: &mut World, _entity: Entity, _previous: Option<StateKind>) {}

    fn will_exit(&self, _world: &mut World, _entity: Entity, _next: StateKind) {}

    /// Один тик. Возвращённый переход применяется сразу, в этом же тике.
    fn update(&self, _world: &mut World, _entity: Entity, _time_in_state: f32, _delta: f32) -> Option<Transition> {
        None
    }
}

#[derive(Component, Debug)]
pub struct StateMachine {
    states: Vec<Arc<dyn EntityState>>,
    named: HashMap<StateName, StateKind>,
    initial: StateKind,
    current: Option<usize>,
    time_in_state: f32,
}

impl StateMachine {
    pub fn new(
        initial: StateKind,
        states: Vec<(Option<StateName>, Arc<dyn EntityState>)>,
    ) -> Result<Self, StateError> {
        let mut machine = Self {
            states: Vec::with_capacity(states.len()),
            named: HashMap::new(),
            initial,
            current: None,
            time_in_state: 0.0,
        };

        for (name, state) in states {
            let kind = state.kind();
            if machine.index_of(kind).is_some() {
                return Err(StateError::DuplicateState(format!("{:?}", kind)));
            }
            if let Some(name) = name {
                if machine.named.insert(name, kind).is_some() {
                    return Err(StateError::DuplicateName(format!("{:?}", name)));
                }
            }
            machine.states.push(state);
        }

        if machine.index_of(initial).is_none() {
            return Err(StateError::UnknownInitialState(format!("{:?}", initial)));
        }
        Ok(machine)
    }

    /// Игрок: ввод снаружи, атака/подъём/разминирование по запросу.
    pub fn player() -> Result<Self, StateError> {
        Self::new(
            StateKind::PlayerStandard,
            vec![
                (Some(StateName::Standard), Arc::new(StandardState::player()) as Arc<dyn EntityState>),
                (Some(StateName::Attack), Arc::new(AttackState::new(StateKind::PlayerAttack))),
                (Some(StateName::Death), Arc::new(DeathState::player())),
                (Some(StateName::Hurt), Arc::new(HurtState::new(0.4))),
                (Some(StateName::Quelled), Arc::new(QuelledState)),
                (Some(StateName::Lifting), Arc::new(LiftingState::new(1.0))),
                (Some(StateName::Disarming), Arc::new(DisarmingState::new(1.5))),
            ],
        )
    }

    /// Монстр: атакует цель из Targeting, когда та в досягаемости.
    pub fn monster() -> Result<Self, StateError> {
        Self::new(
            StateKind::MonsterStandard,
            vec![
                (Some(StateName::Standard), Arc::new(StandardState::monster()) as Arc<dyn EntityState>),
                (Some(StateName::Attack), Arc::new(AttackState::new(StateKind::MonsterAttack))),
                (Some(StateName::Death), Arc::new(DeathState::monster())),
                (Some(StateName::Hurt), Arc::new(HurtState::new(0.4))),
                (Some(StateName::Quelled), Arc::new(QuelledState)),
                (Some(StateName::Lifted), Arc::new(LiftedState::new(3.0))),
            ],
        )
    }

    /// Ловушка / устройство: взведено → разминировано.
    pub fn device() -> Result<Self, StateError> {
        Self::new(
            StateKind::Armed,
            vec![
                (Some(StateName::Standard), Arc::new(ArmedState) as Arc<dyn EntityState>),
                (Some(StateName::Disarmed), Arc::new(DisarmedState)),
            ],
        )
    }

    pub fn initial(&self) -> StateKind {
        self.initial
    }

    pub fn current(&self) -> Option<StateKind> {
        self.current.map(|index| self.states[index].kind())
    }

    pub fn current_name(&self) -> Option<StateName> {
        let current = self.current()?;
        self.name_of(current)
    }

    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    pub fn resolve(&self, name: StateName) -> Option<StateKind> {
        self.named.get(&name).copied()
    }

    pub fn name_of(&self, kind: StateKind) -> Option<StateName> {
        self.named
            .iter()
            .find(|(_, k)| **k == kind)
            .map(|(name, _)| *name)
    }

    pub fn has_state(&self, kind: StateKind) -> bool {
        self.index_of(kind).is_some()
    }

    /// Гейт перехода: состояние есть в машине и текущее его пропускает.
    pub fn can_enter(&self, kind: StateKind) -> bool {
        if !self.has_state(kind) {
            return false;
        }
        match self.current_state() {
            Some(current) => current.is_valid_next_state(kind),
            None => true,
        }
    }

    fn index_of(&self, kind: StateKind) -> Option<usize> {
        self.states.iter().position(|state| state.kind() == kind)
    }

    fn state(&self, kind: StateKind) -> Option<Arc<dyn EntityState>> {
        self.index_of(kind).map(|index| self.states[index].clone())
    }

    fn current_state(&self) -> Option<Arc<dyn EntityState>> {
        self.current.map(|index| self.states[index].clone())
    }
}

impl Composable for StateMachine {
    const KIND: ComponentKind = ComponentKind::StateMachine;

    fn did_add_to_entity(world: &mut World, entity: Entity) -> Result<(), AssemblyError> {
        enter_initial_state(world, entity);
        Ok(())
    }
}

/// Войти в initial state. Только один раз: повторный вызов вернёт false.
pub fn enter_initial_state(world: &mut World, entity: Entity) -> bool {
    let Some(machine) = world.get::<StateMachine>(entity) else {
        return false;
    };
    if machine.current.is_some() {
        return false;
    }
    let initial = machine.initial;
    transition(world, entity, initial)
}

pub fn can_enter(world: &World, entity: Entity, kind: StateKind) -> bool {
    world
        .get::<StateMachine>(entity)
        .is_some_and(|machine| machine.can_enter(kind))
}

pub fn can_enter_named(world: &World, entity: Entity, name: StateName) -> bool {
    world
        .get::<StateMachine>(entity)
        .is_some_and(|machine| machine.resolve(name).is_some_and(|kind| machine.can_enter(kind)))
}

/// Попытка перехода. false: гейт отказал, машина не изменилась.
pub fn enter(world: &mut World, entity: Entity, kind: StateKind) -> bool {
    if !can_enter(world, entity, kind) {
        return false;
    }
    transition(world, entity, kind)
}

/// Переход по имени. Неизвестное имя: false.
pub fn enter_named(world: &mut World, entity: Entity, name: StateName) -> bool {
    let Some(kind) = world
        .get::<StateMachine>(entity)
        .and_then(|machine| machine.resolve(name))
    else {
        return false;
    };
    enter(world, entity, kind)
}

pub fn current_state(world: &World, entity: Entity) -> Option<StateKind> {
    world.get::<StateMachine>(entity)?.current()
}

pub fn is_in(world: &World, entity: Entity, name: StateName) -> bool {
    world
        .get::<StateMachine>(entity)
        .is_some_and(|machine| machine.current().is_some() && machine.current() == machine.resolve(name))
}

fn transition(world: &mut World, entity: Entity, kind: StateKind) -> bool {
    let Some((previous, next)) = world
        .get::<StateMachine>(entity)
        .and_then(|machine| Some((machine.current_state(), machine.state(kind)?)))
    else {
        return false;
    };

    if let Some(previous) = &previous {
        previous.will_exit(world, entity, kind);
    }

    {
        let Some(mut machine) = world.get_mut::<StateMachine>(entity) else {
            return false;
        };
        machine.current = machine.index_of(kind);
        machine.time_in_state = 0.0;
    }

    let previous_kind = previous.map(|state| state.kind());
    logger::log(&format!(
        "{}: {:?} → {:?}",
        id_of(world, entity).unwrap_or_default(),
        previous_kind,
        kind
    ));

    next.did_enter(world, entity, previous_kind);
    broadcast(world, entity, ComponentKind::StateMachine);
    true
}

/// Один тик машины. Переход, запрошенный состоянием, применяется только
/// если за время update машина не сменила состояние сама.
pub fn update(world: &mut World, entity: Entity, delta: f32) {
    let (state, time_in_state) = {
        let Some(mut machine) = world.get_mut::<StateMachine>(entity) else {
            return;
        };
        let Some(state) = machine.current_state() else {
            return;
        };
        machine.time_in_state += delta;
        (state, machine.time_in_state)
    };

    let before = state.kind();
    let Some(request) = state.update(world, entity, time_in_state, delta) else {
        return;
    };
    if current_state(world, entity) != Some(before) {
        return;
    }

    match request {
        Transition::To(kind) => enter(world, entity, kind),
        Transition::Named(name) => enter_named(world, entity, name),
    };
}

/// Система: тик всех state machines (детерминированный порядок).
pub fn tick_state_machines(world: &mut World) {
    let delta = crate::frame_delta(world);
    let mut query = world.query_filtered::<Entity, With<StateMachine>>();
    let mut entities: Vec<Entity> = query.iter(world).collect();
    entities.sort_by_key(|entity| entity.index());

    for entity in entities {
        update(world, entity, delta);
    }
}
