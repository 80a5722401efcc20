//! Парные переходы: подъём (Lift + Liftable) и разминирование
//! (DisarmDevice + Disarmable).
//!
//! Перед `enter` на любой стороне проверяется `can_enter` на обеих.
//! Если хоть одна сторона отказывает, не меняется ни одна.

use bevy::prelude::*;

use super::{can_enter_named, enter_named, is_in, StateName};
use crate::components::position_of;
use crate::composable;
use crate::logger;
use crate::presentation::note;

/// Умеет поднимать Liftable entity.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Lift {
    pub reach: f32,
    subject: Option<Entity>,
}

impl Lift {
    pub fn new(reach: f32) -> Self {
        Self { reach, subject: None }
    }

    pub fn subject(&self) -> Option<Entity> {
        self.subject
    }
}

composable!(Lift => Lift, requires [StateMachine, Position]);

/// Может быть поднят.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct Liftable;

composable!(Liftable => Liftable, requires [StateMachine, Position]);

/// Умеет разминировать Disarmable устройства.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct DisarmDevice {
    pub reach: f32,
}

impl DisarmDevice {
    pub fn new(reach: f32) -> Self {
        Self { reach }
    }
}

composable!(DisarmDevice => DisarmDevice, requires [StateMachine, Position]);

#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct Disarmable;

composable!(Disarmable => Disarmable, requires [StateMachine, Position]);

fn within_reach(world: &World, a: Entity, b: Entity, reach: f32) -> bool {
    match (position_of(world, a), position_of(world, b)) {
        (Some(pa), Some(pb)) => pa.distance(pb) <= reach,
        _ => false,
    }
}

/// Поднять `subject`. Переходы Lifting/Lifted либо оба, либо ни одного.
pub fn lift(world: &mut World, lifter: Entity, subject: Entity) -> bool {
    let Some(reach) = world.get::<Lift>(lifter).map(|l| l.reach) else {
        return false;
    };
    if world.get::<Liftable>(subject).is_none() {
        note(world, "Cannot lift that");
        return false;
    }
    if !within_reach(world, lifter, subject, reach) {
        note(world, "Too far");
        return false;
    }

    if !can_enter_named(world, lifter, StateName::Lifting) || !can_enter_named(world, subject, StateName::Lifted) {
        logger::log(&format!("lift {:?} → {:?} refused", lifter, subject));
        return false;
    }

    enter_named(world, lifter, StateName::Lifting);
    enter_named(world, subject, StateName::Lifted);
    if let Some(mut lift) = world.get_mut::<Lift>(lifter) {
        lift.subject = Some(subject);
    }
    true
}

/// Отпустить поднятую entity (обе стороны в Standard, с тем же pre-flight).
pub fn release(world: &mut World, lifter: Entity) -> bool {
    let Some(subject) = world.get::<Lift>(lifter).and_then(|l| l.subject) else {
        return false;
    };
    let subject_held = is_in(world, subject, StateName::Lifted);
    if subject_held && !can_enter_named(world, subject, StateName::Standard) {
        return false;
    }
    if !can_enter_named(world, lifter, StateName::Standard) {
        return false;
    }

    enter_named(world, lifter, StateName::Standard);
    if subject_held {
        enter_named(world, subject, StateName::Standard);
    }
    true
}

pub(crate) fn clear_subject(world: &mut World, lifter: Entity) {
    if let Some(mut lift) = world.get_mut::<Lift>(lifter) {
        lift.subject = None;
    }
}

/// Разминировать устройство. Disarming/Disarmed либо оба, либо ни одного.
pub fn disarm(world: &mut World, actor: Entity, device: Entity) -> bool {
    let Some(reach) = world.get::<DisarmDevice>(actor).map(|d| d.reach) else {
        return false;
    };
    if world.get::<Disarmable>(device).is_none() {
        return false;
    }
    if is_in(world, device, StateName::Disarmed) {
        note(world, "Already disarmed");
        return false;
    }
    if !within_reach(world, actor, device, reach) {
        note(world, "Too far");
        return false;
    }

    if !can_enter_named(world, actor, StateName::Disarming) || !can_enter_named(world, device, StateName::Disarmed) {
        return false;
    }

    enter_named(world, actor, StateName::Disarming);
    enter_named(world, device, StateName::Disarmed);
    logger::log_info(&format!("{:?} disarmed {:?}", actor, device));
    true
}
