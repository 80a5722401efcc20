//! Barrier: пул поглощения урона, расходуется до плоской Mitigation.

use bevy::prelude::*;

use crate::composable;
use crate::entity::remove_component;
use crate::logger;
use crate::presentation::note;

/// Поглощающий барьер.
///
/// Depletable барьер тратит `remaining` на каждый удар. Постоянный
/// поглощает до `mitigation` с каждого удара, не расходуясь.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Barrier {
    pub mitigation: f32,
    remaining: f32,
    pub is_depletable: bool,
    pub duration: Option<f32>,
    elapsed: f32,
}

impl Barrier {
    pub fn depletable(amount: f32) -> Self {
        Self {
            mitigation: amount,
            remaining: amount,
            is_depletable: true,
            duration: None,
            elapsed: 0.0,
        }
    }

    pub fn permanent(mitigation: f32) -> Self {
        Self {
            is_depletable: false,
            ..Self::depletable(mitigation)
        }
    }

    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Сколько барьер ещё может поглотить одним ударом
    pub fn remaining_mitigation(&self) -> f32 {
        if self.is_depletable {
            self.remaining.max(0.0)
        } else {
            self.mitigation
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.is_depletable && self.remaining <= 0.0
    }

    pub fn is_expired(&self) -> bool {
        self.duration.is_some_and(|duration| self.elapsed >= duration)
    }

    /// Поглотить часть урона. Возвращает поглощённое количество.
    pub fn absorb(&mut self, amount: f32) -> f32 {
        let absorbed = amount.max(0.0).min(self.remaining_mitigation());
        if self.is_depletable {
            self.remaining -= absorbed;
        }
        absorbed
    }
}

composable!(Barrier => Barrier);

/// Система: таймер барьеров, снятие истёкших и исчерпанных.
pub fn tick_barriers(world: &mut World) {
    let delta = crate::frame_delta(world);

    let mut query = world.query::<(Entity, &mut Barrier)>();
    let mut finished = Vec::new();
    for (entity, mut barrier) in query.iter_mut(world) {
        barrier.elapsed += delta;
        if barrier.is_depleted() || barrier.is_expired() {
            finished.push(entity);
        }
    }
    finished.sort_by_key(|entity| entity.index());

    for entity in finished {
        if remove_component::<Barrier>(world, entity) {
            logger::log(&format!("{:?}: barrier faded", entity));
            note(world, "Barrier faded");
        }
    }
}
