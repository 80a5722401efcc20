//! Overlap polling и доставка contact begin/end.
//!
//! Каждый тик для каждого attached detection field считаем пересечения
//! кругов (field vs body), сравниваем с предыдущим тиком и ставим
//! begin/end в `ContactQueue`. Engine bridge может класть туда же свои
//! события по именам nodes. `dispatch_contacts` разбирает очередь через
//! ContactNotifier.

use bevy::prelude::*;
use std::collections::HashMap;

use super::{Contactable, ContactNotifier};
use crate::components::{Body, Position};
use crate::entity::{is_alive, EntityId};
use crate::logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    Began,
    Ended,
}

/// Сырой contact event: detection node × body.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactEvent {
    pub detector: String,
    pub body: String,
    /// Entity body, если уже известна (иначе ищется по имени)
    pub entity: Option<Entity>,
    pub phase: ContactPhase,
}

impl ContactEvent {
    pub fn began(detector: &str, body: &str) -> Self {
        Self {
            detector: detector.to_string(),
            body: body.to_string(),
            entity: None,
            phase: ContactPhase::Began,
        }
    }

    pub fn ended(detector: &str, body: &str) -> Self {
        Self {
            phase: ContactPhase::Ended,
            ..Self::began(detector, body)
        }
    }
}

#[derive(Resource, Debug, Default)]
pub struct ContactQueue {
    events: Vec<ContactEvent>,
}

impl ContactQueue {
    pub fn push(&mut self, event: ContactEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Кто с кем пересекался на прошлом тике (ключ: имя detection node).
#[derive(Resource, Debug, Default)]
pub struct ContactTracking {
    overlaps: HashMap<String, Vec<(Entity, String)>>,
}

impl ContactTracking {
    pub fn current(&self, detector: &str) -> &[(Entity, String)] {
        self.overlaps.get(detector).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn forget(&mut self, detector: &str) {
        self.overlaps.remove(detector);
    }
}

struct Detector {
    entity: Entity,
    node: String,
    center: Vec2,
    radius: f32,
    groups: u32,
}

struct BodySample {
    entity: Entity,
    name: String,
    center: Vec2,
    radius: f32,
    groups: u32,
}

/// Система: пересчитать overlaps для всех attached fields компонента `C`.
pub fn poll_detection<C: Contactable>(world: &mut World) {
    let mut detectors_query = world.query::<(Entity, &C, &Position)>();
    let mut detectors: Vec<Detector> = detectors_query
        .iter(world)
        .filter_map(|(entity, component, position)| {
            let field = component.field();
            field.node_name().map(|node| Detector {
                entity,
                node: node.to_string(),
                center: position.0,
                radius: field.radius,
                groups: field.interaction().contact_groups,
            })
        })
        .collect();
    if detectors.is_empty() {
        return;
    }
    detectors.sort_by_key(|d| d.entity.index());

    let mut bodies_query = world.query::<(Entity, &EntityId, &Position, &Body)>();
    let mut bodies: Vec<BodySample> = bodies_query
        .iter(world)
        .map(|(entity, id, position, body)| BodySample {
            entity,
            name: id.0.clone(),
            center: position.0,
            radius: body.radius,
            groups: body.groups,
        })
        .collect();
    bodies.sort_by_key(|b| b.entity.index());

    let mut events = Vec::new();
    {
        let mut tracking = world.get_resource_or_insert_with(ContactTracking::default);
        for detector in &detectors {
            let current: Vec<(Entity, String)> = bodies
                .iter()
                .filter(|body| {
                    body.entity != detector.entity
                        && body.groups & detector.groups != 0
                        && body.center.distance(detector.center) <= detector.radius + body.radius
                })
                .map(|body| (body.entity, body.name.clone()))
                .collect();

            let previous = tracking.overlaps.remove(&detector.node).unwrap_or_default();

            for (entity, name) in &previous {
                if !current.iter().any(|(e, _)| e == entity) {
                    events.push(ContactEvent {
                        detector: detector.node.clone(),
                        body: name.clone(),
                        entity: Some(*entity),
                        phase: ContactPhase::Ended,
                    });
                }
            }
            for (entity, name) in &current {
                if !previous.iter().any(|(e, _)| e == entity) {
                    events.push(ContactEvent {
                        detector: detector.node.clone(),
                        body: name.clone(),
                        entity: Some(*entity),
                        phase: ContactPhase::Began,
                    });
                }
            }

            tracking.overlaps.insert(detector.node.clone(), current);
        }
    }

    let mut queue = world.get_resource_or_insert_with(ContactQueue::default);
    for event in events {
        queue.push(event);
    }
}

/// Доставить один event получателю. false: получателя нет (detached)
/// или body не найдено.
pub fn notify(world: &mut World, event: &ContactEvent) -> bool {
    let Some(notifier) = world.get_resource::<ContactNotifier>() else {
        return false;
    };
    let Some(receiver) = notifier.receiver(&event.detector).copied() else {
        logger::log(&format!("contact for unregistered node '{}' dropped", event.detector));
        return false;
    };
    let Some(other) = event.entity.or_else(|| notifier.body(&event.body)) else {
        logger::log_warning(&format!("contact with unknown body '{}'", event.body));
        return false;
    };
    if !is_alive(world, receiver.entity) {
        return false;
    }

    match event.phase {
        ContactPhase::Began => receiver.begin(world, other),
        ContactPhase::Ended => receiver.end(world, other),
    }
    true
}

/// Система: разобрать накопленные contact events.
pub fn dispatch_contacts(world: &mut World) {
    let events = match world.get_resource_mut::<ContactQueue>() {
        Some(mut queue) => queue.drain(),
        None => return,
    };
    for event in &events {
        notify(world, event);
    }
}
