//! ContactNotifier: имя detection node → получатель контакта.

use bevy::prelude::*;
use std::collections::HashMap;
use std::fmt;

use super::Contactable;
use crate::entity::ComponentKind;
use crate::error::ContactError;

type ContactHandler = fn(&mut World, Entity, Entity);

/// Зарегистрированный получатель: entity + тип компонента + handlers.
#[derive(Clone, Copy)]
pub struct ContactReceiver {
    pub entity: Entity,
    pub kind: ComponentKind,
    on_begin: ContactHandler,
    on_end: ContactHandler,
}

impl ContactReceiver {
    pub fn of<C: Contactable>(entity: Entity) -> Self {
        Self {
            entity,
            kind: C::KIND,
            on_begin: begin_contact::<C>,
            on_end: end_contact::<C>,
        }
    }

    pub(crate) fn begin(&self, world: &mut World, other: Entity) {
        (self.on_begin)(world, self.entity, other);
    }

    pub(crate) fn end(&self, world: &mut World, other: Entity) {
        (self.on_end)(world, self.entity, other);
    }
}

impl fmt::Debug for ContactReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContactReceiver")
            .field("entity", &self.entity)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Process-wide реестр detection nodes и physics bodies.
///
/// Одно имя node: ровно один получатель. Повторная регистрация занятого
/// имени отклоняется (`ContactError::NameTaken`), старая не перезаписывается.
#[derive(Resource, Debug, Default)]
pub struct ContactNotifier {
    receivers: HashMap<String, ContactReceiver>,
    bodies: HashMap<String, Entity>,
}

impl ContactNotifier {
    pub fn register(&mut self, name: &str, receiver: ContactReceiver) -> Result<(), ContactError> {
        if self.receivers.contains_key(name) {
            return Err(ContactError::NameTaken(name.to_string()));
        }
        self.receivers.insert(name.to_string(), receiver);
        Ok(())
    }

    pub fn deregister(&mut self, name: &str) -> Option<ContactReceiver> {
        self.receivers.remove(name)
    }

    pub fn receiver(&self, name: &str) -> Option<&ContactReceiver> {
        self.receivers.get(name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.receivers.contains_key(name)
    }

    /// Число имён, зарегистрированных на entity.
    pub fn registrations_of(&self, entity: Entity) -> usize {
        self.receivers.values().filter(|r| r.entity == entity).count()
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    pub fn register_body(&mut self, name: &str, entity: Entity) {
        self.bodies.insert(name.to_string(), entity);
    }

    pub fn deregister_body(&mut self, name: &str) {
        self.bodies.remove(name);
    }

    pub fn body(&self, name: &str) -> Option<Entity> {
        self.bodies.get(name).copied()
    }
}

fn begin_contact<C: Contactable>(world: &mut World, receiver: Entity, other: Entity) {
    let recorded = world
        .get_mut::<C>(receiver)
        .is_some_and(|mut component| component.field_mut().record_begin(other));
    if recorded {
        C::contact_did_begin(world, receiver, other);
    }
}

fn end_contact<C: Contactable>(world: &mut World, receiver: Entity, other: Entity) {
    let recorded = world
        .get_mut::<C>(receiver)
        .is_some_and(|mut component| component.field_mut().record_end(other));
    if recorded {
        C::contact_did_end(world, receiver, other);
    }
}
