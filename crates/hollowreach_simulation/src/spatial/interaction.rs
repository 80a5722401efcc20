//! Interactor / Interactable: двери, рычаги, сундуки в досягаемости.

use bevy::prelude::*;

use crate::components::position_of;
use crate::contact::{contacts_of, ContactGroup, Contactable, DetectionField, Interaction};
use crate::entity::{broadcast, id_of, ComponentKind};
use crate::presentation::note;
use crate::{composable, contactable_composable, logger};

/// Кто-то воспользовался interactable.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interacted {
    pub actor: Entity,
    pub target: Entity,
}

/// Объект, с которым можно взаимодействовать.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Interactable {
    pub prompt: String,
    /// None: без ограничений
    pub uses: Option<u32>,
}

impl Interactable {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            uses: None,
        }
    }

    pub fn with_uses(mut self, uses: u32) -> Self {
        self.uses = Some(uses);
        self
    }

    pub fn is_exhausted(&self) -> bool {
        self.uses == Some(0)
    }
}

composable!(Interactable => Interactable, requires [Body]);

/// Зона досягаемости актора для interactables.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Interactor {
    field: DetectionField,
}

impl Interactor {
    pub fn new(reach: f32) -> Self {
        Self {
            field: DetectionField::new(reach, Interaction::new(ContactGroup::INTERACTABLE)),
        }
    }
}

contactable_composable!(Interactor => Interactor, requires [Position, SceneNode]);

impl Contactable for Interactor {
    fn field(&self) -> &DetectionField {
        &self.field
    }

    fn field_mut(&mut self) -> &mut DetectionField {
        &mut self.field
    }

    fn contact_did_begin(world: &mut World, receiver: Entity, other: Entity) {
        let prompt = world
            .get::<Interactable>(other)
            .filter(|interactable| !interactable.is_exhausted())
            .map(|interactable| interactable.prompt.clone());
        if let Some(prompt) = prompt {
            note(world, prompt);
        }
        broadcast(world, receiver, ComponentKind::Interactor);
    }

    fn contact_did_end(world: &mut World, receiver: Entity, _other: Entity) {
        broadcast(world, receiver, ComponentKind::Interactor);
    }
}

/// Interactables в досягаемости, ближайший первым.
pub fn reachable(world: &World, actor: Entity) -> Vec<Entity> {
    let Some(origin) = position_of(world, actor) else {
        return Vec::new();
    };
    let mut candidates: Vec<(Entity, f32)> = contacts_of::<Interactor>(world, actor)
        .into_iter()
        .filter(|other| world.get::<Interactable>(*other).is_some_and(|i| !i.is_exhausted()))
        .filter_map(|other| position_of(world, other).map(|at| (other, origin.distance(at))))
        .collect();
    candidates.sort_by(|(a, da), (b, db)| da.total_cmp(db).then(a.index().cmp(&b.index())));
    candidates.into_iter().map(|(entity, _)| entity).collect()
}

/// Взаимодействовать с ближайшим interactable.
///
/// None: ничего в досягаемости (или все исчерпаны).
pub fn interact(world: &mut World, actor: Entity) -> Option<Entity> {
    let target = reachable(world, actor).into_iter().next()?;

    if let Some(mut interactable) = world.get_mut::<Interactable>(target) {
        if let Some(uses) = interactable.uses.as_mut() {
            *uses -= 1;
        }
    }

    logger::log(&format!(
        "{} interacts with {}",
        id_of(world, actor).unwrap_or_default(),
        id_of(world, target).unwrap_or_default()
    ));
    world.send_event(Interacted { actor, target });
    broadcast(world, target, ComponentKind::Interactable);
    Some(target)
}
