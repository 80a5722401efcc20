//! Contact notification: detection fields, ContactNotifier, dispatch.
//!
//! Каждый пространственный компонент (Attack, Aura, Perception, PickUp,
//! Stealth, ...) владеет `DetectionField`. При attach регистрирует имя
//! своего detection node в `ContactNotifier` и добавляет node в scene node
//! entity, при detach делает обратное. Overlaps пересчитываются каждый тик
//! (`poll_detection`), begin/end доставляются через notifier.

use bevy::ecs::component::Mutable;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::SceneNode;
use crate::entity::{id_of, is_alive, ComponentKind, Composable};
use crate::error::ContactError;
use crate::logger;
use crate::presentation::{scene, SceneCommand};

pub mod dispatch;
pub mod notifier;


pub use dispatch::{dispatch_contacts, notify, poll_detection, ContactEvent, ContactPhase, ContactQueue, ContactTracking};
pub use notifier::{ContactNotifier, ContactReceiver};

/// Contact groups (битовая маска): к чему принадлежит body.
pub struct ContactGroup;

impl ContactGroup {
    pub const PLAYER: u32 = 0b1;
    pub const MONSTER: u32 = 0b10;
    pub const COMPANION: u32 = 0b100;
    pub const ITEM: u32 = 0b1000;
    pub const PROJECTILE: u32 = 0b10000;
    pub const INTERACTABLE: u32 = 0b100000;
    pub const DEVICE: u32 = 0b1000000;

    /// Все живые акторы
    pub const ACTORS: u32 = Self::PLAYER | Self::MONSTER | Self::COMPANION;
}

/// Фильтр: какие contact groups замечает detection body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Interaction {
    pub contact_groups: u32,
}

impl Interaction {
    pub const NONE: Interaction = Interaction { contact_groups: 0 };

    pub fn new(contact_groups: u32) -> Self {
        Self { contact_groups }
    }

    pub fn actors() -> Self {
        Self::new(ContactGroup::ACTORS)
    }

    pub fn notices(&self, groups: u32) -> bool {
        self.contact_groups & groups != 0
    }
}

/// Detection body компонента: радиус, фильтр и текущие контакты.
///
/// Контакты меняются только пока field attached.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionField {
    pub radius: f32,
    interaction: Interaction,
    node_name: Option<String>,
    contacts: Vec<Entity>,
}

impl DetectionField {
    pub fn new(radius: f32, interaction: Interaction) -> Self {
        Self {
            radius,
            interaction,
            node_name: None,
            contacts: Vec::new(),
        }
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn is_attached(&self) -> bool {
        self.node_name.is_some()
    }

    pub fn node_name(&self) -> Option<&str> {
        self.node_name.as_deref()
    }

    pub fn contacts(&self) -> &[Entity] {
        &self.contacts
    }

    pub fn is_in_contact(&self, other: Entity) -> bool {
        self.contacts.contains(&other)
    }

    pub(crate) fn record_begin(&mut self, other: Entity) -> bool {
        if !self.is_attached() || self.contacts.contains(&other) {
            return false;
        }
        self.contacts.push(other);
        true
    }

    pub(crate) fn record_end(&mut self, other: Entity) -> bool {
        let before = self.contacts.len();
        self.contacts.retain(|e| *e != other);
        before != self.contacts.len()
    }
}

/// Компонент, получающий contact begin/end через ContactNotifier.
///
/// Запись контакта в field делает dispatcher; `contact_did_begin` /
/// `contact_did_end` вызываются только для реальных переходов.
pub trait Contactable: Composable + Component<Mutability = Mutable> {
    fn field(&self) -> &DetectionField;
    fn field_mut(&mut self) -> &mut DetectionField;

    fn contact_did_begin(_world: &mut World, _receiver: Entity, _other: Entity) {}
    fn contact_did_end(_world: &mut World, _receiver: Entity, _other: Entity) {}
}

/// Имя detection node: `<component-kind>:<entity-id>`.
pub fn node_name(kind: ComponentKind, entity_id: &str) -> String {
    format!("{}:{}", kind, entity_id)
}

/// Attach detection node: регистрация в notifier + addChild.
///
/// Ok(false): уже attached (или компонента нет), ничего не изменилось.
pub fn attach<C: Contactable>(world: &mut World, entity: Entity) -> Result<bool, ContactError> {
    let id = id_of(world, entity).ok_or_else(|| ContactError::MissingId(format!("{entity}")))?;
    let name = node_name(C::KIND, &id);

    let Some(component) = world.get::<C>(entity) else {
        return Ok(false);
    };
    if component.field().node_name() == Some(name.as_str()) {
        return Ok(false);
    }
    let contact_groups = component.field().interaction().contact_groups;

    if let Err(error) = world
        .get_resource_or_insert_with(ContactNotifier::default)
        .register(&name, ContactReceiver::of::<C>(entity))
    {
        logger::log_error(&format!("attach {}: {}", C::KIND, error));
        return Err(error);
    }

    if let Some(mut component) = world.get_mut::<C>(entity) {
        component.field_mut().node_name = Some(name.clone());
    }
    if let Some(mut node) = world.get_mut::<SceneNode>(entity) {
        if !node.has_child(&name) {
            node.children.push(name.clone());
        }
    }

    scene(
        world,
        SceneCommand::AddChild {
            parent: id,
            child: name.clone(),
        },
    );
    scene(
        world,
        SceneCommand::SetInteraction {
            node: name,
            contact_groups,
        },
    );
    Ok(true)
}

/// Detach detection node: снять регистрацию, забыть контакты, removeFromParent.
///
/// Повторный detach: no-op (false). Контакты очищаются без
/// `contact_did_end`: пока node detached, callbacks не вызываются.
pub fn detach<C: Contactable>(world: &mut World, entity: Entity) -> bool {
    if !is_alive(world, entity) {
        return false;
    }
    let Some(name) = world
        .get::<C>(entity)
        .and_then(|component| component.field().node_name().map(str::to_string))
    else {
        return false;
    };

    if let Some(mut notifier) = world.get_resource_mut::<ContactNotifier>() {
        notifier.deregister(&name);
    }
    if let Some(mut tracking) = world.get_resource_mut::<ContactTracking>() {
        tracking.forget(&name);
    }
    if let Some(mut component) = world.get_mut::<C>(entity) {
        let field = component.field_mut();
        field.node_name = None;
        field.contacts.clear();
    }
    if let Some(mut node) = world.get_mut::<SceneNode>(entity) {
        node.children.retain(|child| *child != name);
    }

    scene(world, SceneCommand::RemoveFromParent { node: name });
    true
}

/// Сменить фильтр detection body; attached body получает обновление сразу.
pub fn set_interaction<C: Contactable>(world: &mut World, entity: Entity, interaction: Interaction) -> bool {
    let node = {
        let Some(mut component) = world.get_mut::<C>(entity) else {
            return false;
        };
        let field = component.field_mut();
        if field.interaction == interaction {
            return false;
        }
        field.interaction = interaction;
        field.node_name.clone()
    };

    if let Some(node) = node {
        scene(
            world,
            SceneCommand::SetInteraction {
                node,
                contact_groups: interaction.contact_groups,
            },
        );
    }
    true
}

/// Живые контакты компонента (в порядке начала контакта).
pub fn contacts_of<C: Contactable>(world: &World, entity: Entity) -> Vec<Entity> {
    world
        .get::<C>(entity)
        .map(|component| {
            component
                .field()
                .contacts()
                .iter()
                .copied()
                .filter(|other| is_alive(world, *other))
                .collect()
        })
        .unwrap_or_default()
}
