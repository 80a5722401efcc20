//! EntityBlueprint: сборка entity с проверкой composition-инвариантов.
//!
//! Все обязательные sibling компоненты проверяются до spawn. Ошибка
//! сборки возвращается как `AssemblyError`, а не паника при первом
//! обращении к отсутствующему компоненту.

use bevy::ecs::world::EntityWorldMut;
use bevy::prelude::*;
use std::fmt;

use super::{id_of, is_alive, lookup, ChangeBus, ComponentKind, Composable, EntityId, EntityIndex};
use crate::error::AssemblyError;
use crate::logger;

type InsertFn = Box<dyn for<'w> FnOnce(&mut EntityWorldMut<'w>)>;
type AddHook = fn(&mut World, Entity) -> Result<(), AssemblyError>;
type RemoveHook = fn(&mut World, Entity);

#[derive(Clone, Copy)]
struct CompositionEntry {
    kind: ComponentKind,
    requires: &'static [ComponentKind],
    will_remove: RemoveHook,
}

/// Список composable компонентов entity (для detach hooks и проверок).
#[derive(Component, Default)]
pub struct Composition {
    entries: Vec<CompositionEntry>,
}

impl Composition {
    pub fn has(&self, kind: ComponentKind) -> bool {
        self.entries.iter().any(|entry| entry.kind == kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.entries.iter().map(|entry| entry.kind)
    }

    fn dependent_of(&self, kind: ComponentKind) -> Option<ComponentKind> {
        self.entries
            .iter()
            .find(|entry| entry.requires.contains(&kind))
            .map(|entry| entry.kind)
    }
}

impl fmt::Debug for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}

struct Part {
    kind: ComponentKind,
    requires: &'static [ComponentKind],
    insert: InsertFn,
    did_add: AddHook,
    will_remove: RemoveHook,
}

/// Builder entity: stable id + набор компонентов.
///
/// ```ignore
/// let goblin = EntityBlueprint::new("goblin-1")
///     .with(Health::new(30))
///     .with(Position::new(4.0, 0.0))
///     .with(Defense::new(0.1))
///     .with(Counter::new(Damage::new(4.0, DamageType::Physical), 0.5))
///     .spawn(world)?;
/// ```
pub struct EntityBlueprint {
    id: String,
    parts: Vec<Part>,
}

impl EntityBlueprint {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parts: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn with<C: Composable>(mut self, component: C) -> Self {
        self.parts.push(Part {
            kind: C::KIND,
            requires: C::REQUIRES,
            insert: Box::new(move |entity: &mut EntityWorldMut<'_>| {
                entity.insert(component);
            }),
            did_add: C::did_add_to_entity,
            will_remove: C::will_remove_from_entity,
        });
        self
    }

    pub fn has(&self, kind: ComponentKind) -> bool {
        self.parts.iter().any(|part| part.kind == kind)
    }

    /// Проверка composition-инвариантов без spawn.
    pub fn validate(&self) -> Result<(), AssemblyError> {
        for (index, part) in self.parts.iter().enumerate() {
            if self.parts[..index].iter().any(|other| other.kind == part.kind) {
                return Err(AssemblyError::DuplicateComponent {
                    entity: self.id.clone(),
                    component: part.kind,
                });
            }

            if let Some(missing) = part.requires.iter().find(|required| !self.has(**required)) {
                return Err(AssemblyError::MissingRequirement {
                    entity: self.id.clone(),
                    component: part.kind,
                    required: *missing,
                });
            }
        }
        Ok(())
    }

    /// Spawn: вставляет компоненты, регистрирует id, затем вызывает
    /// `did_add_to_entity` каждого компонента в порядке добавления.
    pub fn spawn(self, world: &mut World) -> Result<Entity, AssemblyError> {
        self.validate()?;

        if lookup(world, &self.id).is_some() {
            return Err(AssemblyError::DuplicateId(self.id));
        }

        let EntityBlueprint { id, parts } = self;
        let mut entries = Vec::with_capacity(parts.len());
        let mut hooks = Vec::with_capacity(parts.len());

        let mut entity_mut = world.spawn(EntityId(id.clone()));
        for part in parts {
            (part.insert)(&mut entity_mut);
            entries.push(CompositionEntry {
                kind: part.kind,
                requires: part.requires,
                will_remove: part.will_remove,
            });
            hooks.push(part.did_add);
        }
        let component_count = entries.len();
        entity_mut.insert(Composition { entries });
        let entity = entity_mut.id();

        world
            .get_resource_or_insert_with(EntityIndex::default)
            .insert(&id, entity);

        for hook in hooks {
            if let Err(error) = hook(world, entity) {
                logger::log_error(&format!("Failed to assemble '{}': {}", id, error));
                despawn_entity(world, entity);
                return Err(error);
            }
        }

        logger::log(&format!("Spawned '{}' ({} components)", id, component_count));
        Ok(entity)
    }
}

/// Добавить компонент к уже собранной entity (с теми же проверками).
pub fn add_component<C: Composable>(
    world: &mut World,
    entity: Entity,
    component: C,
) -> Result<(), AssemblyError> {
    if !is_alive(world, entity) {
        return Err(AssemblyError::MissingEntity(format!("{entity}")));
    }
    let name = id_of(world, entity).unwrap_or_else(|| format!("{entity}"));

    if let Some(composition) = world.get::<Composition>(entity) {
        if composition.has(C::KIND) {
            return Err(AssemblyError::DuplicateComponent {
                entity: name,
                component: C::KIND,
            });
        }
        if let Some(missing) = C::REQUIRES.iter().find(|required| !composition.has(**required)) {
            return Err(AssemblyError::MissingRequirement {
                entity: name,
                component: C::KIND,
                required: *missing,
            });
        }
    } else if let Some(missing) = C::REQUIRES.first() {
        return Err(AssemblyError::MissingRequirement {
            entity: name,
            component: C::KIND,
            required: *missing,
        });
    }

    let entry = CompositionEntry {
        kind: C::KIND,
        requires: C::REQUIRES,
        will_remove: C::will_remove_from_entity,
    };
    let mut entity_mut = world.entity_mut(entity);
    entity_mut.insert(component);
    match entity_mut.get_mut::<Composition>() {
        Some(mut composition) => composition.entries.push(entry),
        None => {
            entity_mut.insert(Composition {
                entries: vec![entry],
            });
        }
    }

    if let Err(error) = C::did_add_to_entity(world, entity) {
        logger::log_error(&format!("Failed to add {} to '{}': {}", C::KIND, name, error));
        // Откат: entity остаётся в состоянии до вызова
        let mut entity_mut = world.entity_mut(entity);
        entity_mut.remove::<C>();
        if let Some(mut composition) = entity_mut.get_mut::<Composition>() {
            composition.entries.retain(|entry| entry.kind != C::KIND);
        }
        return Err(error);
    }
    Ok(())
}

/// Удалить компонент. Отказ (false), если от него зависит другой компонент.
pub fn remove_component<C: Composable>(world: &mut World, entity: Entity) -> bool {
    let Some(composition) = world.get::<Composition>(entity) else {
        return false;
    };
    if !composition.has(C::KIND) {
        return false;
    }
    if let Some(dependent) = composition.dependent_of(C::KIND) {
        logger::log_warning(&format!(
            "Cannot remove {} from {}: required by {}",
            C::KIND,
            entity,
            dependent
        ));
        return false;
    }

    C::will_remove_from_entity(world, entity);

    let mut entity_mut = world.entity_mut(entity);
    entity_mut.remove::<C>();
    if let Some(mut composition) = entity_mut.get_mut::<Composition>() {
        composition.entries.retain(|entry| entry.kind != C::KIND);
    }
    true
}

/// Уничтожить entity: detach hooks (в обратном порядке), снять id и
/// observer-регистрации, despawn. Повторный вызов: no-op (false).
pub fn despawn_entity(world: &mut World, entity: Entity) -> bool {
    if !is_alive(world, entity) {
        return false;
    }

    let hooks: Vec<RemoveHook> = world
        .get::<Composition>(entity)
        .map(|composition| composition.entries.iter().map(|entry| entry.will_remove).collect())
        .unwrap_or_default();
    for hook in hooks.into_iter().rev() {
        hook(world, entity);
    }

    if let Some(id) = id_of(world, entity) {
        if let Some(mut index) = world.get_resource_mut::<EntityIndex>() {
            index.remove(&id, entity);
        }
        logger::log(&format!("Despawned '{}'", id));
    }
    if let Some(mut bus) = world.get_resource_mut::<ChangeBus>() {
        bus.forget(entity);
    }

    world.despawn(entity)
}
