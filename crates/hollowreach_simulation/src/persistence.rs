//! Entity records: плоская сериализуемая таблица компонентов entity.
//!
//! Формат файлов и слоты сохранений: забота внешнего слоя; здесь только
//! `capture` / `restore` и RON-представление одной записи.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{Faction, Health, Position};
use crate::entity::{add_component, broadcast, id_of, lookup, ComponentKind, Composable, Composition, EntityBlueprint};
use crate::error::{AssemblyError, RecordError};
use crate::logger;
use crate::progression::{apply_modifier, Equipment, Inventory, ItemCatalog, ItemModifier, Progression, Skills};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityRecord {
    pub id: String,
    pub health: Option<Health>,
    pub position: Option<[f32; 2]>,
    pub faction: Option<Faction>,
    pub progression: Option<Progression>,
    pub skills: Option<Skills>,
    pub inventory: Option<Inventory>,
    pub equipment: Option<Equipment>,
}

impl EntityRecord {
    pub fn to_ron(&self) -> Result<String, RecordError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    pub fn from_ron(source: &str) -> Result<Self, RecordError> {
        Ok(ron::from_str(source)?)
    }
}

/// Снять запись с entity. None: у entity нет stable id.
pub fn capture(world: &World, entity: Entity) -> Option<EntityRecord> {
    let id = id_of(world, entity)?;
    Some(EntityRecord {
        id,
        health: world.get::<Health>(entity).copied(),
        position: world.get::<Position>(entity).map(|position| position.0.to_array()),
        faction: world.get::<Faction>(entity).copied(),
        progression: world.get::<Progression>(entity).copied(),
        skills: world.get::<Skills>(entity).cloned(),
        inventory: world.get::<Inventory>(entity).cloned(),
        equipment: world.get::<Equipment>(entity).cloned(),
    })
}

/// Модификаторы от экипировки и навыков, кроме MaxHealth (он уже внутри
/// записанного Health).
fn granted_modifiers(world: &World, equipment: Option<&Equipment>, skills: Option<&Skills>) -> Vec<ItemModifier> {
    let mut modifiers = Vec::new();
    if let (Some(equipment), Some(catalog)) = (equipment, world.get_resource::<ItemCatalog>()) {
        for (_, item) in equipment.iter() {
            if let Some(definition) = catalog.get(item) {
                modifiers.extend(definition.modifiers.iter().cloned());
            }
        }
    }
    if let Some(skills) = skills {
        for (skill, rank) in skills.iter() {
            modifiers.extend(std::iter::repeat(skill.per_rank()).take(rank as usize));
        }
    }
    modifiers.retain(|modifier| !matches!(modifier, ItemModifier::MaxHealth(_)));
    modifiers
}

/// Восстановить запись. Живая entity с тем же id перезаписывается,
/// иначе собирается новая.
pub fn restore(world: &mut World, record: &EntityRecord) -> Result<Entity, RecordError> {
    match lookup(world, &record.id) {
        Some(entity) => {
            overwrite(world, entity, record)?;
            Ok(entity)
        }
        None => spawn(world, record),
    }
}

fn spawn(world: &mut World, record: &EntityRecord) -> Result<Entity, RecordError> {
    let mut blueprint = EntityBlueprint::new(record.id.clone());
    if let Some(health) = record.health {
        blueprint = blueprint.with(health);
    }
    if let Some([x, y]) = record.position {
        blueprint = blueprint.with(Position::new(x, y));
    }
    if let Some(faction) = record.faction {
        blueprint = blueprint.with(faction);
    }
    if let Some(progression) = record.progression {
        blueprint = blueprint.with(progression);
    }
    if let Some(skills) = &record.skills {
        blueprint = blueprint.with(skills.clone());
    }
    if let Some(inventory) = &record.inventory {
        blueprint = blueprint.with(inventory.clone());
    }
    if let Some(equipment) = &record.equipment {
        blueprint = blueprint.with(equipment.clone());
    }
    let entity = blueprint.spawn(world)?;
    logger::log(&format!("Restored '{}'", record.id));
    Ok(entity)
}

/// (kind, requires) компонентов, присутствующих в записи
fn record_parts(record: &EntityRecord) -> Vec<(ComponentKind, &'static [ComponentKind])> {
    let mut parts = Vec::new();
    if record.health.is_some() {
        parts.push((Health::KIND, Health::REQUIRES));
    }
    if record.position.is_some() {
        parts.push((Position::KIND, Position::REQUIRES));
    }
    if record.faction.is_some() {
        parts.push((Faction::KIND, Faction::REQUIRES));
    }
    if record.progression.is_some() {
        parts.push((Progression::KIND, Progression::REQUIRES));
    }
    if record.skills.is_some() {
        parts.push((Skills::KIND, Skills::REQUIRES));
    }
    if record.inventory.is_some() {
        parts.push((Inventory::KIND, Inventory::REQUIRES));
    }
    if record.equipment.is_some() {
        parts.push((Equipment::KIND, Equipment::REQUIRES));
    }
    parts
}

/// Проверка до записи: каждый новый компонент найдёт свои requires
/// либо на entity, либо в самой записи.
fn check_requirements(world: &World, entity: Entity, record: &EntityRecord) -> Result<(), AssemblyError> {
    let parts = record_parts(record);
    let present = |kind: ComponentKind| {
        parts.iter().any(|(part, _)| *part == kind)
            || world.get::<Composition>(entity).is_some_and(|composition| composition.has(kind))
    };
    for (kind, requires) in &parts {
        if let Some(missing) = requires.iter().find(|required| !present(**required)) {
            return Err(AssemblyError::MissingRequirement {
                entity: record.id.clone(),
                component: *kind,
                required: *missing,
            });
        }
    }
    Ok(())
}

/// Заменить компонент, если он уже в composition, иначе добавить
/// через `add_component` (запись в composition, hooks).
fn put<C: Composable>(world: &mut World, entity: Entity, component: C) -> Result<(), AssemblyError> {
    let present = world
        .get::<Composition>(entity)
        .is_some_and(|composition| composition.has(C::KIND));
    if present {
        world.entity_mut(entity).insert(component);
        Ok(())
    } else {
        add_component(world, entity, component)
    }
}

fn overwrite(world: &mut World, entity: Entity, record: &EntityRecord) -> Result<(), RecordError> {
    check_requirements(world, entity, record)?;

    // Модификаторы старой экипировки/навыков снимаются, новые накладываются
    let previous = granted_modifiers(world, world.get::<Equipment>(entity), world.get::<Skills>(entity));
    let next = granted_modifiers(world, record.equipment.as_ref(), record.skills.as_ref());
    for modifier in &previous {
        apply_modifier(world, entity, modifier, -1.0);
    }

    // Порядок: requires раньше зависимых (Progression → Skills, Inventory → Equipment)
    if let Some(health) = record.health {
        put(world, entity, health)?;
    }
    if let Some([x, y]) = record.position {
        put(world, entity, Position::new(x, y))?;
    }
    if let Some(faction) = record.faction {
        put(world, entity, faction)?;
    }
    if let Some(progression) = record.progression {
        put(world, entity, progression)?;
    }
    if let Some(skills) = &record.skills {
        put(world, entity, skills.clone())?;
    }
    if let Some(inventory) = &record.inventory {
        put(world, entity, inventory.clone())?;
    }
    if let Some(equipment) = &record.equipment {
        put(world, entity, equipment.clone())?;
    }

    for modifier in &next {
        apply_modifier(world, entity, modifier, 1.0);
    }
    for kind in [ComponentKind::Health, ComponentKind::Progression, ComponentKind::Inventory, ComponentKind::Equipment] {
        broadcast(world, entity, kind);
    }
    logger::log(&format!("Overwrote '{}' from record", record.id));
    Ok(())
}
