//! Inventory: стаки предметов с ограничением по числу слотов.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{ItemCatalog, ItemId};
use crate::composable;
use crate::entity::{broadcast, ComponentKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: ItemId,
    pub quantity: u32,
}

/// Inventory (capacity = число стаков).
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub capacity: usize,
    stacks: Vec<ItemStack>,
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            stacks: Vec::new(),
        }
    }

    pub fn stacks(&self) -> &[ItemStack] {
        &self.stacks
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Все слоты заняты (в существующие стаки ещё можно доложить)
    pub fn is_full(&self) -> bool {
        self.stacks.len() >= self.capacity
    }

    pub fn count(&self, item: &ItemId) -> u32 {
        self.stacks
            .iter()
            .filter(|stack| stack.item == *item)
            .map(|stack| stack.quantity)
            .sum()
    }

    /// Сколько из `quantity` поместится.
    pub fn room_for(&self, item: &ItemId, quantity: u32, max_stack: u32) -> u32 {
        let max_stack = max_stack.max(1);
        let in_stacks: u32 = self
            .stacks
            .iter()
            .filter(|stack| stack.item == *item)
            .map(|stack| max_stack.saturating_sub(stack.quantity))
            .sum();
        let free_slots = self.capacity.saturating_sub(self.stacks.len()) as u32;
        quantity.min(in_stacks.saturating_add(free_slots.saturating_mul(max_stack)))
    }

    /// Добавить. Возвращает сколько реально добавлено (0: inventory full).
    pub fn add(&mut self, item: &ItemId, quantity: u32, max_stack: u32) -> u32 {
        let max_stack = max_stack.max(1);
        let mut remaining = quantity;

        for stack in self.stacks.iter_mut().filter(|stack| stack.item == *item) {
            let moved = remaining.min(max_stack.saturating_sub(stack.quantity));
            stack.quantity += moved;
            remaining -= moved;
        }
        while remaining > 0 && self.stacks.len() < self.capacity {
            let moved = remaining.min(max_stack);
            self.stacks.push(ItemStack {
                item: item.clone(),
                quantity: moved,
            });
            remaining -= moved;
        }
        quantity - remaining
    }

    /// Убрать (с последних стаков). Возвращает сколько реально убрано.
    pub fn remove(&mut self, item: &ItemId, quantity: u32) -> u32 {
        let mut remaining = quantity;
        for stack in self.stacks.iter_mut().rev().filter(|stack| stack.item == *item) {
            let moved = remaining.min(stack.quantity);
            stack.quantity -= moved;
            remaining -= moved;
            if remaining == 0 {
                break;
            }
        }
        self.stacks.retain(|stack| stack.quantity > 0);
        quantity - remaining
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(12)
    }
}

composable!(Inventory => Inventory);

/// Положить предмет в inventory entity (лимит стака из каталога).
pub fn give_item(world: &mut World, entity: Entity, item: &ItemId, quantity: u32) -> u32 {
    let max_stack = world
        .get_resource::<ItemCatalog>()
        .map_or(1, |catalog| catalog.max_stack(item));
    let added = match world.get_mut::<Inventory>(entity) {
        Some(mut inventory) => inventory.add(item, quantity, max_stack),
        None => return 0,
    };
    if added > 0 {
        broadcast(world, entity, ComponentKind::Inventory);
    }
    added
}

pub fn take_item(world: &mut World, entity: Entity, item: &ItemId, quantity: u32) -> u32 {
    let removed = match world.get_mut::<Inventory>(entity) {
        Some(mut inventory) => inventory.remove(item, quantity),
        None => return 0,
    };
    if removed > 0 {
        broadcast(world, entity, ComponentKind::Inventory);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gold() -> ItemId {
        "gold".into()
    }

    #[test]
    fn test_add_fills_stacks_then_slots() {
        let mut inventory = Inventory::new(2);
        assert_eq!(inventory.add(&gold(), 15, 10), 15);
        assert_eq!(inventory.stacks().len(), 2);
        assert_eq!(inventory.count(&gold()), 15);

        // Остаётся место только в неполном стаке
        assert_eq!(inventory.add(&gold(), 10, 10), 5);
        assert!(inventory.is_full());
        assert_eq!(inventory.add(&"sword".into(), 1, 1), 0);
    }

    #[test]
    fn test_room_for_matches_add() {
        let mut inventory = Inventory::new(1);
        inventory.add(&gold(), 7, 10);
        assert_eq!(inventory.room_for(&gold(), 5, 10), 3);
        assert_eq!(inventory.room_for(&"sword".into(), 1, 1), 0);
    }

    #[test]
    fn test_remove_drops_empty_stacks() {
        let mut inventory = Inventory::new(3);
        inventory.add(&gold(), 12, 10);
        assert_eq!(inventory.remove(&gold(), 4), 4);
        assert_eq!(inventory.count(&gold()), 8);
        assert_eq!(inventory.stacks().len(), 1);

        assert_eq!(inventory.remove(&gold(), 100), 8);
        assert!(inventory.is_empty());
    }
}
