//! Change bus: observer-регистрации и broadcast изменений компонентов.
//!
//! Вместо per-component weak-списков: один resource с регистрациями
//! `(observable, kind) → [observer]`. Broadcast пишет `ComponentChanged`
//! до возврата из мутирующего вызова. Список observers снимается
//! снапшотом перед доставкой, поэтому отписка во время доставки безопасна.
//! Observers, чья entity уже despawned, вычищаются лениво.

use bevy::prelude::*;
use std::collections::HashMap;

use super::{is_alive, ComponentKind, Composable};

/// Observable изменил состояние, `observer` подписан на него.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentChanged {
    pub observable: Entity,
    pub kind: ComponentKind,
    pub observer: Entity,
}

#[derive(Resource, Debug, Default)]
pub struct ChangeBus {
    observers: HashMap<(Entity, ComponentKind), Vec<Entity>>,
}

impl ChangeBus {
    /// Повторная регистрация того же observer: no-op.
    pub fn register(&mut self, observable: Entity, kind: ComponentKind, observer: Entity) {
        let list = self.observers.entry((observable, kind)).or_default();
        if !list.contains(&observer) {
            list.push(observer);
        }
    }

    pub fn remove(&mut self, observable: Entity, kind: ComponentKind, observer: Entity) -> bool {
        let Some(list) = self.observers.get_mut(&(observable, kind)) else {
            return false;
        };
        let before = list.len();
        list.retain(|e| *e != observer);
        let removed = list.len() != before;
        if list.is_empty() {
            self.observers.remove(&(observable, kind));
        }
        removed
    }

    /// Снапшот observers (копия, не ссылка на внутренний список).
    pub fn observers(&self, observable: Entity, kind: ComponentKind) -> Vec<Entity> {
        self.observers
            .get(&(observable, kind))
            .cloned()
            .unwrap_or_default()
    }

    /// Снять entity и как observable, и как observer.
    pub fn forget(&mut self, entity: Entity) {
        self.observers.retain(|(observable, _), list| {
            list.retain(|e| *e != entity);
            *observable != entity && !list.is_empty()
        });
    }

    fn prune(&mut self, observable: Entity, kind: ComponentKind, dead: &[Entity]) {
        if let Some(list) = self.observers.get_mut(&(observable, kind)) {
            list.retain(|e| !dead.contains(e));
            if list.is_empty() {
                self.observers.remove(&(observable, kind));
            }
        }
    }
}

/// Оповестить всех observers `(observable, kind)`. Возвращает число доставок.
pub fn broadcast(world: &mut World, observable: Entity, kind: ComponentKind) -> usize {
    let Some(bus) = world.get_resource::<ChangeBus>() else {
        return 0;
    };
    let snapshot = bus.observers(observable, kind);
    if snapshot.is_empty() {
        return 0;
    }

    let (live, dead): (Vec<Entity>, Vec<Entity>) =
        snapshot.into_iter().partition(|observer| is_alive(world, *observer));
    if !dead.is_empty() {
        world.resource_mut::<ChangeBus>().prune(observable, kind, &dead);
    }

    let delivered = live.len();
    for observer in live {
        world.send_event(ComponentChanged {
            observable,
            kind,
            observer,
        });
    }
    delivered
}

pub fn broadcast_of<C: Composable>(world: &mut World, observable: Entity) -> usize {
    broadcast(world, observable, C::KIND)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> World {
        let mut world = World::new();
        world.init_resource::<ChangeBus>();
        world.init_resource::<Events<ComponentChanged>>();
        world
    }

    fn delivered(world: &World) -> Vec<ComponentChanged> {
        world
            .resource::<Events<ComponentChanged>>()
            .iter_current_update_events()
            .copied()
            .collect()
    }

    #[test]
    fn test_broadcast_reaches_registered_observers() {
        let mut world = setup();
        let health_owner = world.spawn_empty().id();
        let hud = world.spawn_empty().id();
        let ai = world.spawn_empty().id();

        {
            let mut bus = world.resource_mut::<ChangeBus>();
            bus.register(health_owner, ComponentKind::Health, hud);
            bus.register(health_owner, ComponentKind::Health, ai);
            bus.register(health_owner, ComponentKind::Health, ai);
        }

        assert_eq!(broadcast(&mut world, health_owner, ComponentKind::Health), 2);
        let events = delivered(&world);
        assert_eq!(events.len(), 2);
        assert!(events.iter().any(|e| e.observer == hud));
        assert!(events.iter().any(|e| e.observer == ai));

        // Другой kind: никто не подписан
        assert_eq!(broadcast(&mut world, health_owner, ComponentKind::Defense), 0);
    }

    #[test]
    fn test_dead_observers_pruned_lazily() {
        let mut world = setup();
        let observable = world.spawn_empty().id();
        let gone = world.spawn_empty().id();
        let alive = world.spawn_empty().id();
        {
            let mut bus = world.resource_mut::<ChangeBus>();
            bus.register(observable, ComponentKind::Inventory, gone);
            bus.register(observable, ComponentKind::Inventory, alive);
        }
        world.despawn(gone);

        assert_eq!(broadcast(&mut world, observable, ComponentKind::Inventory), 1);
        let remaining = world
            .resource::<ChangeBus>()
            .observers(observable, ComponentKind::Inventory);
        assert_eq!(remaining, vec![alive]);
    }

    #[test]
    fn test_remove_and_forget() {
        let mut world = setup();
        let observable = world.spawn_empty().id();
        let observer = world.spawn_empty().id();
        let mut bus = world.resource_mut::<ChangeBus>();

        bus.register(observable, ComponentKind::Targeting, observer);
        assert!(bus.remove(observable, ComponentKind::Targeting, observer));
        assert!(!bus.remove(observable, ComponentKind::Targeting, observer));

        bus.register(observable, ComponentKind::Targeting, observer);
        bus.forget(observer);
        assert!(bus.observers(observable, ComponentKind::Targeting).is_empty());
    }
}
