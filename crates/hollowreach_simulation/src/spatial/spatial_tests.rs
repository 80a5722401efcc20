//! Tests for perception, targeting, interaction, pick-up and stealth.

use bevy::prelude::*;

use super::*;
use crate::combat::cause_damage;
use crate::components::{Body, Faction, Health, Position, SceneNode};
use crate::contact::{dispatch_contacts, poll_detection, ContactNotifier, ContactReceiver};
use crate::entity::{add_component, remove_component, ComponentKind, Composition, EntityBlueprint};
use crate::error::{AssemblyError, ContactError};
use crate::presentation::Notice;
use crate::progression::{Inventory, ItemId};

fn tick(world: &mut World) {
    poll_detection::<Perception>(world);
    poll_detection::<Interactor>(world);
    poll_detection::<PickUp>(world);
    poll_detection::<Stealth>(world);
    dispatch_contacts(world);
    update_stealth(world);
    update_targeting(world);
}

fn hero(world: &mut World) -> Entity {
    EntityBlueprint::new("hero")
        .with(Health::new(100))
        .with(Position::new(0.0, 0.0))
        .with(Body::player(0.5))
        .with(SceneNode::default())
        .with(Faction::PLAYER)
        .with(Perception::new(10.0))
        .with(Targeting::new(8.0))
        .spawn(world)
        .unwrap()
}

fn monster(world: &mut World, id: &str, x: f32, faction: Faction) -> Entity {
    EntityBlueprint::new(id)
        .with(Health::new(20))
        .with(Position::new(x, 0.0))
        .with(Body::monster(0.5))
        .with(faction)
        .spawn(world)
        .unwrap()
}

fn notices(world: &World) -> Vec<Notice> {
    world
        .resource::<Events<Notice>>()
        .iter_current_update_events()
        .cloned()
        .collect()
}

#[test]
fn test_targeting_picks_nearest_hostile() {
    let mut world = crate::testing::world();
    let hero = hero(&mut world);
    let _far = monster(&mut world, "far_rat", 6.0, Faction::MONSTERS);
    let near = monster(&mut world, "near_rat", 3.0, Faction::MONSTERS);
    let _friend = monster(&mut world, "dog", 1.0, Faction::PLAYER);

    tick(&mut world);
    assert_eq!(perceived(&world, hero).len(), 3);
    assert_eq!(target_of(&world, hero), Some(near));
}

#[test]
fn test_targeting_drops_dead_and_retargets() {
    let mut world = crate::testing::world();
    let hero = hero(&mut world);
    let far = monster(&mut world, "far_rat", 6.0, Faction::MONSTERS);
    let near = monster(&mut world, "near_rat", 3.0, Faction::MONSTERS);
    tick(&mut world);
    assert_eq!(target_of(&world, hero), Some(near));

    cause_damage(&mut world, near, 100, None);
    assert_eq!(target_of(&world, hero), None);

    tick(&mut world);
    assert_eq!(target_of(&world, hero), Some(far));
}

#[test]
fn test_targeting_respects_range() {
    let mut world = crate::testing::world();
    let hero = hero(&mut world);
    // Воспринимается (радиус 10), но дальше дистанции targeting (8)
    monster(&mut world, "lurker", 9.0, Faction::MONSTERS);

    tick(&mut world);
    assert_eq!(perceived(&world, hero).len(), 1);
    assert_eq!(target_of(&world, hero), None);
}

#[test]
fn test_targeting_skips_hidden() {
    let mut world = crate::testing::world();
    let hero = hero(&mut world);
    let thief = EntityBlueprint::new("thief")
        .with(Health::new(20))
        .with(Position::new(3.0, 0.0))
        .with(Body::monster(0.5))
        .with(SceneNode::default())
        .with(Faction::MONSTERS)
        .with(Stealth::new(1.0))
        .spawn(&mut world)
        .unwrap();

    tick(&mut world);
    assert!(is_hidden(&world, thief));
    assert_eq!(target_of(&world, hero), None);

    world.get_mut::<Position>(thief).unwrap().0 = Vec2::new(1.0, 0.0);
    tick(&mut world);
    assert!(!is_hidden(&world, thief));
    // Stealth пересчитан до targeting в том же тике
    assert_eq!(target_of(&world, hero), Some(thief));
}

#[test]
fn test_stealth_spotted_and_hidden_again() {
    let mut world = crate::testing::world();
    let thief = EntityBlueprint::new("thief")
        .with(Health::new(20))
        .with(Position::new(0.0, 0.0))
        .with(Body::player(0.5))
        .with(SceneNode::default())
        .with(Faction::PLAYER)
        .with(Stealth::new(4.0))
        .spawn(&mut world)
        .unwrap();
    let guard = monster(&mut world, "guard", 3.0, Faction::MONSTERS);

    tick(&mut world);
    assert!(!is_hidden(&world, thief));
    assert!(notices(&world).contains(&Notice::Note("Spotted!".into())));

    // Враг умер внутри поля: контакт остаётся, но скрытность возвращается
    cause_damage(&mut world, guard, 100, None);
    update_stealth(&mut world);
    assert!(is_hidden(&world, thief));
}

#[test]
fn test_interact_uses_nearest_and_exhausts() {
    let mut world = crate::testing::world();
    let hero = EntityBlueprint::new("hero")
        .with(Position::new(0.0, 0.0))
        .with(SceneNode::default())
        .with(Interactor::new(2.0))
        .spawn(&mut world)
        .unwrap();
    let lever = EntityBlueprint::new("lever")
        .with(Position::new(1.0, 0.0))
        .with(Body::new(0.2, crate::contact::ContactGroup::INTERACTABLE))
        .with(Interactable::new("Pull lever").with_uses(1))
        .spawn(&mut world)
        .unwrap();
    let _chest = EntityBlueprint::new("chest")
        .with(Position::new(2.0, 0.0))
        .with(Body::new(0.2, crate::contact::ContactGroup::INTERACTABLE))
        .with(Interactable::new("Open chest"))
        .spawn(&mut world)
        .unwrap();

    tick(&mut world);
    assert!(notices(&world).contains(&Notice::Note("Pull lever".into())));

    assert_eq!(interact(&mut world, hero), Some(lever));
    let events: Vec<Interacted> = world
        .resource::<Events<Interacted>>()
        .iter_current_update_events()
        .copied()
        .collect();
    assert_eq!(events, vec![Interacted { actor: hero, target: lever }]);

    // Рычаг исчерпан, следующим идёт сундук
    assert!(world.get::<Interactable>(lever).unwrap().is_exhausted());
    let chest = interact(&mut world, hero).unwrap();
    assert_ne!(chest, lever);
}

fn picker(world: &mut World, capacity: usize) -> Entity {
    EntityBlueprint::new("hero")
        .with(Position::new(0.0, 0.0))
        .with(SceneNode::default())
        .with(Inventory::new(capacity))
        .with(PickUp::new(1.0))
        .spawn(world)
        .unwrap()
}

fn loot(world: &mut World, id: &str, item: &str, quantity: u32) -> Entity {
    EntityBlueprint::new(id)
        .with(Position::new(0.5, 0.0))
        .with(Body::new(0.2, crate::contact::ContactGroup::ITEM))
        .with(Pickable::new(item, quantity))
        .spawn(world)
        .unwrap()
}

#[test]
fn test_pick_up_moves_item_and_despawns() {
    let mut world = crate::testing::world();
    let hero = picker(&mut world, 4);
    let coins = loot(&mut world, "coins", "gold", 25);

    tick(&mut world);
    let inventory = world.get::<Inventory>(hero).unwrap();
    assert_eq!(inventory.count(&ItemId::from("gold")), 25);
    assert!(world.get_entity(coins).is_err());
    assert!(notices(&world)
        .iter()
        .any(|notice| matches!(notice, Notice::PickUp(label) if label.contains("x25"))));
}

#[test]
fn test_pick_up_full_inventory_leaves_item() {
    let mut world = crate::testing::world();
    let hero = picker(&mut world, 1);
    crate::progression::give_item(&mut world, hero, &ItemId::from("short_sword"), 1);
    let armor = loot(&mut world, "armor", "leather_armor", 1);

    tick(&mut world);
    assert!(notices(&world).contains(&Notice::Note("Inventory full".into())));
    assert_eq!(world.get::<Pickable>(armor).unwrap().quantity, 1);
    assert_eq!(world.get::<Inventory>(hero).unwrap().count(&ItemId::from("leather_armor")), 0);
}

#[test]
fn test_perception_reattach_restores_single_registration() {
    let mut world = crate::testing::world();
    let watcher = EntityBlueprint::new("watcher")
        .with(Position::new(0.0, 0.0))
        .with(SceneNode::default())
        .with(Perception::new(5.0))
        .spawn(&mut world)
        .unwrap();
    assert!(world.resource::<ContactNotifier>().is_registered("perception:watcher"));

    assert!(remove_component::<Perception>(&mut world, watcher));
    assert!(!world.resource::<ContactNotifier>().is_registered("perception:watcher"));

    add_component(&mut world, watcher, Perception::new(5.0)).unwrap();
    let notifier = world.resource::<ContactNotifier>();
    assert!(notifier.is_registered("perception:watcher"));
    assert_eq!(notifier.registrations_of(watcher), 1);
    assert_eq!(world.get::<SceneNode>(watcher).unwrap().children, vec!["perception:watcher".to_string()]);
}

#[test]
fn test_failed_attach_rolls_back_added_component() {
    let mut world = crate::testing::world();
    let watcher = EntityBlueprint::new("watcher")
        .with(Position::new(0.0, 0.0))
        .with(SceneNode::default())
        .spawn(&mut world)
        .unwrap();
    let squatter = world.spawn_empty().id();
    world
        .resource_mut::<ContactNotifier>()
        .register("perception:watcher", ContactReceiver::of::<Perception>(squatter))
        .unwrap();

    let result = add_component(&mut world, watcher, Perception::new(5.0));
    assert!(matches!(result, Err(AssemblyError::Contact(ContactError::NameTaken(_)))));
    assert!(world.get::<Perception>(watcher).is_none());
    assert!(!world.get::<Composition>(watcher).unwrap().has(ComponentKind::Perception));
    assert!(world.get::<SceneNode>(watcher).unwrap().children.is_empty());

    // Имя освободилось: повторная попытка проходит с чистого листа
    world.resource_mut::<ContactNotifier>().deregister("perception:watcher");
    add_component(&mut world, watcher, Perception::new(5.0)).unwrap();
    assert_eq!(world.resource::<ContactNotifier>().registrations_of(watcher), 1);
}
