//! Пространственные компоненты на detection fields: восприятие,
//! выбор цели, взаимодействие, подбор предметов, скрытность.

pub mod interaction;
pub mod perception;
pub mod pickup;
pub mod stealth;
pub mod targeting;

#[cfg(test)]
mod spatial_tests;

pub use interaction::{interact, Interactable, Interacted, Interactor};
pub use perception::{perceived, Perception};
pub use pickup::{pick_up, PickUp, Pickable};
pub use stealth::{is_hidden, update_stealth, Stealth};
pub use targeting::{set_target, target_of, update_targeting, Targeting};
