//! Базовые компоненты entity (actor, позиция, physics body, scene node).

pub mod actor;

pub use actor::*;
