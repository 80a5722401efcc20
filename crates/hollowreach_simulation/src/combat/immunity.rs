//! Immunity: вето на типы урона и условия.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::DamageType;
use crate::composable;

/// К чему может быть иммунитет. Тип урона и одноимённое условие
/// (Poison) попадают в одну категорию.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImmunityKind {
    Physical,
    Fire,
    Cold,
    Lightning,
    Poison,
    Arcane,
    Weakness,
    Vulnerability,
    Quell,
    Sleep,
}

impl From<DamageType> for ImmunityKind {
    fn from(damage_type: DamageType) -> Self {
        match damage_type {
            DamageType::Physical => ImmunityKind::Physical,
            DamageType::Fire => ImmunityKind::Fire,
            DamageType::Cold => ImmunityKind::Cold,
            DamageType::Lightning => ImmunityKind::Lightning,
            DamageType::Poison => ImmunityKind::Poison,
            DamageType::Arcane => ImmunityKind::Arcane,
        }
    }
}

#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct Immunity {
    pub immunities: HashSet<ImmunityKind>,
}

impl Immunity {
    pub fn new(immunities: impl IntoIterator<Item = ImmunityKind>) -> Self {
        Self {
            immunities: immunities.into_iter().collect(),
        }
    }

    pub fn is_immune_to(&self, kind: ImmunityKind) -> bool {
        self.immunities.contains(&kind)
    }

    pub fn is_immune_to_damage(&self, damage_type: DamageType) -> bool {
        self.is_immune_to(damage_type.into())
    }
}

composable!(Immunity => Immunity);
