//! Damage / Healing спецификации: количество вычисляется в момент боя.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Канал доставки действия.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
pub enum Medium {
    Melee,
    Ranged,
    Spell,
    /// Без канала (реакции, окружение): не парируется и не резистится
    None,
}

impl Medium {
    /// На такой удар можно ответить контратакой
    pub fn is_counterable(&self) -> bool {
        matches!(self, Medium::Melee)
    }

    /// Отражается Defense (иначе Resistance)
    pub fn is_physical(&self) -> bool {
        matches!(self, Medium::Melee | Medium::Ranged)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
pub enum DamageType {
    Physical,
    Fire,
    Cold,
    Lightning,
    Poison,
    Arcane,
}

/// Спецификация урона.
///
/// Формула: `scale * (1 + ratio * (level - 1)) * modifier * spread`,
/// где `level`: фиксированный или уровень источника (Progression),
/// `spread = 1 ± variance` от броска.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Damage {
    pub scale: f32,
    pub ratio: f32,
    pub level: Option<u32>,
    pub damage_type: DamageType,
    /// Модификатор способности (1.0 = без изменений)
    pub modifier: f32,
    /// 0.0..1.0: разброс урона
    pub variance: f32,
}

impl Damage {
    pub fn new(scale: f32, damage_type: DamageType) -> Self {
        Self {
            scale,
            ratio: 0.0,
            level: None,
            damage_type,
            modifier: 1.0,
            variance: 0.0,
        }
    }

    pub fn with_ratio(mut self, ratio: f32) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn at_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_modifier(mut self, modifier: f32) -> Self {
        self.modifier = modifier;
        self
    }

    pub fn with_variance(mut self, variance: f32) -> Self {
        self.variance = variance.clamp(0.0, 1.0);
        self
    }

    /// Сырое количество урона для уровня источника и броска `roll ∈ [0, 1)`.
    pub fn resolve(&self, source_level: u32, roll: f32) -> f32 {
        let level = self.level.unwrap_or(source_level).max(1);
        let base = self.scale * (1.0 + self.ratio * (level - 1) as f32);
        let spread = 1.0 + self.variance * (roll * 2.0 - 1.0);
        (base * self.modifier * spread).max(0.0)
    }
}

/// Спецификация лечения (та же уровневая формула без разброса).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Healing {
    pub scale: f32,
    pub ratio: f32,
    pub level: Option<u32>,
}

impl Healing {
    pub fn new(scale: f32) -> Self {
        Self {
            scale,
            ratio: 0.0,
            level: None,
        }
    }

    pub fn with_ratio(mut self, ratio: f32) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn resolve(&self, source_level: u32) -> f32 {
        let level = self.level.unwrap_or(source_level).max(1);
        (self.scale * (1.0 + self.ratio * (level - 1) as f32)).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_scales_with_level() {
        let damage = Damage::new(10.0, DamageType::Physical).with_ratio(0.5);
        assert_eq!(damage.resolve(1, 0.5), 10.0);
        assert_eq!(damage.resolve(3, 0.5), 20.0);
        // Фиксированный уровень игнорирует уровень источника
        assert_eq!(damage.clone().at_level(1).resolve(9, 0.5), 10.0);
    }

    #[test]
    fn test_damage_variance_bounds() {
        let damage = Damage::new(10.0, DamageType::Fire).with_variance(0.2);
        assert_eq!(damage.resolve(1, 0.0), 8.0);
        assert_eq!(damage.resolve(1, 0.5), 10.0);
        assert!(damage.resolve(1, 0.999) < 12.0);
    }

    #[test]
    fn test_medium_classification() {
        assert!(Medium::Melee.is_counterable());
        assert!(!Medium::Ranged.is_counterable());
        assert!(Medium::Ranged.is_physical());
        assert!(!Medium::Spell.is_physical());
        assert!(!Medium::None.is_physical());
    }

    #[test]
    fn test_healing_resolve() {
        let healing = Healing::new(6.0).with_ratio(1.0);
        assert_eq!(healing.resolve(1), 6.0);
        assert_eq!(healing.resolve(2), 12.0);
    }
}
