//! Процентные и плоские модификаторы боя.
//!
//! Каждый модификатор хранит незажатый аккумулятор и зажимает значение
//! только при чтении. Источники свободно добавляют и снимают вклад в
//! любом порядке, `is_*_lower_capped` / `is_*_upper_capped` сообщают о
//! насыщении.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{DamageType, Medium};
use crate::composable;

/// Незажатый аккумулятор с зажимом при чтении.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounded {
    raw: f32,
    min: f32,
    max: f32,
}

impl Bounded {
    pub fn new(raw: f32, min: f32, max: f32) -> Self {
        Self { raw, min, max }
    }

    pub fn value(&self) -> f32 {
        self.raw.clamp(self.min, self.max)
    }

    pub fn raw(&self) -> f32 {
        self.raw
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    pub fn modify(&mut self, by: f32) {
        self.raw += by;
    }

    pub fn is_lower_capped(&self) -> bool {
        self.raw <= self.min
    }

    pub fn is_upper_capped(&self) -> bool {
        self.raw >= self.max
    }
}

/// Шанс отразить физическую атаку, 0.0..=0.9
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defense {
    chance: Bounded,
}

impl Defense {
    pub const BOUNDS: (f32, f32) = (0.0, 0.9);

    pub fn new(chance: f32) -> Self {
        Self {
            chance: Bounded::new(chance, Self::BOUNDS.0, Self::BOUNDS.1),
        }
    }

    pub fn defense(&self) -> f32 {
        self.chance.value()
    }

    pub fn modify_defense(&mut self, by: f32) {
        self.chance.modify(by);
    }

    pub fn is_defense_lower_capped(&self) -> bool {
        self.chance.is_lower_capped()
    }

    pub fn is_defense_upper_capped(&self) -> bool {
        self.chance.is_upper_capped()
    }

    /// Успех, если бросок ниже шанса
    pub fn defend(&self, roll: f32) -> bool {
        roll < self.defense()
    }
}

composable!(Defense => Defense);

/// Шанс отразить заклинание, 0.0..=0.9
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resistance {
    chance: Bounded,
}

impl Resistance {
    pub const BOUNDS: (f32, f32) = (0.0, 0.9);

    pub fn new(chance: f32) -> Self {
        Self {
            chance: Bounded::new(chance, Self::BOUNDS.0, Self::BOUNDS.1),
        }
    }

    pub fn resistance(&self) -> f32 {
        self.chance.value()
    }

    pub fn modify_resistance(&mut self, by: f32) {
        self.chance.modify(by);
    }

    pub fn is_resistance_lower_capped(&self) -> bool {
        self.chance.is_lower_capped()
    }

    pub fn is_resistance_upper_capped(&self) -> bool {
        self.chance.is_upper_capped()
    }

    pub fn resist(&self, roll: f32) -> bool {
        roll < self.resistance()
    }
}

composable!(Resistance => Resistance);

/// Шанс крита: общий + по каналу доставки.
///
/// Оба слагаемых зажаты в 0..=1 независимо, сумма ограничена 1.0.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalHit {
    base: Bounded,
    per_medium: HashMap<Medium, Bounded>,
    pub multiplier: f32,
}

impl CriticalHit {
    pub const BOUNDS: (f32, f32) = (0.0, 1.0);

    pub fn new(base: f32) -> Self {
        Self {
            base: Bounded::new(base, Self::BOUNDS.0, Self::BOUNDS.1),
            per_medium: HashMap::new(),
            multiplier: 2.0,
        }
    }

    pub fn with_medium(mut self, medium: Medium, chance: f32) -> Self {
        self.modify_critical_chance_for(medium, chance);
        self
    }

    pub fn critical_chance(&self, medium: Medium) -> f32 {
        let bonus = self.per_medium.get(&medium).map_or(0.0, Bounded::value);
        (self.base.value() + bonus).min(Self::BOUNDS.1)
    }

    pub fn modify_critical_chance(&mut self, by: f32) {
        self.base.modify(by);
    }

    pub fn modify_critical_chance_for(&mut self, medium: Medium, by: f32) {
        self.per_medium
            .entry(medium)
            .or_insert_with(|| Bounded::new(0.0, Self::BOUNDS.0, Self::BOUNDS.1))
            .modify(by);
    }

    pub fn is_critical_lower_capped(&self, medium: Medium) -> bool {
        self.critical_chance(medium) <= Self::BOUNDS.0
    }

    pub fn is_critical_upper_capped(&self, medium: Medium) -> bool {
        self.critical_chance(medium) >= Self::BOUNDS.1
    }

    /// (крит?, итоговый урон). Крит при `roll` ниже шанса.
    pub fn apply_critical_to(&self, damage: f32, medium: Medium, roll: f32) -> (bool, f32) {
        if roll < self.critical_chance(medium) {
            (true, damage * self.multiplier)
        } else {
            (false, damage)
        }
    }
}

composable!(CriticalHit => CriticalHit);

/// Процентные поправки нанесённого и полученного урона.
///
/// `caused(type) = clamp(base + per_type, -1.0, 2.0)`; урон умножается
/// на `1 + caused`. Аналогично для taken.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageAdjustment {
    caused: f32,
    caused_by_type: HashMap<DamageType, f32>,
    taken: f32,
    taken_by_type: HashMap<DamageType, f32>,
}

impl DamageAdjustment {
    pub const BOUNDS: (f32, f32) = (-1.0, 2.0);

    pub fn new() -> Self {
        Self::default()
    }

    fn raw_caused(&self, damage_type: DamageType) -> f32 {
        self.caused + self.caused_by_type.get(&damage_type).copied().unwrap_or(0.0)
    }

    fn raw_taken(&self, damage_type: DamageType) -> f32 {
        self.taken + self.taken_by_type.get(&damage_type).copied().unwrap_or(0.0)
    }

    pub fn damage_caused(&self, damage_type: DamageType) -> f32 {
        self.raw_caused(damage_type).clamp(Self::BOUNDS.0, Self::BOUNDS.1)
    }

    pub fn damage_taken(&self, damage_type: DamageType) -> f32 {
        self.raw_taken(damage_type).clamp(Self::BOUNDS.0, Self::BOUNDS.1)
    }

    pub fn modify_damage_caused(&mut self, by: f32) {
        self.caused += by;
    }

    pub fn modify_damage_caused_for(&mut self, damage_type: DamageType, by: f32) {
        *self.caused_by_type.entry(damage_type).or_insert(0.0) += by;
    }

    pub fn modify_damage_taken(&mut self, by: f32) {
        self.taken += by;
    }

    pub fn modify_damage_taken_for(&mut self, damage_type: DamageType, by: f32) {
        *self.taken_by_type.entry(damage_type).or_insert(0.0) += by;
    }

    pub fn is_damage_caused_lower_capped(&self, damage_type: DamageType) -> bool {
        self.raw_caused(damage_type) <= Self::BOUNDS.0
    }

    pub fn is_damage_caused_upper_capped(&self, damage_type: DamageType) -> bool {
        self.raw_caused(damage_type) >= Self::BOUNDS.1
    }

    pub fn is_damage_taken_lower_capped(&self, damage_type: DamageType) -> bool {
        self.raw_taken(damage_type) <= Self::BOUNDS.0
    }

    pub fn is_damage_taken_upper_capped(&self, damage_type: DamageType) -> bool {
        self.raw_taken(damage_type) >= Self::BOUNDS.1
    }
}

composable!(DamageAdjustment => DamageAdjustment);

/// Плоское снижение урона: общее + по типу, не меньше 0.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mitigation {
    base: f32,
    by_type: HashMap<DamageType, f32>,
}

impl Mitigation {
    pub fn new(base: f32) -> Self {
        Self {
            base,
            by_type: HashMap::new(),
        }
    }

    fn raw(&self, damage_type: DamageType) -> f32 {
        self.base + self.by_type.get(&damage_type).copied().unwrap_or(0.0)
    }

    pub fn mitigation(&self, damage_type: DamageType) -> f32 {
        self.raw(damage_type).max(0.0)
    }

    pub fn modify_mitigation(&mut self, by: f32) {
        self.base += by;
    }

    pub fn modify_mitigation_for(&mut self, damage_type: DamageType, by: f32) {
        *self.by_type.entry(damage_type).or_insert(0.0) += by;
    }

    pub fn is_mitigation_lower_capped(&self, damage_type: DamageType) -> bool {
        self.raw(damage_type) <= 0.0
    }

    /// Урон после плоского снижения
    pub fn mitigate(&self, amount: f32, damage_type: DamageType) -> f32 {
        (amount - self.mitigation(damage_type)).max(0.0)
    }
}

composable!(Mitigation => Mitigation);

/// Бонус урона по цели с полным здоровьем.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstStrike {
    /// +50% = 0.5
    pub bonus: f32,
    /// Снимается с entity после первого срабатывания
    pub single_use: bool,
}

impl FirstStrike {
    pub fn new(bonus: f32, single_use: bool) -> Self {
        Self { bonus, single_use }
    }

    pub fn applies_to(&self, target_health_ratio: f32) -> bool {
        target_health_ratio >= 1.0
    }
}

composable!(FirstStrike => FirstStrike);

/// Бонус урона по раненой цели (здоровье ≤ threshold).
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishingStrike {
    pub bonus: f32,
    pub threshold: f32,
    pub single_use: bool,
}

impl FinishingStrike {
    pub fn new(bonus: f32, threshold: f32) -> Self {
        Self {
            bonus,
            threshold,
            single_use: false,
        }
    }

    pub fn applies_to(&self, target_health_ratio: f32) -> bool {
        target_health_ratio > 0.0 && target_health_ratio <= self.threshold
    }
}

composable!(FinishingStrike => FinishingStrike);

#[cfg(test)]
mod tests {
    use super::*;

    // Детерминированная "случайная" последовательность модификаций
    fn drift(steps: usize) -> impl Iterator<Item = f32> {
        (0..steps).map(|i| {
            let sign = if i % 3 == 0 { -1.0 } else { 1.0 };
            sign * (i as f32 * 0.37 % 1.3)
        })
    }

    #[test]
    fn test_defense_and_resistance_stay_in_bounds() {
        let mut defense = Defense::new(0.2);
        let mut resistance = Resistance::new(0.2);
        for by in drift(200) {
            defense.modify_defense(by);
            resistance.modify_resistance(-by);
            assert!((0.0..=0.9).contains(&defense.defense()));
            assert!((0.0..=0.9).contains(&resistance.resistance()));
        }

        let mut defense = Defense::new(0.2);
        defense.modify_defense(100.0);
        assert_eq!(defense.defense(), 0.9);
        assert!(defense.is_defense_upper_capped());
        defense.modify_defense(-100.0);
        // Накопленный вклад не потерян: возвращаемся к исходному raw
        assert!(!defense.is_defense_upper_capped());
        assert!((defense.defense() - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_defense_modifiers_order_independent() {
        let mut a = Defense::new(0.5);
        a.modify_defense(1.0);
        a.modify_defense(-0.7);

        let mut b = Defense::new(0.5);
        b.modify_defense(-0.7);
        b.modify_defense(1.0);

        assert!((a.defense() - b.defense()).abs() < 1e-6);
        assert!((a.defense() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_critical_chance_bounds() {
        let mut critical = CriticalHit::new(0.0);
        for by in drift(200) {
            critical.modify_critical_chance(by);
            critical.modify_critical_chance_for(Medium::Melee, by * 0.5);
            let chance = critical.critical_chance(Medium::Melee);
            assert!((0.0..=1.0).contains(&chance));
        }

        let mut critical = CriticalHit::new(0.8).with_medium(Medium::Melee, 5.0);
        assert_eq!(critical.critical_chance(Medium::Melee), 1.0);
        assert!(critical.is_critical_upper_capped(Medium::Melee));
        assert_eq!(critical.critical_chance(Medium::Spell), 0.8);

        critical.modify_critical_chance(-3.0);
        // Бонус канала зажат до 1.0 отдельно, общая часть до 0.0
        assert_eq!(critical.critical_chance(Medium::Melee), 1.0);
        assert_eq!(critical.critical_chance(Medium::Spell), 0.0);
        assert!(critical.is_critical_lower_capped(Medium::Spell));
    }

    #[test]
    fn test_apply_critical_to_forced_rolls() {
        let critical = CriticalHit::new(0.25).with_medium(Medium::Melee, 0.25);
        assert_eq!(critical.apply_critical_to(50.0, Medium::Melee, 0.0), (true, 100.0));
        assert_eq!(critical.apply_critical_to(50.0, Medium::Melee, 0.49), (true, 100.0));
        assert_eq!(critical.apply_critical_to(50.0, Medium::Melee, 0.51), (false, 50.0));
        // Для spell только общий шанс
        assert_eq!(critical.apply_critical_to(50.0, Medium::Spell, 0.3), (false, 50.0));
    }

    #[test]
    fn test_damage_adjustment_bounds() {
        let mut adjustment = DamageAdjustment::new();
        for by in drift(200) {
            adjustment.modify_damage_caused(by);
            adjustment.modify_damage_taken_for(DamageType::Fire, -by);
            for ty in [DamageType::Fire, DamageType::Physical] {
                assert!((-1.0..=2.0).contains(&adjustment.damage_caused(ty)));
                assert!((-1.0..=2.0).contains(&adjustment.damage_taken(ty)));
            }
        }
    }

    #[test]
    fn test_damage_adjustment_sums_base_and_type() {
        let mut adjustment = DamageAdjustment::new();
        adjustment.modify_damage_caused(0.5);
        adjustment.modify_damage_caused_for(DamageType::Fire, 2.0);

        assert_eq!(adjustment.damage_caused(DamageType::Physical), 0.5);
        assert_eq!(adjustment.damage_caused(DamageType::Fire), 2.0);
        assert!(adjustment.is_damage_caused_upper_capped(DamageType::Fire));

        adjustment.modify_damage_taken(-4.0);
        assert_eq!(adjustment.damage_taken(DamageType::Cold), -1.0);
        assert!(adjustment.is_damage_taken_lower_capped(DamageType::Cold));
    }

    #[test]
    fn test_mitigation_never_negative() {
        let mut mitigation = Mitigation::new(5.0);
        for by in drift(200) {
            mitigation.modify_mitigation(by);
            assert!(mitigation.mitigation(DamageType::Physical) >= 0.0);
        }

        let mut mitigation = Mitigation::new(5.0);
        mitigation.modify_mitigation_for(DamageType::Fire, -20.0);
        assert_eq!(mitigation.mitigation(DamageType::Fire), 0.0);
        assert!(mitigation.is_mitigation_lower_capped(DamageType::Fire));
        assert_eq!(mitigation.mitigate(12.0, DamageType::Physical), 7.0);
        assert_eq!(mitigation.mitigate(3.0, DamageType::Physical), 0.0);
    }

    #[test]
    fn test_strike_bonus_conditions() {
        let first = FirstStrike::new(0.5, true);
        assert!(first.applies_to(1.0));
        assert!(!first.applies_to(0.99));

        let finishing = FinishingStrike::new(1.0, 0.25);
        assert!(finishing.applies_to(0.25));
        assert!(!finishing.applies_to(0.5));
        assert!(!finishing.applies_to(0.0));
    }
}
