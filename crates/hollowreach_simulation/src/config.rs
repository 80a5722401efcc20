//! Конфигурация симуляции (RON + defaults в коде).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::logger::LogLevel;

/// Глобальные параметры симуляции.
///
/// Все поля опциональны в RON файле, пропущенные берутся из `Default`.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed для `DeterministicRng`
    pub seed: u64,
    /// Частота FixedUpdate (Hz)
    pub tick_hz: f64,
    pub log_level: LogLevel,
    /// Множитель критического удара
    pub critical_multiplier: f32,
    /// Вместимость инвентаря по умолчанию (число стаков)
    pub inventory_capacity: usize,
    /// Порог опыта для уровня N: `experience_base * N^experience_growth`
    pub experience_base: f32,
    pub experience_growth: f32,
    pub skill_points_per_level: u32,
    pub max_skill_rank: u32,
    /// Сколько секунд мёртвый монстр лежит до despawn
    pub corpse_lifetime: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_hz: 60.0,
            log_level: LogLevel::Info,
            critical_multiplier: 2.0,
            inventory_capacity: 12,
            experience_base: 100.0,
            experience_growth: 1.5,
            skill_points_per_level: 1,
            max_skill_rank: 5,
            corpse_lifetime: 2.0,
        }
    }
}

impl SimulationConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        Self::from_ron_str(&contents)
    }

    /// Опыт, нужный для перехода с `level` на `level + 1`.
    pub fn experience_threshold(&self, level: u32) -> u32 {
        (self.experience_base * (level.max(1) as f32).powf(self.experience_growth)).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = SimulationConfig::from_ron_str("(seed: 7, inventory_capacity: 3)").unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.inventory_capacity, 3);
        assert_eq!(config.critical_multiplier, 2.0);
        assert_eq!(config.tick_hz, 60.0);
    }

    #[test]
    fn test_parse_error_reported() {
        let result = SimulationConfig::from_ron_str("(seed: \"nope\")");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_file_reported() {
        let result = SimulationConfig::load("does/not/exist.ron");
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_experience_threshold_grows() {
        let config = SimulationConfig::default();
        assert_eq!(config.experience_threshold(1), 100);
        assert!(config.experience_threshold(2) > config.experience_threshold(1));
        assert_eq!(config.experience_threshold(4), 800);
    }
}
