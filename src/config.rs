//! Engine Configuration
//!
//! Built once at startup and passed by reference to everything that needs
//! tables or defaults. Nothing reads global state after construction.

use std::thread;

use crate::error::ConfigurationError;
use crate::game::tables::{Difficulty, TableRegistry};
use crate::stats::analysis::{AnalysisSettings, ExpectedSource, DEFAULT_BIAS_THRESHOLD_PCT};

/// Pin count assumed for rounds that do not state one.
pub const DEFAULT_PINS: u8 = 16;

/// Environment variable names.
pub mod env_keys {
    /// Default pin count.
    pub const DEFAULT_PINS: &str = "PLINKO_DEFAULT_PINS";
    /// Default difficulty.
    pub const DEFAULT_DIFFICULTY: &str = "PLINKO_DEFAULT_DIFFICULTY";
    /// Symmetry bias threshold in percentage points.
    pub const BIAS_THRESHOLD: &str = "PLINKO_BIAS_THRESHOLD";
    /// Simulation worker threads.
    pub const WORKERS: &str = "PLINKO_WORKERS";
}

/// Immutable engine configuration.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Validated probability/payout tables.
    pub registry: TableRegistry,
    /// Pin count for rounds without one.
    pub default_pins: u8,
    /// Difficulty for rounds without one.
    pub default_difficulty: Difficulty,
    /// Symmetry bias threshold in percentage points.
    pub bias_threshold_pct: f64,
    /// Simulation worker threads.
    pub workers: usize,
}

impl EngineConfig {
    /// Standard tables with the documented defaults (16 pins, medium).
    pub fn standard() -> Result<Self, ConfigurationError> {
        Self::with_registry(TableRegistry::standard()?)
    }

    /// Custom tables with the documented defaults.
    pub fn with_registry(registry: TableRegistry) -> Result<Self, ConfigurationError> {
        let config = Self {
            registry,
            default_pins: DEFAULT_PINS,
            default_difficulty: Difficulty::Medium,
            bias_threshold_pct: DEFAULT_BIAS_THRESHOLD_PCT,
            workers: default_workers(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Standard tables with environment overrides.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Standard tables with overrides from an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::standard()?;

        if let Some(value) = lookup(env_keys::DEFAULT_PINS) {
            config.default_pins = value.trim().parse().map_err(|_| ConfigurationError::InvalidSetting {
                key: env_keys::DEFAULT_PINS,
                value,
            })?;
        }
        if let Some(value) = lookup(env_keys::DEFAULT_DIFFICULTY) {
            config.default_difficulty = value.parse()?;
        }
        if let Some(value) = lookup(env_keys::BIAS_THRESHOLD) {
            config.bias_threshold_pct = value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .ok_or(ConfigurationError::InvalidSetting {
                    key: env_keys::BIAS_THRESHOLD,
                    value,
                })?;
        }
        if let Some(value) = lookup(env_keys::WORKERS) {
            config.workers = value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or(ConfigurationError::InvalidSetting {
                    key: env_keys::WORKERS,
                    value,
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Defaults must point at a registered table.
    fn validate(&self) -> Result<(), ConfigurationError> {
        self.registry.get(self.default_pins, self.default_difficulty)?;
        Ok(())
    }

    /// Analyzer settings for a given expected distribution.
    pub fn analysis_settings(&self, source: ExpectedSource) -> AnalysisSettings {
        AnalysisSettings {
            source,
            bias_threshold_pct: self.bias_threshold_pct,
        }
    }
}

fn default_workers() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_standard_defaults() {
        let config = EngineConfig::standard().unwrap();
        assert_eq!(config.default_pins, 16);
        assert_eq!(config.default_difficulty, Difficulty::Medium);
        assert_eq!(config.bias_threshold_pct, 3.0);
        assert!(config.workers >= 1);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            (env_keys::DEFAULT_PINS, "8"),
            (env_keys::DEFAULT_DIFFICULTY, "high"),
            (env_keys::BIAS_THRESHOLD, "5"),
            (env_keys::WORKERS, "3"),
        ]))
        .unwrap();

        assert_eq!(config.default_pins, 8);
        assert_eq!(config.default_difficulty, Difficulty::High);
        assert_eq!(config.bias_threshold_pct, 5.0);
        assert_eq!(config.workers, 3);
    }

    #[test]
    fn test_unsupported_default_pins() {
        let err = EngineConfig::from_lookup(lookup(&[(env_keys::DEFAULT_PINS, "10")])).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingTable { pins: 10, .. }));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            EngineConfig::from_lookup(lookup(&[(env_keys::WORKERS, "0")])),
            Err(ConfigurationError::InvalidSetting { .. })
        ));
        assert!(matches!(
            EngineConfig::from_lookup(lookup(&[(env_keys::BIAS_THRESHOLD, "-1")])),
            Err(ConfigurationError::InvalidSetting { .. })
        ));
        assert!(matches!(
            EngineConfig::from_lookup(lookup(&[(env_keys::DEFAULT_DIFFICULTY, "wild")])),
            Err(ConfigurationError::UnknownDifficulty(_))
        ));
    }
}
