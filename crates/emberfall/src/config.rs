//! Whole-simulation configuration

use std::fs;
use std::path::Path;

use emberfall_ai::AiConfig;
use emberfall_combat::{CombatConfig, ConfigError};
use serde::{Deserialize, Serialize};

/// Combat and AI tunables plus an optional RNG seed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub combat: CombatConfig,
    pub ai: AiConfig,
    /// Seed for crit and variance rolls; unseeded when absent
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.combat.validate()?;
        self.ai.validate()
    }

    /// Set seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
