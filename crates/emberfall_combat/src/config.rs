//! Combat balance configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Value out of range
    #[error("Invalid config value '{field}': {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Tunables for damage resolution, rewards, and the player entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Chance of a critical hit per attack (0.0 - 1.0)
    pub crit_chance: f32,
    /// Damage multiplier on a critical hit
    pub crit_multiplier: f32,
    /// Total width of the symmetric damage jitter (0.2 = +/-10%)
    pub variance: f32,
    /// Mitigation per point of defense
    pub defense_factor: f32,
    /// Upper bound on mitigation
    pub max_reduction: f32,
    /// Experience per point of a defeated entity's max health
    pub xp_per_max_health: f32,
    /// Experience per point of a defeated entity's attack power
    pub xp_per_attack_power: f32,
    /// Player attack power before strength
    pub player_base_attack: f32,
    /// Attack power per point of strength
    pub attack_per_strength: f32,
    /// Defense per point of vitality
    pub defense_per_vitality: f32,
    /// Player reach in world units
    pub player_attack_range: f32,
    /// Seconds between player attacks
    pub player_attack_cooldown: f32,
    /// Incoming damage multiplier while defending
    pub defend_damage_multiplier: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            crit_chance: 0.1,
            crit_multiplier: 1.5,
            variance: 0.2,
            defense_factor: 0.1,
            max_reduction: 0.5,
            xp_per_max_health: 0.5,
            xp_per_attack_power: 0.3,
            player_base_attack: 10.0,
            attack_per_strength: 2.0,
            defense_per_vitality: 0.5,
            player_attack_range: 2.5,
            player_attack_cooldown: 0.8,
            defend_damage_multiplier: 0.5,
        }
    }
}

impl CombatConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break the damage invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("crit_chance", self.crit_chance),
            ("crit_multiplier", self.crit_multiplier),
            ("variance", self.variance),
            ("defense_factor", self.defense_factor),
            ("max_reduction", self.max_reduction),
            ("xp_per_max_health", self.xp_per_max_health),
            ("xp_per_attack_power", self.xp_per_attack_power),
            ("player_base_attack", self.player_base_attack),
            ("attack_per_strength", self.attack_per_strength),
            ("defense_per_vitality", self.defense_per_vitality),
            ("player_attack_range", self.player_attack_range),
            ("player_attack_cooldown", self.player_attack_cooldown),
            ("defend_damage_multiplier", self.defend_damage_multiplier),
        ];
        if let Some((field, _)) = fields.into_iter().find(|(_, value)| !value.is_finite()) {
            return Err(ConfigError::Invalid {
                field,
                reason: "must be finite",
            });
        }

        if !(0.0..=1.0).contains(&self.crit_chance) {
            return Err(ConfigError::Invalid {
                field: "crit_chance",
                reason: "must be within 0..=1",
            });
        }
        if self.crit_multiplier < 1.0 {
            return Err(ConfigError::Invalid {
                field: "crit_multiplier",
                reason: "must be at least 1",
            });
        }
        if !(0.0..=1.0).contains(&self.variance) {
            return Err(ConfigError::Invalid {
                field: "variance",
                reason: "must be within 0..=1",
            });
        }
        if !(0.0..1.0).contains(&self.max_reduction) {
            return Err(ConfigError::Invalid {
                field: "max_reduction",
                reason: "must be within 0..1",
            });
        }
        if self.player_attack_range <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "player_attack_range",
                reason: "must be positive",
            });
        }
        if self.player_attack_cooldown <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "player_attack_cooldown",
                reason: "must be positive",
            });
        }
        if !(0.0..=1.0).contains(&self.defend_damage_multiplier) {
            return Err(ConfigError::Invalid {
                field: "defend_damage_multiplier",
                reason: "must be within 0..=1",
            });
        }
        Ok(())
    }
}
