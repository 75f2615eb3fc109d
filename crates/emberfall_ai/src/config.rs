//! Enemy AI tunables

use emberfall_combat::ConfigError;
use serde::{Deserialize, Serialize};

/// Perception radii and level growth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Distance at which an idle enemy notices the player
    pub detection_radius: f32,
    /// Distance beyond which a pursuing enemy gives up
    pub lose_target_radius: f32,
    /// Health and max health growth per level above 1
    pub health_growth: f32,
    /// Attack power growth per level above 1
    pub attack_growth: f32,
    /// Defense growth per level above 1
    pub defense_growth: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            detection_radius: 15.0,
            lose_target_radius: 25.0,
            health_growth: 0.15,
            attack_growth: 0.15,
            defense_growth: 0.10,
        }
    }
}

impl AiConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("detection_radius", self.detection_radius),
            ("lose_target_radius", self.lose_target_radius),
            ("health_growth", self.health_growth),
            ("attack_growth", self.attack_growth),
            ("defense_growth", self.defense_growth),
        ];
        if let Some((field, _)) = fields.into_iter().find(|(_, value)| !value.is_finite()) {
            return Err(ConfigError::Invalid {
                field,
                reason: "must be finite",
            });
        }

        if self.detection_radius <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "detection_radius",
                reason: "must be positive",
            });
        }
        if self.lose_target_radius < self.detection_radius {
            return Err(ConfigError::Invalid {
                field: "lose_target_radius",
                reason: "must not be smaller than detection_radius",
            });
        }
        if self.health_growth <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "health_growth",
                reason: "health must grow with level",
            });
        }
        if self.attack_growth <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "attack_growth",
                reason: "attack must grow with level",
            });
        }
        if self.defense_growth < 0.0 {
            return Err(ConfigError::Invalid {
                field: "defense_growth",
                reason: "must not be negative",
            });
        }
        Ok(())
    }
}
