//! Perception: what an enemy knows about the player this tick

use crate::config::AiConfig;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Sensing radii for one enemy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SenseConfig {
    /// Noticing range
    pub detection_radius: f32,
    /// Give-up range
    pub lose_radius: f32,
    /// Reach
    pub attack_range: f32,
}

impl SenseConfig {
    pub fn new(config: &AiConfig, attack_range: f32) -> Self {
        Self {
            detection_radius: config.detection_radius,
            lose_radius: config.lose_target_radius,
            attack_range,
        }
    }
}

/// Transition context for the enemy state machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Perception {
    /// Distance to the player
    pub distance: f32,
    pub sense: SenseConfig,
}

impl Perception {
    /// Sense the player from `position`
    pub fn sense(position: Vec3, player_position: Vec3, sense: SenseConfig) -> Self {
        Self {
            distance: position.distance(player_position),
            sense,
        }
    }

    pub fn detects_player(&self) -> bool {
        self.distance <= self.sense.detection_radius
    }

    pub fn in_attack_range(&self) -> bool {
        self.distance <= self.sense.attack_range
    }

    pub fn lost_player(&self) -> bool {
        self.distance > self.sense.lose_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands() {
        let sense = SenseConfig::new(&AiConfig::default(), 2.0);

        let near = Perception::sense(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, sense);
        assert!(near.detects_player() && near.in_attack_range() && !near.lost_player());

        let mid = Perception::sense(Vec3::new(15.0, 0.0, 0.0), Vec3::ZERO, sense);
        assert!(mid.detects_player() && !mid.in_attack_range());

        let between = Perception::sense(Vec3::new(20.0, 0.0, 0.0), Vec3::ZERO, sense);
        assert!(!between.detects_player() && !between.lost_player());

        let far = Perception::sense(Vec3::new(0.0, 0.0, 30.0), Vec3::ZERO, sense);
        assert!(far.lost_player());
    }
}
