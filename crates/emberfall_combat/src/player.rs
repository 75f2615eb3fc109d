//! Canonical player stats consumed by the combat system

use serde::{Deserialize, Serialize};

/// The player's canonical stat store.
///
/// The combat system reads stats from here every tick and writes damage and
/// experience back through it.
pub trait PlayerState: Send {
    fn health(&self) -> f32;
    fn max_health(&self) -> f32;
    fn strength(&self) -> f32;
    fn vitality(&self) -> f32;
    fn experience(&self) -> u32;
    fn take_damage(&mut self, amount: u32);
    fn add_experience(&mut self, amount: u32);
}

/// Default player stat store with level progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub health: f32,
    pub max_health: f32,
    pub strength: f32,
    pub vitality: f32,
    pub level: u32,
    /// Total experience earned
    pub experience: u32,
    /// Experience threshold for the next level
    pub next_level_at: u32,
}

impl PlayerStats {
    pub fn new(max_health: f32, strength: f32, vitality: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            strength,
            vitality,
            level: 1,
            experience: 0,
            next_level_at: 100,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    fn level_up(&mut self) {
        self.level += 1;
        self.next_level_at += self.level * 100;
        self.max_health += 10.0;
        self.strength += 1.0;
        self.vitality += 1.0;
        self.health = self.max_health;
        log::info!("Player reached level {}", self.level);
    }
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self::new(100.0, 5.0, 5.0)
    }
}

impl PlayerState for PlayerStats {
    fn health(&self) -> f32 {
        self.health
    }

    fn max_health(&self) -> f32 {
        self.max_health
    }

    fn strength(&self) -> f32 {
        self.strength
    }

    fn vitality(&self) -> f32 {
        self.vitality
    }

    fn experience(&self) -> u32 {
        self.experience
    }

    fn take_damage(&mut self, amount: u32) {
        self.health = (self.health - amount as f32).max(0.0);
    }

    fn add_experience(&mut self, amount: u32) {
        if !self.is_alive() {
            return;
        }
        self.experience = self.experience.saturating_add(amount);
        while self.experience >= self.next_level_at {
            self.level_up();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_damage_clamps() {
        let mut stats = PlayerStats::default();
        stats.take_damage(30);
        assert_eq!(stats.health, 70.0);
        stats.take_damage(500);
        assert_eq!(stats.health, 0.0);
        assert!(!stats.is_alive());
    }

    #[test]
    fn test_level_up() {
        let mut stats = PlayerStats::default();
        stats.add_experience(99);
        assert_eq!(stats.level, 1);

        stats.add_experience(1);
        assert_eq!(stats.level, 2);
        assert_eq!(stats.next_level_at, 300);
        assert_eq!(stats.max_health, 110.0);
        assert_eq!(stats.health, 110.0);

        // Skips multiple levels at once
        stats.add_experience(1000);
        assert_eq!(stats.experience, 1100);
        assert!(stats.level >= 4);
    }
}
