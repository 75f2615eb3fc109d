//! Damage types, outcomes, and the shared damage formula

use crate::config::CombatConfig;
use crate::random::RandomSource;
use crate::registry::{CombatEntity, EntityId};
use serde::{Deserialize, Serialize};

/// Types of damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DamageType {
    /// Melee and weapon hits
    #[default]
    Physical,
    /// Spells
    Magical,
    /// Fire, ice, lightning and similar
    Elemental,
}

/// Result of resolving one attack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageOutcome {
    /// Damage to subtract from the target (>= 1)
    pub amount: u32,
    /// Type of damage
    pub damage_type: DamageType,
    /// Entity that caused the damage
    pub source: EntityId,
    /// Whether the crit roll succeeded
    pub critical: bool,
}

impl DamageOutcome {
    /// Create a non-critical outcome; `amount` is raised to at least 1
    pub fn new(amount: u32, damage_type: DamageType, source: impl Into<EntityId>) -> Self {
        Self {
            amount: amount.max(1),
            damage_type,
            source: source.into(),
            critical: false,
        }
    }

    /// Mark as critical hit
    pub fn with_critical(mut self) -> Self {
        self.critical = true;
        self
    }

    /// Scale the amount, flooring and keeping the minimum of 1
    pub fn scaled(mut self, multiplier: f32) -> Self {
        self.amount = ((self.amount as f32 * multiplier).floor() as u32).max(1);
        self
    }
}

/// Whether a damage application killed its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageApplication {
    Survived,
    Died,
}

impl DamageApplication {
    pub fn is_lethal(self) -> bool {
        self == Self::Died
    }
}

/// The one damage formula used by every attack path
#[derive(Debug, Clone)]
pub struct DamageResolver {
    config: CombatConfig,
}

impl DamageResolver {
    pub fn new(config: CombatConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Fraction of damage removed by `defense`
    pub fn mitigation(&self, defense: f32) -> f32 {
        (defense.max(0.0) * self.config.defense_factor).min(self.config.max_reduction)
    }

    /// Resolve a physical attack.
    ///
    /// # Formula
    ///
    /// ```text
    /// base  = attack_power * (1 - min(defense * defense_factor, max_reduction))
    /// base *= crit_multiplier            if roll < crit_chance
    /// base *= 1 + (roll - 0.5) * variance
    /// amount = max(1, floor(base))
    /// ```
    ///
    /// Consumes exactly two rolls: crit first, then variance.
    pub fn resolve(
        &self,
        attacker: &CombatEntity,
        target: &CombatEntity,
        rng: &mut dyn RandomSource,
    ) -> DamageOutcome {
        let mut damage = attacker.attack_power.max(0.0);
        damage *= 1.0 - self.mitigation(target.defense);

        let critical = rng.roll() < self.config.crit_chance;
        if critical {
            damage *= self.config.crit_multiplier;
        }

        damage *= 1.0 + (rng.roll() - 0.5) * self.config.variance;

        let amount = (damage.floor() as u32).max(1);
        DamageOutcome {
            amount,
            damage_type: DamageType::Physical,
            source: attacker.id.clone(),
            critical,
        }
    }
}

impl Default for DamageResolver {
    fn default() -> Self {
        Self::new(CombatConfig::default())
    }
}
