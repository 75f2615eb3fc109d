//! Events emitted by the combat system

use crate::damage::DamageOutcome;
use crate::registry::{CombatEntity, EntityId};

/// Damage landed on an entity
#[derive(Debug, Clone, PartialEq)]
pub struct DamageDealt {
    pub target: EntityId,
    pub outcome: DamageOutcome,
}

/// An attack passed its cooldown and range checks and hit
#[derive(Debug, Clone, PartialEq)]
pub struct AttackPerformed {
    pub attacker: EntityId,
    pub target: EntityId,
    pub damage: u32,
}

/// A non-player entity reached zero health and left the registry
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDefeated {
    pub id: EntityId,
    /// Final state of the entity
    pub entity: CombatEntity,
}

/// Experience granted to the player
#[derive(Debug, Clone, PartialEq)]
pub struct ExperienceAwarded {
    pub amount: u32,
    /// Entity whose defeat earned it
    pub source: EntityId,
}

/// The player reached zero health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerDied;
