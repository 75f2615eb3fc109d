//! Emberfall Combat - Entity Registry, Damage, and Player Combat
//!
//! This crate provides the combat core of the Emberfall simulation.
//!
//! # Features
//!
//! - One authoritative registry of combat entities with range queries
//! - A single damage formula (defense mitigation, crit roll, variance)
//! - Cooldown and range gated attacks through one entry point
//! - Player sync from a canonical stat store, defend window, experience rewards
//! - Death handling and events on a shared [`EventBus`](emberfall_event::EventBus)
//!
//! # Example
//!
//! ```ignore
//! use emberfall_combat::prelude::*;
//!
//! let bus = Arc::new(EventBus::new());
//! let mut combat = CombatSystem::new(bus, Box::new(PlayerStats::default()));
//! combat.init_player(Vec3::ZERO);
//!
//! combat.register(CombatEntity::new("dummy", Vec3::X, 30.0))?;
//! let report = combat.player_attack();
//!
//! // Without an enemy system, drain deaths yourself
//! for entity in combat.take_defeated() {
//!     log::info!("{} is gone", entity.id);
//! }
//! ```

pub mod combat;
pub mod config;
pub mod damage;
pub mod events;
pub mod player;
pub mod random;
pub mod registry;

pub mod prelude {
    pub use crate::combat::{valid_delta, AttackReport, CombatSystem, PlayerCombatStats};
    pub use crate::config::{CombatConfig, ConfigError};
    pub use crate::damage::{DamageApplication, DamageOutcome, DamageResolver, DamageType};
    pub use crate::events::{AttackPerformed, DamageDealt, EntityDefeated, ExperienceAwarded, PlayerDied};
    pub use crate::player::{PlayerState, PlayerStats};
    pub use crate::random::{FixedRandom, RandomSource, SeededRandom, SequenceRandom, ThreadRandom};
    pub use crate::registry::{CombatEntity, EntityId, EntityRegistry, RegistryError, PLAYER_ID};
}

pub use prelude::*;
