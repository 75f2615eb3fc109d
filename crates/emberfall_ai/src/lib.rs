//! Emberfall AI - Enemy Behavior
//!
//! This crate drives every spawned enemy through an idle / chasing /
//! attacking / dead state machine each tick.
//!
//! # Features
//!
//! - Guarded finite state machine with prioritized and global transitions
//! - Closed set of enemy kinds with a base-stat table and level scaling
//! - Distance-band perception (detect, attack, lose target)
//! - Seek steering toward the player
//! - Enemy attacks routed through the shared combat pipeline
//!
//! # Example
//!
//! ```ignore
//! use emberfall_ai::prelude::*;
//!
//! let mut enemies = EnemySystem::new(bus.clone());
//! let goblin = enemies.spawn(EnemyKind::Goblin, Vec3::new(10.0, 0.0, 10.0), 1, &mut combat)?;
//!
//! // Each frame, after combat.update(dt, Some(player_pos))
//! enemies.update(dt, Some(player_pos), &mut combat);
//! ```

pub mod config;
pub mod enemy;
pub mod events;
pub mod perception;
pub mod scene;
pub mod state_machine;
pub mod steering;
pub mod system;

pub mod prelude {
    pub use crate::config::AiConfig;
    pub use crate::enemy::{enemy_state_machine, BaseStats, EnemyKind, EnemyRecord, EnemyState, UnknownKind};
    pub use crate::events::{EnemyAttack, EnemyDefeated, EnemyDetectedPlayer, EnemySpawned};
    pub use crate::perception::{Perception, SenseConfig};
    pub use crate::scene::{NullScene, SceneSink};
    pub use crate::state_machine::{Guard, State, StateMachine, Transition};
    pub use crate::steering::{seek, SteeringOutput};
    pub use crate::system::{EnemySystem, SpawnError};
}

pub use prelude::*;
