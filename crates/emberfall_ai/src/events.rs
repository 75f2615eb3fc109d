//! Events emitted by the enemy system

use crate::enemy::{EnemyKind, EnemyRecord, EnemyState};
use emberfall_combat::EntityId;
use glam::Vec3;

#[derive(Debug, Clone, PartialEq)]
pub struct EnemySpawned {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub position: Vec3,
}

/// An idle enemy noticed the player and started chasing
#[derive(Debug, Clone, PartialEq)]
pub struct EnemyDetectedPlayer {
    pub id: EntityId,
    pub state: EnemyState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnemyAttack {
    pub enemy_id: EntityId,
    pub target_id: EntityId,
    pub damage: u32,
}

/// An enemy died; `record` is its final view with state `Dead`
#[derive(Debug, Clone, PartialEq)]
pub struct EnemyDefeated {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub level: u32,
    pub record: EnemyRecord,
}
