//! Hooks into whatever renders enemies

use crate::enemy::EnemyKind;
use emberfall_combat::EntityId;
use glam::Vec3;

/// Receives enemy visual lifecycle updates
pub trait SceneSink: Send {
    /// A renderable should appear for `id`
    fn attach(&mut self, id: &EntityId, kind: EnemyKind, position: Vec3);
    /// The renderable for `id` should be removed
    fn detach(&mut self, id: &EntityId);
    /// Mirror the simulated position
    fn sync_position(&mut self, id: &EntityId, position: Vec3);
}

/// Scene that renders nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullScene;

impl SceneSink for NullScene {
    fn attach(&mut self, _id: &EntityId, _kind: EnemyKind, _position: Vec3) {}
    fn detach(&mut self, _id: &EntityId) {}
    fn sync_position(&mut self, _id: &EntityId, _position: Vec3) {}
}
