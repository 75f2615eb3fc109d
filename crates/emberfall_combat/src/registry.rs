//! Entity registry: the authoritative store of live combat entities

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Id of the single player entity
pub const PLAYER_ID: &str = "player";

/// Unique identifier of a combat entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    /// Create an id from any string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The player's id
    pub fn player() -> Self {
        Self(PLAYER_ID.to_string())
    }

    /// Whether this is the player's id
    pub fn is_player(&self) -> bool {
        self.0 == PLAYER_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Registry errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Id already in use by a live entity
    #[error("Entity '{0}' is already registered")]
    DuplicateEntity(EntityId),
    /// Id not registered
    #[error("Entity '{0}' not found")]
    NotFound(EntityId),
}

/// Combat attributes of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatEntity {
    /// Unique identifier
    pub id: EntityId,
    /// World-space position
    pub position: Vec3,
    /// Current health (0..=max_health)
    pub health: f32,
    /// Maximum health
    pub max_health: f32,
    /// Damage before mitigation
    pub attack_power: f32,
    /// Mitigation stat
    pub defense: f32,
    /// Reach in world units
    pub attack_range: f32,
    /// Seconds between attacks
    pub attack_cooldown: f32,
    /// Remaining cooldown in seconds (0 = ready)
    pub last_attack_time: f32,
    /// Whether this is the player
    pub is_player: bool,
}

impl CombatEntity {
    /// Create an entity at full health with no cooldown pending
    pub fn new(id: impl Into<EntityId>, position: Vec3, max_health: f32) -> Self {
        let id = id.into();
        let max_health = max_health.max(0.0);
        Self {
            is_player: id.is_player(),
            id,
            position,
            health: max_health,
            max_health,
            attack_power: 0.0,
            defense: 0.0,
            attack_range: 1.0,
            attack_cooldown: 1.0,
            last_attack_time: 0.0,
        }
    }

    /// Set attack power
    pub fn with_attack(mut self, attack_power: f32) -> Self {
        self.attack_power = attack_power.max(0.0);
        self
    }

    /// Set defense
    pub fn with_defense(mut self, defense: f32) -> Self {
        self.defense = defense.max(0.0);
        self
    }

    /// Set attack range and cooldown
    pub fn with_reach(mut self, attack_range: f32, attack_cooldown: f32) -> Self {
        self.attack_range = attack_range;
        self.attack_cooldown = attack_cooldown;
        self
    }

    /// Subtract damage, clamped at zero. Returns true if this hit was lethal.
    ///
    /// An entity already at zero takes nothing and reports false.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.health = (self.health - amount.max(0.0)).max(0.0);
        self.health <= 0.0
    }

    /// Set health directly (clamped to 0..max)
    pub fn set_health(&mut self, health: f32) {
        self.health = health.clamp(0.0, self.max_health);
    }

    /// Count the cooldown down by `delta_time`, floored at zero
    pub fn tick_cooldown(&mut self, delta_time: f32) {
        self.last_attack_time = (self.last_attack_time - delta_time).max(0.0);
    }

    /// Whether the attack cooldown has elapsed
    pub fn can_attack(&self) -> bool {
        self.is_alive() && self.last_attack_time <= 0.0
    }

    /// Restart the attack cooldown
    pub fn reset_cooldown(&mut self) {
        self.last_attack_time = self.attack_cooldown;
    }

    /// Check if alive
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Get health as a percentage (0.0 - 1.0)
    pub fn health_percent(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        self.health / self.max_health
    }

    /// Euclidean distance to a point
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }

    /// Whether `other` is within this entity's attack range
    pub fn in_range_of(&self, other: &CombatEntity) -> bool {
        self.distance_to(other.position) <= self.attack_range
    }
}

/// Map of entity id to combat attributes
#[derive(Debug, Default, Clone)]
pub struct EntityRegistry {
    entities: HashMap<EntityId, CombatEntity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &EntityId) -> Option<&CombatEntity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut CombatEntity> {
        self.entities.get_mut(id)
    }

    /// Insert or replace an entity
    pub fn upsert(&mut self, entity: CombatEntity) {
        self.entities.insert(entity.id.clone(), entity);
    }

    /// Insert an entity whose id is not yet registered
    pub fn insert_new(&mut self, entity: CombatEntity) -> Result<(), RegistryError> {
        if self.entities.contains_key(&entity.id) {
            return Err(RegistryError::DuplicateEntity(entity.id));
        }
        self.upsert(entity);
        Ok(())
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<CombatEntity> {
        self.entities.remove(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Living entities within `radius` of `origin` (inclusive)
    pub fn query_in_range(&self, origin: Vec3, radius: f32) -> Vec<&CombatEntity> {
        self.living()
            .filter(|entity| entity.distance_to(origin) <= radius)
            .collect()
    }

    /// Nearest living entity within `radius` that passes `filter`
    pub fn nearest_in_range<F>(&self, origin: Vec3, radius: f32, filter: F) -> Option<&CombatEntity>
    where
        F: Fn(&CombatEntity) -> bool,
    {
        self.query_in_range(origin, radius)
            .into_iter()
            .filter(|entity| filter(entity))
            .min_by(|a, b| a.distance_to(origin).total_cmp(&b.distance_to(origin)))
    }

    /// Iterate over living entities
    pub fn living(&self) -> impl Iterator<Item = &CombatEntity> {
        self.entities.values().filter(|entity| entity.is_alive())
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut CombatEntity> {
        self.entities.values_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.keys()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
