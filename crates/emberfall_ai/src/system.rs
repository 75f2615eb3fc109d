//! Enemy system: spawning, per-tick AI, and enemy death handling
//!
//! Combat numbers (health, position, cooldowns) live in the
//! [`CombatSystem`]'s registry; this system keeps only the enemy-specific
//! data and drives every enemy's state machine against it.

use std::collections::BTreeMap;
use std::sync::Arc;

use emberfall_combat::{
    valid_delta, CombatEntity, CombatSystem, DamageApplication, DamageOutcome, DamageType, EntityId,
    RegistryError,
};
use emberfall_event::EventBus;
use glam::Vec3;
use thiserror::Error;

use crate::config::AiConfig;
use crate::enemy::{EnemyBrain, EnemyKind, EnemyRecord, EnemyState};
use crate::events::{EnemyAttack, EnemyDefeated, EnemyDetectedPlayer, EnemySpawned};
use crate::perception::{Perception, SenseConfig};
use crate::scene::{NullScene, SceneSink};
use crate::steering;

/// Spawn failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpawnError {
    #[error("Unknown enemy kind '{0}'")]
    UnknownKind(String),
    #[error("Enemy level must be at least 1, got {0}")]
    InvalidLevel(u32),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Owner of every spawned enemy's AI
pub struct EnemySystem {
    enemies: BTreeMap<EntityId, EnemyBrain>,
    config: AiConfig,
    bus: Arc<EventBus>,
    scene: Box<dyn SceneSink>,
    next_id: u64,
}

impl EnemySystem {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            enemies: BTreeMap::new(),
            config: AiConfig::default(),
            bus,
            scene: Box::new(NullScene),
            next_id: 1,
        }
    }

    /// Set AI config
    pub fn with_config(mut self, config: AiConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the scene that mirrors enemy visuals
    pub fn with_scene(mut self, scene: Box<dyn SceneSink>) -> Self {
        self.scene = scene;
        self
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    /// Spawn an enemy by kind name, e.g. `"goblin"`
    pub fn spawn_named(
        &mut self,
        kind: &str,
        position: Vec3,
        level: u32,
        combat: &mut CombatSystem,
    ) -> Result<EntityId, SpawnError> {
        match kind.parse::<EnemyKind>() {
            Ok(kind) => self.spawn(kind, position, level, combat),
            Err(unknown) => {
                log::warn!("Cannot spawn unknown enemy kind '{}'", unknown.0);
                Err(SpawnError::UnknownKind(unknown.0))
            }
        }
    }

    /// Spawn an enemy of `kind` at `level` and register it for combat
    pub fn spawn(
        &mut self,
        kind: EnemyKind,
        position: Vec3,
        level: u32,
        combat: &mut CombatSystem,
    ) -> Result<EntityId, SpawnError> {
        if level == 0 {
            log::warn!("Cannot spawn {} at level 0", kind);
            return Err(SpawnError::InvalidLevel(level));
        }

        let stats = kind.base_stats().at_level(level, &self.config);
        let id = self.allocate_id(kind, combat);
        let entity = CombatEntity::new(id.clone(), position, stats.health)
            .with_attack(stats.attack_power)
            .with_defense(stats.defense)
            .with_reach(stats.attack_range, stats.attack_cooldown);
        combat.register(entity)?;

        self.enemies
            .insert(id.clone(), EnemyBrain::new(kind, level, stats.speed));
        self.scene.attach(&id, kind, position);
        log::debug!("Spawned {} (level {}) at {:?}", id, level, position);

        self.bus.emit(&EnemySpawned {
            id: id.clone(),
            kind,
            position,
        });
        Ok(id)
    }

    fn allocate_id(&mut self, kind: EnemyKind, combat: &CombatSystem) -> EntityId {
        loop {
            let id = EntityId::new(format!("{}_{}", kind, self.next_id));
            self.next_id += 1;
            if !combat.registry().contains(&id) && !self.enemies.contains_key(&id) {
                return id;
            }
        }
    }

    /// Run one AI tick for every enemy.
    ///
    /// Without a player position only bookkeeping runs. Cooldowns are counted
    /// down by [`CombatSystem::update`], which must run first in the same tick.
    /// Returns false (and changes nothing) for a negative or NaN `delta_time`.
    pub fn update(
        &mut self,
        delta_time: f32,
        player_position: Option<Vec3>,
        combat: &mut CombatSystem,
    ) -> bool {
        if !valid_delta(delta_time) {
            log::warn!("Ignoring enemy update with invalid delta time {}", delta_time);
            return false;
        }

        // Deaths from direct combat calls must be reported before stale brains are dropped
        self.collect_defeated(combat);
        self.drop_stale(combat);

        let ids: Vec<EntityId> = self.enemies.keys().cloned().collect();
        for id in ids {
            if let Some(player_position) = player_position {
                self.think(&id, delta_time, player_position, combat);
            }
            if let Some(entity) = combat.registry().get(&id) {
                self.scene.sync_position(&id, entity.position);
            }
        }

        self.collect_defeated(combat);
        true
    }

    fn think(&mut self, id: &EntityId, delta_time: f32, player_position: Vec3, combat: &mut CombatSystem) {
        let Some(entity) = combat.registry().get(id) else {
            return;
        };
        if !entity.is_alive() {
            return;
        }
        let Some(brain) = self.enemies.get_mut(id) else {
            return;
        };

        let position = entity.position;
        let sense = SenseConfig::new(&self.config, entity.attack_range);
        let perception = Perception::sense(position, player_position, sense);
        let player_id = combat.player_id().clone();

        let previous = brain.state();
        if let Some(next) = brain.fsm.update(&perception, delta_time) {
            log::debug!("{} {:?} -> {:?} at distance {:.2}", id, previous, next, perception.distance);
            match next {
                EnemyState::Chasing if !previous.is_engaged() => {
                    brain.target = Some(player_id);
                    self.bus.emit(&EnemyDetectedPlayer {
                        id: id.clone(),
                        state: next,
                    });
                }
                EnemyState::Idle | EnemyState::Patrolling => brain.target = None,
                _ => {}
            }
            return;
        }

        match brain.state() {
            EnemyState::Chasing => {
                let step = steering::seek(position, player_position, brain.speed * delta_time);
                if let Some(entity) = combat.registry_mut().get_mut(id) {
                    entity.position += step.linear;
                }
            }
            EnemyState::Attacking => {
                let target = brain.target.clone().unwrap_or(player_id);
                if let Some(report) = combat.attempt_attack(id, &target) {
                    self.bus.emit(&EnemyAttack {
                        enemy_id: id.clone(),
                        target_id: target,
                        damage: report.outcome.amount,
                    });
                }
            }
            _ => {}
        }
    }

    /// Apply `amount` physical damage from the player to an enemy.
    ///
    /// Returns `None` for unknown or dead enemies.
    pub fn damage_enemy(
        &mut self,
        id: &EntityId,
        amount: u32,
        combat: &mut CombatSystem,
    ) -> Option<DamageApplication> {
        if !self.enemies.contains_key(id) {
            return None;
        }
        let outcome = DamageOutcome::new(amount, DamageType::Physical, combat.player_id().clone());
        let application = combat.apply_damage(id, outcome);
        self.collect_defeated(combat);
        application
    }

    /// Finish off enemies the combat system removed by death.
    ///
    /// Call after any combat path that may kill (player attacks, direct damage).
    pub fn collect_defeated(&mut self, combat: &mut CombatSystem) {
        for entity in combat.take_defeated() {
            let Some(mut brain) = self.enemies.remove(&entity.id) else {
                continue;
            };
            brain.fsm.force_transition(EnemyState::Dead);
            brain.target = None;
            self.scene.detach(&entity.id);

            let record = brain.record(&entity);
            log::info!("{} (level {}) defeated", record.name, record.level);
            self.bus.emit(&EnemyDefeated {
                id: entity.id.clone(),
                kind: brain.kind,
                level: brain.level,
                record,
            });
        }
    }

    /// Forget enemies whose combat entity was removed outside of death handling
    fn drop_stale(&mut self, combat: &CombatSystem) {
        let stale: Vec<EntityId> = self
            .enemies
            .keys()
            .filter(|id| !combat.registry().contains(id))
            .cloned()
            .collect();
        for id in stale {
            log::debug!("Dropping {} with no combat entity", id);
            self.enemies.remove(&id);
            self.scene.detach(&id);
        }
    }

    /// Despawn an enemy without rewards or defeat events
    pub fn remove_enemy(&mut self, id: &EntityId, combat: &mut CombatSystem) -> bool {
        if self.enemies.remove(id).is_none() {
            return false;
        }
        combat.remove(id);
        self.scene.detach(id);
        true
    }

    /// Despawn every enemy
    pub fn clear(&mut self, combat: &mut CombatSystem) {
        let ids: Vec<EntityId> = self.enemies.keys().cloned().collect();
        for id in ids {
            self.remove_enemy(&id, combat);
        }
    }

    /// Put a living enemy into `state`. Engaged states target the player.
    ///
    /// `Dead` is only reachable through damage; forcing it returns false.
    pub fn force_state(&mut self, id: &EntityId, state: EnemyState, combat: &CombatSystem) -> bool {
        if state == EnemyState::Dead {
            return false;
        }
        let Some(brain) = self.enemies.get_mut(id) else {
            return false;
        };
        brain.fsm.force_transition(state);
        brain.target = state.is_engaged().then(|| combat.player_id().clone());
        true
    }

    pub fn enemy(&self, id: &EntityId, combat: &CombatSystem) -> Option<EnemyRecord> {
        let brain = self.enemies.get(id)?;
        let entity = combat.registry().get(id)?;
        (brain.state() != EnemyState::Dead && entity.is_alive()).then(|| brain.record(entity))
    }

    /// Every living enemy, ordered by id
    pub fn all_enemies(&self, combat: &CombatSystem) -> Vec<EnemyRecord> {
        self.enemies
            .keys()
            .filter_map(|id| self.enemy(id, combat))
            .collect()
    }

    /// Living enemies within `radius` of `origin`
    pub fn enemies_in_range(&self, origin: Vec3, radius: f32, combat: &CombatSystem) -> Vec<EnemyRecord> {
        combat
            .registry()
            .query_in_range(origin, radius)
            .into_iter()
            .filter_map(|entity| {
                let brain = self.enemies.get(&entity.id)?;
                (brain.state() != EnemyState::Dead).then(|| brain.record(entity))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberfall_combat::{FixedRandom, PlayerStats};
    use parking_lot::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum SceneCall {
        Attach(String),
        Detach(String),
        Sync(String, Vec3),
    }

    struct RecordingScene(Arc<Mutex<Vec<SceneCall>>>);

    impl SceneSink for RecordingScene {
        fn attach(&mut self, id: &EntityId, _kind: EnemyKind, _position: Vec3) {
            self.0.lock().push(SceneCall::Attach(id.to_string()));
        }
        fn detach(&mut self, id: &EntityId) {
            self.0.lock().push(SceneCall::Detach(id.to_string()));
        }
        fn sync_position(&mut self, id: &EntityId, position: Vec3) {
            self.0.lock().push(SceneCall::Sync(id.to_string(), position));
        }
    }

    fn setup() -> (EnemySystem, CombatSystem) {
        let bus = Arc::new(EventBus::new());
        let mut combat = CombatSystem::new(bus.clone(), Box::new(PlayerStats::default()))
            .with_rng(Box::new(FixedRandom(0.5)));
        combat.init_player(Vec3::ZERO);
        (EnemySystem::new(bus), combat)
    }

    fn tick(enemies: &mut EnemySystem, combat: &mut CombatSystem, dt: f32, player: Vec3) {
        combat.update(dt, Some(player));
        enemies.update(dt, Some(player), combat);
    }

    #[test]
    fn test_spawn_ids_are_unique() {
        let (mut enemies, mut combat) = setup();
        let a = enemies.spawn(EnemyKind::Goblin, Vec3::ZERO, 1, &mut combat).unwrap();
        let b = enemies.spawn(EnemyKind::Goblin, Vec3::ZERO, 1, &mut combat).unwrap();
        assert_eq!(a.as_str(), "goblin_1");
        assert_eq!(b.as_str(), "goblin_2");

        // A foreign entity already holding the next id is skipped
        combat
            .register(CombatEntity::new("wolf_3", Vec3::ZERO, 10.0))
            .unwrap();
        let c = enemies.spawn(EnemyKind::Wolf, Vec3::ZERO, 1, &mut combat).unwrap();
        assert_eq!(c.as_str(), "wolf_4");
    }

    #[test]
    fn test_spawn_failures_leave_others_intact() {
        let (mut enemies, mut combat) = setup();
        let id = enemies.spawn_named("orc", Vec3::ONE, 2, &mut combat).unwrap();

        assert_eq!(
            enemies.spawn_named("dragon", Vec3::ZERO, 1, &mut combat),
            Err(SpawnError::UnknownKind("dragon".to_string()))
        );
        assert_eq!(
            enemies.spawn(EnemyKind::Orc, Vec3::ZERO, 0, &mut combat),
            Err(SpawnError::InvalidLevel(0))
        );

        assert_eq!(enemies.len(), 1);
        assert_eq!(enemies.enemy(&id, &combat).unwrap().position, Vec3::ONE);
    }

    #[test]
    fn test_chasing_moves_toward_player() {
        let (mut enemies, mut combat) = setup();
        let id = enemies
            .spawn(EnemyKind::Goblin, Vec3::new(10.0, 0.0, 0.0), 1, &mut combat)
            .unwrap();

        tick(&mut enemies, &mut combat, 0.5, Vec3::ZERO);
        let record = enemies.enemy(&id, &combat).unwrap();
        assert_eq!(record.state, EnemyState::Chasing);
        assert_eq!(record.target, Some(EntityId::player()));
        // Transition tick does not move
        assert_eq!(record.position, Vec3::new(10.0, 0.0, 0.0));

        tick(&mut enemies, &mut combat, 0.5, Vec3::ZERO);
        let record = enemies.enemy(&id, &combat).unwrap();
        // goblin speed 3.0 * 0.5
        assert!((record.position.x - 8.5).abs() < 1e-5);
    }

    #[test]
    fn test_no_player_position_skips_ai() {
        let (mut enemies, mut combat) = setup();
        let id = enemies
            .spawn(EnemyKind::Wolf, Vec3::new(1.0, 0.0, 0.0), 1, &mut combat)
            .unwrap();

        for _ in 0..5 {
            combat.update(0.1, None);
            assert!(enemies.update(0.1, None, &mut combat));
        }
        assert_eq!(enemies.enemy(&id, &combat).unwrap().state, EnemyState::Idle);
        assert!(!enemies.update(-0.1, Some(Vec3::ZERO), &mut combat));
    }

    #[test]
    fn test_scene_lifecycle() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let (enemies, mut combat) = setup();
        let mut enemies = enemies.with_scene(Box::new(RecordingScene(calls.clone())));

        let id = enemies
            .spawn(EnemyKind::Skeleton, Vec3::new(3.0, 0.0, 0.0), 1, &mut combat)
            .unwrap();
        enemies.update(0.1, None, &mut combat);
        enemies.damage_enemy(&id, 1000, &mut combat);

        let calls = calls.lock();
        assert_eq!(
            calls.as_slice(),
            &[
                SceneCall::Attach(id.to_string()),
                SceneCall::Sync(id.to_string(), Vec3::new(3.0, 0.0, 0.0)),
                SceneCall::Detach(id.to_string()),
            ]
        );
    }

    #[test]
    fn test_damage_enemy_death_is_idempotent() {
        let (mut enemies, mut combat) = setup();
        let defeated = Arc::new(Mutex::new(Vec::new()));
        let defeated_clone = defeated.clone();
        combat.bus().on(move |e: &EnemyDefeated| {
            defeated_clone.lock().push(e.record.clone());
        });

        let id = enemies.spawn(EnemyKind::Goblin, Vec3::ZERO, 1, &mut combat).unwrap();
        assert_eq!(enemies.damage_enemy(&id, 10, &mut combat), Some(DamageApplication::Survived));
        assert_eq!(enemies.enemy(&id, &combat).unwrap().health, 20.0);

        assert_eq!(enemies.damage_enemy(&id, 50, &mut combat), Some(DamageApplication::Died));
        assert_eq!(enemies.damage_enemy(&id, 50, &mut combat), None);

        let defeated = defeated.lock();
        assert_eq!(defeated.len(), 1);
        assert_eq!(defeated[0].state, EnemyState::Dead);
        assert_eq!(defeated[0].health, 0.0);
        assert!(enemies.enemy(&id, &combat).is_none());
        assert!(enemies.is_empty());
    }

    #[test]
    fn test_death_through_combat_reported_on_next_update() {
        let (mut enemies, mut combat) = setup();
        let defeated = Arc::new(Mutex::new(Vec::new()));
        let defeated_clone = defeated.clone();
        combat.bus().on(move |e: &EnemyDefeated| {
            defeated_clone.lock().push(e.id.clone());
        });

        let id = enemies.spawn(EnemyKind::Goblin, Vec3::ZERO, 1, &mut combat).unwrap();
        let outcome = DamageOutcome::new(1000, DamageType::Physical, EntityId::player());
        assert_eq!(combat.apply_damage(&id, outcome), Some(DamageApplication::Died));
        assert!(defeated.lock().is_empty());

        tick(&mut enemies, &mut combat, 0.016, Vec3::ZERO);
        tick(&mut enemies, &mut combat, 0.016, Vec3::ZERO);

        assert_eq!(defeated.lock().as_slice(), &[id.clone()]);
        assert!(enemies.is_empty());
        assert!(enemies.enemy(&id, &combat).is_none());
    }

    #[test]
    fn test_removed_entity_is_dropped() {
        let (mut enemies, mut combat) = setup();
        let id = enemies.spawn(EnemyKind::Orc, Vec3::ZERO, 1, &mut combat).unwrap();
        combat.remove(&id);

        enemies.update(0.1, Some(Vec3::ZERO), &mut combat);
        assert!(enemies.is_empty());
    }

    #[test]
    fn test_force_state() {
        let (mut enemies, mut combat) = setup();
        let id = enemies.spawn(EnemyKind::Goblin, Vec3::ZERO, 1, &mut combat).unwrap();

        assert!(enemies.force_state(&id, EnemyState::Attacking, &combat));
        let record = enemies.enemy(&id, &combat).unwrap();
        assert_eq!(record.state, EnemyState::Attacking);
        assert_eq!(record.target, Some(EntityId::player()));

        assert!(!enemies.force_state(&id, EnemyState::Dead, &combat));
        assert!(!enemies.force_state(&EntityId::new("ghost"), EnemyState::Idle, &combat));

        assert!(enemies.force_state(&id, EnemyState::Idle, &combat));
        assert_eq!(enemies.enemy(&id, &combat).unwrap().target, None);
        assert!(enemies.remove_enemy(&id, &mut combat));
        assert!(!combat.registry().contains(&id));
    }
}
