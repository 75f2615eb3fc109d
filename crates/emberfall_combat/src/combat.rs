//! Player-facing combat system
//!
//! Owns the entity registry, keeps the player entity in sync with the
//! canonical [`PlayerState`], and runs every attack through the same
//! cooldown / range / resolver / damage pipeline.

use std::sync::Arc;

use emberfall_event::EventBus;
use glam::Vec3;
use serde::Serialize;

use crate::config::CombatConfig;
use crate::damage::{DamageApplication, DamageOutcome, DamageResolver};
use crate::events::{AttackPerformed, DamageDealt, EntityDefeated, ExperienceAwarded, PlayerDied};
use crate::player::PlayerState;
use crate::random::{RandomSource, ThreadRandom};
use crate::registry::{CombatEntity, EntityId, EntityRegistry, RegistryError};

/// Outcome of a successful [`CombatSystem::attempt_attack`]
#[derive(Debug, Clone, PartialEq)]
pub struct AttackReport {
    pub attacker: EntityId,
    pub target: EntityId,
    /// Damage as applied (after any defend reduction)
    pub outcome: DamageOutcome,
    pub application: DamageApplication,
}

/// Snapshot of the player's combat numbers for UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerCombatStats {
    pub health: f32,
    pub max_health: f32,
    pub attack_power: f32,
    pub defense: f32,
    pub attack_range: f32,
    pub attack_cooldown: f32,
    pub cooldown_remaining: f32,
    pub defending: bool,
}

/// Combat system
pub struct CombatSystem {
    registry: EntityRegistry,
    resolver: DamageResolver,
    rng: Box<dyn RandomSource>,
    bus: Arc<EventBus>,
    player_state: Box<dyn PlayerState>,
    player_id: EntityId,
    defend_timer: f32,
    /// Entities removed by death since the last `take_defeated`
    defeated: Vec<CombatEntity>,
}

impl CombatSystem {
    /// Create a combat system with default balance and an unseeded RNG
    pub fn new(bus: Arc<EventBus>, player_state: Box<dyn PlayerState>) -> Self {
        Self {
            registry: EntityRegistry::new(),
            resolver: DamageResolver::default(),
            rng: Box::new(ThreadRandom),
            bus,
            player_state,
            player_id: EntityId::player(),
            defend_timer: 0.0,
            defeated: Vec::new(),
        }
    }

    /// Set balance config
    pub fn with_config(mut self, config: CombatConfig) -> Self {
        self.resolver = DamageResolver::new(config);
        self
    }

    /// Set random source
    pub fn with_rng(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    /// Register the player entity at `position`, derived from the player state
    pub fn init_player(&mut self, position: Vec3) {
        let config = self.resolver.config();
        let player = CombatEntity::new(self.player_id.clone(), position, 0.0)
            .with_reach(config.player_attack_range, config.player_attack_cooldown);
        self.registry.upsert(player);
        self.sync_player(Some(position));
        log::debug!("Player registered at {:?}", position);
    }

    pub fn player_id(&self) -> &EntityId {
        &self.player_id
    }

    pub fn config(&self) -> &CombatConfig {
        self.resolver.config()
    }

    pub fn resolver(&self) -> &DamageResolver {
        &self.resolver
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    pub fn player_state(&self) -> &dyn PlayerState {
        self.player_state.as_ref()
    }

    pub fn player_state_mut(&mut self) -> &mut dyn PlayerState {
        self.player_state.as_mut()
    }

    /// Register a new entity
    pub fn register(&mut self, entity: CombatEntity) -> Result<(), RegistryError> {
        self.registry.insert_new(entity)
    }

    /// Drop an entity without death handling
    pub fn remove(&mut self, id: &EntityId) -> Option<CombatEntity> {
        self.registry.remove(id)
    }

    /// Advance one tick: re-sync the player, count cooldowns down, expire defend.
    ///
    /// Returns false (and changes nothing) for a negative or NaN `delta_time`.
    pub fn update(&mut self, delta_time: f32, player_position: Option<Vec3>) -> bool {
        if !valid_delta(delta_time) {
            log::warn!("Ignoring combat update with invalid delta time {}", delta_time);
            return false;
        }

        self.sync_player(player_position);

        for entity in self.registry.iter_mut() {
            entity.tick_cooldown(delta_time);
        }
        self.defend_timer = (self.defend_timer - delta_time).max(0.0);
        true
    }

    fn sync_player(&mut self, position: Option<Vec3>) {
        let config = self.resolver.config();
        let state = self.player_state.as_ref();
        let attack = config.player_base_attack + state.strength() * config.attack_per_strength;
        let defense = state.vitality() * config.defense_per_vitality;

        if let Some(player) = self.registry.get_mut(&self.player_id) {
            player.max_health = state.max_health().max(0.0);
            player.set_health(state.health());
            player.attack_power = attack.max(0.0);
            player.defense = defense.max(0.0);
            if let Some(position) = position {
                player.position = position;
            }
        }
    }

    /// Attack `target` with `attacker` if the cooldown has elapsed and the
    /// target is within the attacker's range.
    ///
    /// Returns `None` without touching either entity otherwise, or if either
    /// is unknown or dead.
    pub fn attempt_attack(&mut self, attacker_id: &EntityId, target_id: &EntityId) -> Option<AttackReport> {
        if attacker_id == target_id {
            return None;
        }

        let attacker = self.registry.get(attacker_id)?;
        let target = self.registry.get(target_id)?;
        if !attacker.can_attack() || !target.is_alive() {
            return None;
        }
        if !attacker.in_range_of(target) {
            log::trace!("{} out of range of {}", target_id, attacker_id);
            return None;
        }

        let outcome = self.resolver.resolve(attacker, target, self.rng.as_mut());
        if let Some(attacker) = self.registry.get_mut(attacker_id) {
            attacker.reset_cooldown();
        }

        let (outcome, application) = self.apply_outcome(target_id, outcome)?;
        log::debug!(
            "{} hit {} for {}{}",
            attacker_id,
            target_id,
            outcome.amount,
            if outcome.critical { " (critical)" } else { "" }
        );

        self.bus.emit(&AttackPerformed {
            attacker: attacker_id.clone(),
            target: target_id.clone(),
            damage: outcome.amount,
        });

        Some(AttackReport {
            attacker: attacker_id.clone(),
            target: target_id.clone(),
            outcome,
            application,
        })
    }

    /// Attack the nearest living non-player entity within the player's range
    pub fn player_attack(&mut self) -> Option<AttackReport> {
        let player = self.registry.get(&self.player_id)?;
        if !player.can_attack() {
            return None;
        }
        let target = self
            .registry
            .nearest_in_range(player.position, player.attack_range, |entity| !entity.is_player)?
            .id
            .clone();
        let player_id = self.player_id.clone();
        self.attempt_attack(&player_id, &target)
    }

    /// Halve incoming damage for `duration` seconds
    pub fn player_defend(&mut self, duration: f32) {
        if !valid_delta(duration) {
            log::warn!("Ignoring defend with invalid duration {}", duration);
            return;
        }
        self.defend_timer = self.defend_timer.max(duration);
    }

    pub fn is_player_defending(&self) -> bool {
        self.defend_timer > 0.0
    }

    /// Apply a resolved outcome to `target`.
    ///
    /// Returns `None` if the target is unknown or already dead.
    pub fn apply_damage(&mut self, target: &EntityId, outcome: DamageOutcome) -> Option<DamageApplication> {
        self.apply_outcome(target, outcome)
            .map(|(_, application)| application)
    }

    fn apply_outcome(
        &mut self,
        target_id: &EntityId,
        outcome: DamageOutcome,
    ) -> Option<(DamageOutcome, DamageApplication)> {
        let defending = self.is_player_defending();
        let defend_multiplier = self.resolver.config().defend_damage_multiplier;

        let target = self.registry.get_mut(target_id)?;
        if !target.is_alive() {
            return None;
        }

        let outcome = if target.is_player && defending {
            outcome.scaled(defend_multiplier)
        } else {
            outcome
        };

        let died = target.take_damage(outcome.amount as f32);
        if target.is_player {
            self.player_state.take_damage(outcome.amount);
        }

        self.bus.emit(&DamageDealt {
            target: target_id.clone(),
            outcome: outcome.clone(),
        });

        if died {
            self.handle_death(target_id);
            Some((outcome, DamageApplication::Died))
        } else {
            Some((outcome, DamageApplication::Survived))
        }
    }

    fn handle_death(&mut self, id: &EntityId) {
        if id == &self.player_id {
            log::info!("Player died");
            self.bus.emit(&PlayerDied);
            return;
        }

        let Some(entity) = self.registry.remove(id) else {
            return;
        };

        let config = self.resolver.config();
        let experience = (entity.max_health * config.xp_per_max_health
            + entity.attack_power * config.xp_per_attack_power)
            .floor()
            .max(0.0) as u32;
        self.player_state.add_experience(experience);
        log::info!("{} defeated, awarding {} experience", id, experience);

        self.bus.emit(&ExperienceAwarded {
            amount: experience,
            source: id.clone(),
        });
        self.bus.emit(&EntityDefeated {
            id: id.clone(),
            entity: entity.clone(),
        });
        self.defeated.push(entity);
    }

    /// Entities removed by death since the last call.
    ///
    /// Every non-player death is queued here until drained, so a host that
    /// runs the combat system without an enemy system must call this each
    /// tick to keep the queue from growing.
    pub fn take_defeated(&mut self) -> Vec<CombatEntity> {
        std::mem::take(&mut self.defeated)
    }

    pub fn can_player_attack(&self) -> bool {
        self.registry
            .get(&self.player_id)
            .is_some_and(CombatEntity::can_attack)
    }

    /// Seconds until the player can attack again
    pub fn player_attack_cooldown(&self) -> f32 {
        self.registry
            .get(&self.player_id)
            .map_or(0.0, |player| player.last_attack_time)
    }

    pub fn player_combat_stats(&self) -> Option<PlayerCombatStats> {
        let player = self.registry.get(&self.player_id)?;
        Some(PlayerCombatStats {
            health: player.health,
            max_health: player.max_health,
            attack_power: player.attack_power,
            defense: player.defense,
            attack_range: player.attack_range,
            attack_cooldown: player.attack_cooldown,
            cooldown_remaining: player.last_attack_time,
            defending: self.is_player_defending(),
        })
    }
}

/// Whether a time step is usable (finite and not negative)
pub fn valid_delta(delta_time: f32) -> bool {
    delta_time.is_finite() && delta_time >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerStats;
    use crate::random::FixedRandom;
    use parking_lot::Mutex;

    fn system() -> CombatSystem {
        let mut combat = CombatSystem::new(Arc::new(EventBus::new()), Box::new(PlayerStats::default()))
            .with_rng(Box::new(FixedRandom(0.5)));
        combat.init_player(Vec3::ZERO);
        combat
    }

    fn dummy(id: &str, position: Vec3) -> CombatEntity {
        CombatEntity::new(id, position, 30.0)
            .with_attack(8.0)
            .with_reach(2.0, 1.5)
    }

    #[test]
    fn test_player_derived_from_state() {
        let combat = system();
        let stats = combat.player_combat_stats().unwrap();
        // 10 + 5 * 2, 5 * 0.5
        assert_eq!(stats.attack_power, 20.0);
        assert_eq!(stats.defense, 2.5);
        assert_eq!(stats.health, 100.0);
        assert!(combat.can_player_attack());
    }

    #[test]
    fn test_attack_and_cooldown_gate() {
        let mut combat = system();
        combat.register(dummy("goblin_1", Vec3::new(1.0, 0.0, 0.0))).unwrap();
        let player = EntityId::player();
        let goblin = EntityId::new("goblin_1");

        let report = combat.attempt_attack(&player, &goblin).unwrap();
        assert_eq!(report.outcome.amount, 20);
        assert_eq!(report.application, DamageApplication::Survived);
        assert_eq!(combat.player_attack_cooldown(), 0.8);
        assert_eq!(combat.registry().get(&goblin).unwrap().health, 10.0);

        // On cooldown: no attack, no damage
        assert!(combat.attempt_attack(&player, &goblin).is_none());
        assert_eq!(combat.registry().get(&goblin).unwrap().health, 10.0);

        assert!(combat.update(0.5, None));
        assert!((combat.player_attack_cooldown() - 0.3).abs() < 1e-6);
        assert!(combat.attempt_attack(&player, &goblin).is_none());

        combat.update(0.5, None);
        assert_eq!(combat.player_attack_cooldown(), 0.0);
        let report = combat.attempt_attack(&player, &goblin).unwrap();
        assert_eq!(report.application, DamageApplication::Died);
    }

    #[test]
    fn test_out_of_range() {
        let mut combat = system();
        combat.register(dummy("far", Vec3::new(10.0, 0.0, 0.0))).unwrap();
        assert!(combat
            .attempt_attack(&EntityId::player(), &EntityId::new("far"))
            .is_none());
        assert!(combat.player_attack().is_none());
        assert!(combat.can_player_attack());
    }

    #[test]
    fn test_player_attack_targets_nearest() {
        let mut combat = system();
        combat.register(dummy("a", Vec3::new(2.0, 0.0, 0.0))).unwrap();
        combat.register(dummy("b", Vec3::new(1.0, 0.0, 0.0))).unwrap();

        let report = combat.player_attack().unwrap();
        assert_eq!(report.target.as_str(), "b");
    }

    #[test]
    fn test_defeated_queue_holds_until_drained() {
        let mut combat = system();
        for id in ["goblin_1", "goblin_2"] {
            combat.register(dummy(id, Vec3::new(1.0, 0.0, 0.0))).unwrap();
            let outcome = DamageOutcome::new(100, crate::DamageType::Physical, "player");
            combat.apply_damage(&EntityId::new(id), outcome);
        }
        combat.update(0.1, None);

        let drained: Vec<String> = combat
            .take_defeated()
            .into_iter()
            .map(|entity| entity.id.to_string())
            .collect();
        assert_eq!(drained, vec!["goblin_1".to_string(), "goblin_2".to_string()]);
        assert!(combat.take_defeated().is_empty());
    }

    #[test]
    fn test_death_awards_experience_and_removes() {
        let mut combat = system();
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        combat.bus().on(move |e: &EntityDefeated| {
            events_clone.lock().push(e.id.clone());
        });

        combat.register(dummy("goblin_1", Vec3::new(1.0, 0.0, 0.0))).unwrap();
        let goblin = EntityId::new("goblin_1");
        let outcome = DamageOutcome::new(100, crate::DamageType::Physical, "player");

        assert_eq!(combat.apply_damage(&goblin, outcome.clone()), Some(DamageApplication::Died));
        // 30 * 0.5 + 8 * 0.3 = 17.4
        assert_eq!(combat.player_state().experience(), 17);
        assert!(!combat.registry().contains(&goblin));
        assert_eq!(events.lock().as_slice(), &[goblin.clone()]);

        // Second hit is a no-op
        assert_eq!(combat.apply_damage(&goblin, outcome), None);
        assert_eq!(events.lock().len(), 1);
        assert_eq!(combat.take_defeated().len(), 1);
        assert!(combat.take_defeated().is_empty());
    }

    #[test]
    fn test_player_damage_mirrors_state_and_reports_death() {
        let mut combat = system();
        let died = Arc::new(Mutex::new(0));
        let died_clone = died.clone();
        combat.bus().on(move |_: &PlayerDied| *died_clone.lock() += 1);

        let player = EntityId::player();
        let hit = DamageOutcome::new(40, crate::DamageType::Physical, "goblin_1");
        combat.apply_damage(&player, hit.clone());
        assert_eq!(combat.player_state().health(), 60.0);
        assert_eq!(combat.registry().get(&player).unwrap().health, 60.0);

        assert_eq!(
            combat.apply_damage(&player, hit.scaled(5.0)),
            Some(DamageApplication::Died)
        );
        assert_eq!(combat.player_state().health(), 0.0);
        // Player stays registered
        assert!(combat.registry().contains(&player));
        assert_eq!(*died.lock(), 1);

        assert_eq!(combat.apply_damage(&player, DamageOutcome::new(1, crate::DamageType::Physical, "x")), None);
        assert_eq!(*died.lock(), 1);
    }

    #[test]
    fn test_defend_halves_damage() {
        let mut combat = system();
        combat.player_defend(1.0);
        assert!(combat.is_player_defending());

        let player = EntityId::player();
        combat.apply_damage(&player, DamageOutcome::new(9, crate::DamageType::Physical, "x"));
        assert_eq!(combat.player_state().health(), 96.0);

        combat.update(1.0, None);
        assert!(!combat.is_player_defending());
        combat.apply_damage(&player, DamageOutcome::new(9, crate::DamageType::Physical, "x"));
        assert_eq!(combat.player_state().health(), 87.0);
    }

    #[test]
    fn test_invalid_delta_is_ignored() {
        let mut combat = system();
        combat.register(dummy("g", Vec3::new(1.0, 0.0, 0.0))).unwrap();
        combat.player_attack().unwrap();

        assert!(!combat.update(-1.0, None));
        assert!(!combat.update(f32::NAN, None));
        assert_eq!(combat.player_attack_cooldown(), 0.8);
        assert!(combat.update(0.0, None));
        assert_eq!(combat.player_attack_cooldown(), 0.8);
    }

    #[test]
    fn test_unknown_ids() {
        let mut combat = system();
        let ghost = EntityId::new("ghost");
        assert!(combat.attempt_attack(&EntityId::player(), &ghost).is_none());
        assert!(combat.attempt_attack(&ghost, &EntityId::player()).is_none());
        assert!(combat
            .apply_damage(&ghost, DamageOutcome::new(5, crate::DamageType::Physical, "x"))
            .is_none());
        assert!(combat.remove(&ghost).is_none());
    }
}
