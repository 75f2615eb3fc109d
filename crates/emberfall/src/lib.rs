//! # emberfall - Combat Simulation
//!
//! Ties the combat core, enemy AI, and event bus into one tick loop:
//! - [`Simulation::update`] re-syncs the player, counts cooldowns down, then
//!   runs every enemy's state machine
//! - Player actions and direct damage go through the same damage pipeline
//! - Enemy deaths are finished off in the same call that caused them
//!
//! ## Example
//!
//! ```ignore
//! use emberfall::prelude::*;
//!
//! let mut sim = Simulation::builder()
//!     .with_config(SimulationConfig::default().with_seed(7))
//!     .build();
//!
//! sim.on(|e: &EnemyDefeated| println!("{} down", e.record.name));
//! let goblin = sim.spawn_enemy(EnemyKind::Goblin, Vec3::new(10.0, 0.0, 10.0), 1)?;
//!
//! loop {
//!     sim.update(1.0 / 60.0, Some(player_position));
//!     sim.player_attack();
//! }
//! ```

use std::sync::Arc;

pub use emberfall_ai;
pub use emberfall_combat;
pub use emberfall_event;

pub mod config;

use emberfall_ai::{AiConfig, EnemyKind, EnemyRecord, EnemyState, EnemySystem, NullScene, SceneSink, SpawnError};
use emberfall_combat::{
    AttackReport, CombatSystem, DamageApplication, EntityId, PlayerCombatStats, PlayerState, PlayerStats,
    RandomSource, SeededRandom, ThreadRandom,
};
use emberfall_event::{Event, EventBus, SubscriberId};
use glam::Vec3;

pub use config::SimulationConfig;

/// Builder for [`Simulation`]
pub struct SimulationBuilder {
    config: SimulationConfig,
    bus: Option<Arc<EventBus>>,
    player_state: Box<dyn PlayerState>,
    rng: Option<Box<dyn RandomSource>>,
    scene: Box<dyn SceneSink>,
    player_position: Vec3,
}

impl SimulationBuilder {
    fn new() -> Self {
        Self {
            config: SimulationConfig::default(),
            bus: None,
            player_state: Box::new(PlayerStats::default()),
            rng: None,
            scene: Box::new(NullScene),
            player_position: Vec3::ZERO,
        }
    }

    /// Set configuration
    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing event bus
    pub fn with_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Set the canonical player stat store
    pub fn with_player_state(mut self, player_state: Box<dyn PlayerState>) -> Self {
        self.player_state = player_state;
        self
    }

    /// Override the random source (takes precedence over the config seed)
    pub fn with_rng(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Set the scene that mirrors enemy visuals
    pub fn with_scene(mut self, scene: Box<dyn SceneSink>) -> Self {
        self.scene = scene;
        self
    }

    /// Set where the player starts
    pub fn with_player_position(mut self, position: Vec3) -> Self {
        self.player_position = position;
        self
    }

    pub fn build(self) -> Simulation {
        let bus = self.bus.unwrap_or_default();
        let seed = self.config.seed;
        let rng = self.rng.unwrap_or_else(|| -> Box<dyn RandomSource> {
            match seed {
                Some(seed) => Box::new(SeededRandom::new(seed)),
                None => Box::new(ThreadRandom),
            }
        });

        let mut combat = CombatSystem::new(bus.clone(), self.player_state)
            .with_config(self.config.combat)
            .with_rng(rng);
        combat.init_player(self.player_position);

        let enemies = EnemySystem::new(bus.clone())
            .with_config(self.config.ai)
            .with_scene(self.scene);

        Simulation {
            bus,
            combat,
            enemies,
            ticks: 0,
        }
    }
}

/// The combat / enemy AI simulation
pub struct Simulation {
    bus: Arc<EventBus>,
    combat: CombatSystem,
    enemies: EnemySystem,
    ticks: u64,
}

impl Simulation {
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    /// Simulation with default config, player stats, and an unseeded RNG
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Subscribe to an event
    pub fn on<E: Event, F>(&self, handler: F) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.bus.on(handler)
    }

    /// Unsubscribe
    pub fn off(&self, id: SubscriberId) -> bool {
        self.bus.off(id)
    }

    pub fn combat(&self) -> &CombatSystem {
        &self.combat
    }

    pub fn combat_mut(&mut self) -> &mut CombatSystem {
        &mut self.combat
    }

    pub fn enemies(&self) -> &EnemySystem {
        &self.enemies
    }

    pub fn ai_config(&self) -> &AiConfig {
        self.enemies.config()
    }

    /// Completed ticks
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance one frame.
    ///
    /// Returns false (and changes nothing) for a negative or NaN `delta_time`.
    pub fn update(&mut self, delta_time: f32, player_position: Option<Vec3>) -> bool {
        if !self.combat.update(delta_time, player_position) {
            return false;
        }
        self.enemies.update(delta_time, player_position, &mut self.combat);
        self.ticks += 1;
        true
    }

    pub fn spawn_enemy(&mut self, kind: EnemyKind, position: Vec3, level: u32) -> Result<EntityId, SpawnError> {
        self.enemies.spawn(kind, position, level, &mut self.combat)
    }

    /// Spawn by kind name; unknown names fail with [`SpawnError::UnknownKind`]
    pub fn spawn_enemy_named(&mut self, kind: &str, position: Vec3, level: u32) -> Result<EntityId, SpawnError> {
        self.enemies.spawn_named(kind, position, level, &mut self.combat)
    }

    pub fn remove_enemy(&mut self, id: &EntityId) -> bool {
        self.enemies.remove_enemy(id, &mut self.combat)
    }

    /// Attack the nearest enemy in the player's range
    pub fn player_attack(&mut self) -> Option<AttackReport> {
        let report = self.combat.player_attack();
        self.enemies.collect_defeated(&mut self.combat);
        report
    }

    pub fn player_defend(&mut self, duration: f32) {
        self.combat.player_defend(duration);
    }

    /// Shared attack entry point for any attacker/target pair
    pub fn attempt_attack(&mut self, attacker: &EntityId, target: &EntityId) -> Option<AttackReport> {
        let report = self.combat.attempt_attack(attacker, target);
        self.enemies.collect_defeated(&mut self.combat);
        report
    }

    pub fn damage_enemy(&mut self, id: &EntityId, amount: u32) -> Option<DamageApplication> {
        self.enemies.damage_enemy(id, amount, &mut self.combat)
    }

    pub fn force_enemy_state(&mut self, id: &EntityId, state: EnemyState) -> bool {
        self.enemies.force_state(id, state, &self.combat)
    }

    pub fn enemy(&self, id: &EntityId) -> Option<EnemyRecord> {
        self.enemies.enemy(id, &self.combat)
    }

    /// Living enemies
    pub fn all_enemies(&self) -> Vec<EnemyRecord> {
        self.enemies.all_enemies(&self.combat)
    }

    pub fn enemies_in_range(&self, position: Vec3, radius: f32) -> Vec<EnemyRecord> {
        self.enemies.enemies_in_range(position, radius, &self.combat)
    }

    pub fn player_combat_stats(&self) -> Option<PlayerCombatStats> {
        self.combat.player_combat_stats()
    }

    pub fn can_player_attack(&self) -> bool {
        self.combat.can_player_attack()
    }

    pub fn player_attack_cooldown(&self) -> f32 {
        self.combat.player_attack_cooldown()
    }

    pub fn player_state(&self) -> &dyn PlayerState {
        self.combat.player_state()
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

pub mod prelude {
    pub use crate::config::SimulationConfig;
    pub use crate::{Simulation, SimulationBuilder};
    pub use emberfall_ai::prelude::*;
    pub use emberfall_combat::prelude::*;
    pub use emberfall_event::prelude::*;
    pub use glam::Vec3;
}
