//! Headless encounter runner
//!
//! Spawns one of each enemy kind around a stationary player, lets them close
//! in, and has the player swing whenever the cooldown allows.
//!
//! Run with: cargo run --bin emberfall-sim [config.json]
//! Log level follows RUST_LOG (default: info).

use std::process::ExitCode;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use emberfall::prelude::*;

const TICK: f32 = 1.0 / 30.0;
const MAX_TICKS: u32 = 30 * 120;
const DEFAULT_SEED: u64 = 0x00e3_befa_11;

fn load_config() -> Result<SimulationConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading config from {}", path);
            SimulationConfig::from_json_file(path)
        }
        None => Ok(SimulationConfig::default()),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Invalid config: {}", err);
            return ExitCode::FAILURE;
        }
    };
    if config.seed.is_none() {
        config.seed = Some(DEFAULT_SEED);
    }
    let seed = config.seed.unwrap_or(DEFAULT_SEED);

    let mut sim = Simulation::builder().with_config(config).build();

    let defeated = Arc::new(AtomicU32::new(0));
    let defeated_count = defeated.clone();
    sim.on(move |e: &EnemyDefeated| {
        defeated_count.fetch_add(1, Ordering::Relaxed);
        log::info!("{} (level {}) falls", e.record.name, e.level);
    });
    sim.on(|e: &EnemyDetectedPlayer| log::info!("{} spotted the player", e.id));
    sim.on(|e: &EnemyAttack| log::debug!("{} hits for {}", e.enemy_id, e.damage));
    sim.on(|e: &ExperienceAwarded| log::debug!("+{} xp from {}", e.amount, e.source));
    sim.on(|_: &PlayerDied| log::warn!("The player has fallen"));

    let spawns = [
        (EnemyKind::Goblin, Vec3::new(6.0, 0.0, 0.0), 1),
        (EnemyKind::Wolf, Vec3::new(-12.0, 0.0, 4.0), 1),
        (EnemyKind::Skeleton, Vec3::new(0.0, 0.0, 9.0), 2),
        (EnemyKind::Orc, Vec3::new(3.0, 0.0, -14.0), 2),
    ];
    for (kind, position, level) in spawns {
        if let Err(err) = sim.spawn_enemy(kind, position, level) {
            log::error!("Spawn failed: {}", err);
            return ExitCode::FAILURE;
        }
    }
    let spawned = spawns.len() as u32;

    let player_position = Vec3::ZERO;
    let mut ticks = 0;
    while ticks < MAX_TICKS {
        sim.update(TICK, Some(player_position));
        if sim.player_state().health() <= 0.0 || sim.all_enemies().is_empty() {
            break;
        }
        if sim.can_player_attack() {
            // Brace when nothing is in reach yet
            if sim.player_attack().is_none() {
                sim.player_defend(TICK);
            }
        }
        ticks += 1;
    }

    let player = sim.player_state();
    println!();
    println!("Encounter finished after {:.1}s (seed {})", ticks as f32 * TICK, seed);
    println!(
        "  enemies defeated: {}/{}",
        defeated.load(Ordering::Relaxed),
        spawned
    );
    println!(
        "  player health:    {:.0}/{:.0}",
        player.health(),
        player.max_health()
    );
    println!("  experience:       {}", player.experience());
    if let Some(stats) = sim.player_combat_stats() {
        match serde_json::to_string_pretty(&stats) {
            Ok(json) => println!("{}", json),
            Err(err) => log::warn!("Could not serialize player stats: {}", err),
        }
    }
    for enemy in sim.all_enemies() {
        println!(
            "  survivor {:<12} {:?} {:.0}/{:.0}",
            enemy.id, enemy.state, enemy.health, enemy.max_health
        );
    }

    ExitCode::SUCCESS
}
