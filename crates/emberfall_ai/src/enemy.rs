//! Enemy kinds, base stats, level scaling, and the enemy state machine

use std::fmt;
use std::str::FromStr;

use emberfall_combat::{CombatEntity, EntityId};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::perception::Perception;
use crate::state_machine::{State, StateMachine};

/// Behavioral state of an enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyState {
    Idle,
    /// Reserved for scripted routes; reacts to the player like `Idle`
    Patrolling,
    Chasing,
    Attacking,
    Dead,
}

impl EnemyState {
    /// Whether the enemy is pursuing a target in this state
    pub fn is_engaged(self) -> bool {
        matches!(self, Self::Chasing | Self::Attacking)
    }
}

impl State for EnemyState {
    fn on_enter(&self) {
        log::trace!("Enemy entering {:?}", self);
    }
}

/// Build the idle -> chasing -> attacking machine shared by every enemy kind
pub fn enemy_state_machine() -> StateMachine<EnemyState, Perception> {
    use EnemyState::*;

    let mut fsm = StateMachine::new(Idle);
    fsm.add_transition(Idle, Chasing, Perception::detects_player);
    fsm.add_transition(Patrolling, Chasing, Perception::detects_player);

    fsm.add_transition_priority(Chasing, Idle, Perception::lost_player, 1);
    fsm.add_transition(Chasing, Attacking, Perception::in_attack_range);

    fsm.add_transition_priority(Attacking, Idle, Perception::lost_player, 1);
    fsm.add_transition(Attacking, Chasing, |p: &Perception| !p.in_attack_range());
    fsm
}

/// Error for an unrecognized kind name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

/// Closed set of enemy kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    Goblin,
    Wolf,
    Orc,
    Skeleton,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 4] = [Self::Goblin, Self::Wolf, Self::Orc, Self::Skeleton];

    /// Lowercase identifier, used in ids
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Goblin => "goblin",
            Self::Wolf => "wolf",
            Self::Orc => "orc",
            Self::Skeleton => "skeleton",
        }
    }

    /// Display name
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Goblin => "Goblin",
            Self::Wolf => "Wolf",
            Self::Orc => "Orc",
            Self::Skeleton => "Skeleton",
        }
    }

    /// Level 1 stats
    pub fn base_stats(self) -> BaseStats {
        match self {
            Self::Goblin => BaseStats {
                health: 30.0,
                attack_power: 8.0,
                defense: 1.0,
                attack_range: 2.0,
                attack_cooldown: 1.5,
                speed: 3.0,
            },
            Self::Wolf => BaseStats {
                health: 25.0,
                attack_power: 10.0,
                defense: 0.5,
                attack_range: 1.8,
                attack_cooldown: 1.0,
                speed: 5.5,
            },
            Self::Orc => BaseStats {
                health: 60.0,
                attack_power: 14.0,
                defense: 3.0,
                attack_range: 2.2,
                attack_cooldown: 2.0,
                speed: 2.5,
            },
            Self::Skeleton => BaseStats {
                health: 40.0,
                attack_power: 10.0,
                defense: 2.0,
                attack_range: 2.0,
                attack_cooldown: 1.8,
                speed: 3.2,
            },
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnemyKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Per-kind stats before level scaling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub health: f32,
    pub attack_power: f32,
    pub defense: f32,
    pub attack_range: f32,
    pub attack_cooldown: f32,
    /// Chase speed in units per second
    pub speed: f32,
}

impl BaseStats {
    /// Scale by level. Level 1 returns the base values unchanged.
    pub fn at_level(self, level: u32, config: &AiConfig) -> Self {
        let steps = level.saturating_sub(1) as f32;
        Self {
            health: self.health * (1.0 + config.health_growth * steps),
            attack_power: self.attack_power * (1.0 + config.attack_growth * steps),
            defense: self.defense * (1.0 + config.defense_growth * steps),
            ..self
        }
    }
}

/// Enemy-only data kept by the enemy system; combat numbers live in the registry
pub(crate) struct EnemyBrain {
    pub kind: EnemyKind,
    pub level: u32,
    pub speed: f32,
    pub target: Option<EntityId>,
    pub fsm: StateMachine<EnemyState, Perception>,
}

impl EnemyBrain {
    pub fn new(kind: EnemyKind, level: u32, speed: f32) -> Self {
        Self {
            kind,
            level,
            speed,
            target: None,
            fsm: enemy_state_machine(),
        }
    }

    pub fn state(&self) -> EnemyState {
        *self.fsm.current()
    }

    pub fn record(&self, entity: &CombatEntity) -> EnemyRecord {
        EnemyRecord {
            id: entity.id.clone(),
            kind: self.kind,
            name: self.kind.display_name().to_string(),
            level: self.level,
            state: self.state(),
            target: self.target.clone(),
            position: entity.position,
            health: entity.health,
            max_health: entity.max_health,
            attack_power: entity.attack_power,
            defense: entity.defense,
            attack_range: entity.attack_range,
            attack_cooldown: entity.attack_cooldown,
            last_attack_time: entity.last_attack_time,
            speed: self.speed,
        }
    }
}

/// Read-only view of one enemy: its combat entity plus its AI data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyRecord {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub name: String,
    pub level: u32,
    pub state: EnemyState,
    pub target: Option<EntityId>,
    pub position: Vec3,
    pub health: f32,
    pub max_health: f32,
    pub attack_power: f32,
    pub defense: f32,
    pub attack_range: f32,
    pub attack_cooldown: f32,
    pub last_attack_time: f32,
    pub speed: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::SenseConfig;

    #[test]
    fn test_parse_kind() {
        assert_eq!("goblin".parse::<EnemyKind>(), Ok(EnemyKind::Goblin));
        assert_eq!("Wolf".parse::<EnemyKind>(), Ok(EnemyKind::Wolf));
        assert_eq!(
            "dragon".parse::<EnemyKind>(),
            Err(UnknownKind("dragon".to_string()))
        );
    }

    #[test]
    fn test_level_one_is_base() {
        let config = AiConfig::default();
        for kind in EnemyKind::ALL {
            assert_eq!(kind.base_stats().at_level(1, &config), kind.base_stats());
        }
    }

    #[test]
    fn test_level_scaling_strictly_increases() {
        let config = AiConfig::default();
        let base = EnemyKind::Goblin.base_stats();
        let mut previous = base;
        for level in 2..=10 {
            let scaled = base.at_level(level, &config);
            assert!(scaled.health > previous.health);
            assert!(scaled.attack_power > previous.attack_power);
            assert_eq!(scaled.attack_cooldown, base.attack_cooldown);
            previous = scaled;
        }
    }

    #[test]
    fn test_wolves_outrun_goblins() {
        assert!(EnemyKind::Wolf.base_stats().speed > EnemyKind::Goblin.base_stats().speed);
    }

    #[test]
    fn test_enemy_machine_bands() {
        let sense = SenseConfig::new(&AiConfig::default(), 2.0);
        let at = |d: f32| Perception {
            distance: d,
            sense,
        };
        let mut fsm = enemy_state_machine();

        assert_eq!(fsm.update(&at(50.0), 0.1), None);
        assert_eq!(fsm.update(&at(10.0), 0.1), Some(EnemyState::Chasing));
        assert_eq!(fsm.update(&at(1.5), 0.1), Some(EnemyState::Attacking));
        assert_eq!(fsm.update(&at(1.5), 0.1), None);
        assert_eq!(fsm.update(&at(5.0), 0.1), Some(EnemyState::Chasing));
        assert_eq!(fsm.update(&at(1.0), 0.1), Some(EnemyState::Attacking));
        // Straight from attacking to idle when the player is far away
        assert_eq!(fsm.update(&at(40.0), 0.1), Some(EnemyState::Idle));
    }
}
