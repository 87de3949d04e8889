//! Tuning surface for every adjustable constant of the simulation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::CellCoord;

/// Aggregated tuning knobs controlling every adjustable aspect of a session.
///
/// Every section deserializes with defaults, so a rules file only needs to
/// list the values it overrides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Grid dimensions and terrain generation.
    pub grid: GridRules,
    /// Player vitals.
    pub player: PlayerRules,
    /// Entity population and placement.
    pub spawn: SpawnRules,
    /// Attack timing, damage and drops.
    pub combat: CombatRules,
    /// Experience curve and rewards.
    pub progression: ProgressionRules,
    /// Tick driver cadence.
    pub cadence: CadenceRules,
    /// Enemy wander and pursuit behavior.
    pub behavior: BehaviorRules,
}

/// Grid dimensions and terrain generation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridRules {
    /// Number of columns in the grid.
    pub columns: u32,
    /// Number of rows in the grid.
    pub rows: u32,
    /// Number of blocked cells placed during terrain generation.
    pub blocked_cells: u32,
    /// Cell the player starts on and respawns at. Always left open.
    pub start: CellCoord,
}

impl Default for GridRules {
    fn default() -> Self {
        Self {
            columns: 10,
            rows: 10,
            blocked_cells: 12,
            start: CellCoord::new(0, 0),
        }
    }
}

/// Player vitals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerRules {
    /// Health restored on spawn and respawn.
    pub max_health: u32,
    /// Mana restored on spawn and respawn.
    pub max_mana: u32,
}

impl Default for PlayerRules {
    fn default() -> Self {
        Self {
            max_health: 100,
            max_mana: 30,
        }
    }
}

/// Entity population and placement parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnRules {
    /// Number of enemies kept on the grid.
    pub enemies: usize,
    /// Number of coins placed by a full respawn.
    pub coins: usize,
    /// Number of potions placed by a full respawn.
    pub potions: usize,
    /// Random draws attempted before a placement falls back.
    pub placement_attempts: u32,
    /// Cell used when no free cell was found in time.
    pub fallback: CellCoord,
    /// Enemy health before level scaling.
    pub enemy_base_health: u32,
    /// Enemy health added per player level, floored after multiplication.
    pub enemy_health_per_level: f64,
}

impl Default for SpawnRules {
    fn default() -> Self {
        Self {
            enemies: 3,
            coins: 6,
            potions: 2,
            placement_attempts: 500,
            fallback: CellCoord::new(0, 0),
            enemy_base_health: 20,
            enemy_health_per_level: 5.0,
        }
    }
}

/// Inclusive damage range sampled uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRange {
    /// Smallest damage roll.
    pub min: u32,
    /// Largest damage roll.
    pub max: u32,
}

impl DamageRange {
    /// Creates a range covering `min..=max`.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Attack timing, damage and drop parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    /// Minimum time between accepted player attacks, in milliseconds.
    pub player_cooldown_ms: u64,
    /// Damage dealt by a player attack.
    pub player_damage: DamageRange,
    /// Minimum time between strikes of a single enemy, in milliseconds.
    pub enemy_cooldown_ms: u64,
    /// Damage dealt by an enemy strike.
    pub enemy_damage: DamageRange,
    /// Probability that a defeated enemy drops a coin.
    pub coin_drop_chance: f64,
    /// Probability of a potion drop, rolled only when no coin dropped.
    pub potion_drop_chance: f64,
    /// Fraction of carried coins lost on death, rounded down.
    pub death_coin_penalty: f64,
}

impl CombatRules {
    /// Player attack cooldown as a duration.
    #[must_use]
    pub const fn player_cooldown(&self) -> Duration {
        Duration::from_millis(self.player_cooldown_ms)
    }

    /// Enemy strike cooldown as a duration.
    #[must_use]
    pub const fn enemy_cooldown(&self) -> Duration {
        Duration::from_millis(self.enemy_cooldown_ms)
    }
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            player_cooldown_ms: 400,
            player_damage: DamageRange::new(5, 9),
            enemy_cooldown_ms: 900,
            enemy_damage: DamageRange::new(3, 6),
            coin_drop_chance: 0.35,
            potion_drop_chance: 0.10,
            death_coin_penalty: 0.10,
        }
    }
}

/// Experience curve and reward parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionRules {
    /// Highest reachable level.
    pub max_level: u32,
    /// Multiplier of the experience curve `floor(base * level^exponent)`.
    pub experience_base: f64,
    /// Exponent of the experience curve.
    pub experience_exponent: f64,
    /// Experience granted per defeated enemy.
    pub kill_experience: u32,
    /// Experience granted per collected coin.
    pub coin_experience: u32,
    /// Experience granted per collected potion.
    pub potion_experience: u32,
    /// Health restored by a collected potion.
    pub potion_heal: u32,
    /// Coins required to complete the quest.
    pub quest_target: u32,
    /// Experience granted once when the quest completes.
    pub quest_bonus_experience: u32,
}

impl Default for ProgressionRules {
    fn default() -> Self {
        Self {
            max_level: 99,
            experience_base: 50.0,
            experience_exponent: 1.5,
            kill_experience: 15,
            coin_experience: 5,
            potion_experience: 2,
            potion_heal: 10,
            quest_target: 30,
            quest_bonus_experience: 30,
        }
    }
}

/// Tick driver cadence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceRules {
    /// Length of one simulation tick, in milliseconds.
    pub tick_ms: u64,
    /// Time the player needs per route step, in milliseconds.
    pub player_step_ms: u64,
}

impl CadenceRules {
    /// Tick length as a duration. Never zero.
    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Player step interval as a duration.
    #[must_use]
    pub const fn player_step(&self) -> Duration {
        Duration::from_millis(self.player_step_ms)
    }
}

impl Default for CadenceRules {
    fn default() -> Self {
        Self {
            tick_ms: 40,
            player_step_ms: 120,
        }
    }
}

/// Enemy wander and pursuit parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorRules {
    /// Interval between idle wander moves, in milliseconds.
    pub wander_interval_ms: u64,
    /// Interval between pursuit steps, in milliseconds.
    pub chase_step_ms: u64,
    /// Interval between pursuit route re-plans, in milliseconds.
    pub repath_interval_ms: u64,
    /// Time an enemy keeps pursuing after losing the player, in milliseconds.
    pub aggro_memory_ms: u64,
    /// Manhattan distance within which an enemy notices the player.
    pub detection_radius: u32,
}

impl BehaviorRules {
    /// Wander interval as a duration.
    #[must_use]
    pub const fn wander_interval(&self) -> Duration {
        Duration::from_millis(self.wander_interval_ms)
    }

    /// Pursuit step interval as a duration.
    #[must_use]
    pub const fn chase_step(&self) -> Duration {
        Duration::from_millis(self.chase_step_ms)
    }

    /// Pursuit re-plan interval as a duration.
    #[must_use]
    pub const fn repath_interval(&self) -> Duration {
        Duration::from_millis(self.repath_interval_ms)
    }

    /// Aggro memory window as a duration.
    #[must_use]
    pub const fn aggro_memory(&self) -> Duration {
        Duration::from_millis(self.aggro_memory_ms)
    }
}

impl Default for BehaviorRules {
    fn default() -> Self {
        Self {
            wander_interval_ms: 1_000,
            chase_step_ms: 300,
            repath_interval_ms: 400,
            aggro_memory_ms: 2_500,
            detection_radius: 4,
        }
    }
}
