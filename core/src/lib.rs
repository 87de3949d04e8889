#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tilequest simulation.
//!
//! This crate defines the message surface that connects the session driver,
//! the authoritative world, and pure systems. Drivers submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems
//! to react to deterministically. Systems consume event streams, query
//! immutable snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod rules;
mod save;

pub use rules::{
    BehaviorRules, CadenceRules, CombatRules, DamageRange, GridRules, PlayerRules,
    ProgressionRules, Rules, SpawnRules,
};
pub use save::{SaveState, SavedPlayer};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Plans a route from the player's cell toward the destination, replacing
    /// any queued route.
    RequestMove {
        /// Cell the player wants to reach.
        destination: CellCoord,
    },
    /// Moves the player a single cell. Steps that match the head of the queued
    /// route consume it; any other step discards the route.
    StepPlayer {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Requests a player attack against the enemy standing on the target cell.
    PlayerAttack {
        /// Cell holding the enemy under attack.
        target: CellCoord,
    },
    /// Requests that an enemy advance a single step in the specified direction.
    StepEnemy {
        /// Identifier of the enemy attempting to move.
        enemy: EnemyId,
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Requests that an adjacent enemy strike the player.
    EnemyStrike {
        /// Identifier of the attacking enemy.
        enemy: EnemyId,
    },
    /// Revives a dead player at the start cell and regenerates the population.
    Respawn,
    /// Clears quest progress so the quest can be completed again.
    ResetQuest,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a route toward the destination was queued.
    RoutePlanned {
        /// Cell the route leads to.
        destination: CellCoord,
        /// Number of steps in the queued route.
        steps: usize,
    },
    /// Reports that no route toward the destination exists any more.
    RouteAbandoned {
        /// Cell the abandoned route was heading toward.
        destination: CellCoord,
    },
    /// Confirms that the player moved between two cells.
    PlayerMoved {
        /// Cell the player occupied before moving.
        from: CellCoord,
        /// Cell the player occupies after the move.
        to: CellCoord,
    },
    /// Confirms that the player picked up an item.
    PickupCollected {
        /// Kind of item collected.
        kind: PickupKind,
        /// Cell the item was lying on.
        cell: CellCoord,
    },
    /// Confirms that a player attack landed.
    EnemyDamaged {
        /// Identifier of the enemy that was hit.
        enemy: EnemyId,
        /// Damage rolled for the hit.
        damage: u32,
        /// Health left after the hit.
        remaining: u32,
    },
    /// Announces that an enemy was defeated.
    EnemyDefeated {
        /// Identifier of the defeated enemy.
        enemy: EnemyId,
        /// Cell the enemy fell on.
        cell: CellCoord,
        /// Item dropped by the enemy, if any.
        drop: Option<PickupKind>,
    },
    /// Confirms that a defeated enemy was relocated and healed.
    EnemyRespawned {
        /// Identifier of the respawned enemy.
        enemy: EnemyId,
        /// Cell the enemy now occupies.
        cell: CellCoord,
        /// Maximum health assigned for the current player level.
        max_health: u32,
    },
    /// Confirms that an enemy moved between two cells.
    EnemyMoved {
        /// Identifier of the enemy that moved.
        enemy: EnemyId,
        /// Cell the enemy occupied before moving.
        from: CellCoord,
        /// Cell the enemy occupies after the move.
        to: CellCoord,
    },
    /// Confirms that an enemy strike hit the player.
    PlayerDamaged {
        /// Identifier of the attacking enemy.
        enemy: EnemyId,
        /// Damage rolled for the strike.
        damage: u32,
        /// Player health left after the strike.
        remaining: u32,
    },
    /// Reports experience granted to the player.
    ExperienceGained {
        /// Amount of experience awarded.
        amount: u32,
    },
    /// Announces that the player reached a new level.
    LevelUp {
        /// Level reached.
        level: u32,
    },
    /// Reports quest progress after a coin pickup.
    QuestAdvanced {
        /// Progress toward the quest target.
        progress: u32,
    },
    /// Announces that the quest target was reached.
    QuestCompleted {
        /// Bonus experience granted for completion.
        bonus: u32,
    },
    /// Confirms that quest progress was cleared.
    QuestReset,
    /// Announces that the player died.
    PlayerDied {
        /// Coins removed as the death penalty.
        coins_lost: u32,
    },
    /// Announces that the player was revived at the start cell.
    PlayerRespawned {
        /// Cell the player was placed on.
        cell: CellCoord,
    },
}

/// Cardinal movement directions available to entities.
///
/// Variant order matches the canonical neighbor order used by path searches:
/// increasing x, decreasing x, increasing y, decreasing y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward increasing x.
    East,
    /// Movement toward decreasing x.
    West,
    /// Movement toward increasing y.
    South,
    /// Movement toward decreasing y.
    North,
}

impl Direction {
    /// All directions in canonical neighbor order.
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::West,
        Direction::South,
        Direction::North,
    ];

    /// Direction of a single orthogonal step between two cells, if they are
    /// adjacent.
    #[must_use]
    pub fn between(from: CellCoord, to: CellCoord) -> Option<Self> {
        let x_diff = from.x().abs_diff(to.x());
        let y_diff = from.y().abs_diff(to.y());

        if x_diff + y_diff != 1 {
            return None;
        }

        if x_diff == 1 {
            if to.x() > from.x() {
                Some(Self::East)
            } else {
                Some(Self::West)
            }
        } else if to.y() > from.y() {
            Some(Self::South)
        } else {
            Some(Self::North)
        }
    }
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x().abs_diff(other.x()) + self.y().abs_diff(other.y())
    }

    /// Reports whether the two cells share an edge.
    #[must_use]
    pub fn is_adjacent(self, other: CellCoord) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Neighboring cell in the provided direction, if it lies inside a grid of
    /// the given dimensions.
    #[must_use]
    pub fn neighbor(self, direction: Direction, columns: u32, rows: u32) -> Option<CellCoord> {
        let (x, y) = match direction {
            Direction::East => (self.x.checked_add(1)?, self.y),
            Direction::West => (self.x.checked_sub(1)?, self.y),
            Direction::South => (self.x, self.y.checked_add(1)?),
            Direction::North => (self.x, self.y.checked_sub(1)?),
        };

        if x < columns && y < rows {
            Some(CellCoord::new(x, y))
        } else {
            None
        }
    }
}

/// Kinds of items lying on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PickupKind {
    /// Currency that also advances the quest.
    Coin,
    /// Healing item.
    Potion,
}

/// Life cycle of the player character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifeState {
    /// Accepts movement and attack input.
    Alive,
    /// Rejects movement and attack input until an explicit respawn.
    Dead,
}

/// Source of monotonic timestamps used for cooldown checks.
pub trait Clock {
    /// Time elapsed since the clock started.
    fn now(&self) -> Duration;
}

/// Clock advanced explicitly by simulation ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimulationClock {
    elapsed: Duration,
}

impl SimulationClock {
    /// Creates a clock positioned at the provided timestamp.
    #[must_use]
    pub const fn at(elapsed: Duration) -> Self {
        Self { elapsed }
    }

    /// Moves the clock forward by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }
}

impl Clock for SimulationClock {
    fn now(&self) -> Duration {
        self.elapsed
    }
}

/// Immutable representation of the player's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerSnapshot {
    /// Grid cell currently occupied by the player.
    pub cell: CellCoord,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Current mana.
    pub mana: u32,
    /// Maximum mana.
    pub max_mana: u32,
    /// Coins carried.
    pub coins: u32,
    /// Potions collected.
    pub potions: u32,
    /// Current level.
    pub level: u32,
    /// Experience accumulated toward the next level.
    pub experience: u32,
    /// Experience required to reach the next level, or zero at the level cap.
    pub experience_to_next: u32,
    /// Whether the player is alive.
    pub life: LifeState,
    /// Indicates whether the attack cooldown has elapsed.
    pub attack_ready: bool,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Grid cell currently occupied by the enemy.
    pub cell: CellCoord,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Indicates whether the enemy's strike cooldown has elapsed.
    pub strike_ready: bool,
}

/// Read-only snapshot describing all enemies on the grid.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the enemy standing on the provided cell, if any.
    #[must_use]
    pub fn at(&self, cell: CellCoord) -> Option<&EnemySnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.cell == cell)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Queued player route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteSnapshot {
    /// Cell the route was planned toward.
    pub destination: CellCoord,
    /// Remaining cells, nearest first, destination last.
    pub cells: Vec<CellCoord>,
}

impl RouteSnapshot {
    /// Next cell the player will enter.
    #[must_use]
    pub fn next(&self) -> Option<CellCoord> {
        self.cells.first().copied()
    }
}

/// Progress of the coin-collection quest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuestSnapshot {
    /// Coins collected toward the target.
    pub progress: u32,
    /// Coins required to complete the quest.
    pub target: u32,
    /// Indicates whether the reward was already granted.
    pub completed: bool,
}

/// Read-only view combining terrain and dynamic occupancy.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    blocked: &'a [bool],
    enemies: &'a [Option<EnemyId>],
    player: CellCoord,
    columns: u32,
    rows: u32,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided cell slices.
    ///
    /// Both slices are laid out row-major with `columns * rows` entries.
    #[must_use]
    pub fn new(
        blocked: &'a [bool],
        enemies: &'a [Option<EnemyId>],
        player: CellCoord,
        columns: u32,
        rows: u32,
    ) -> Self {
        Self {
            blocked,
            enemies,
            player,
            columns,
            rows,
        }
    }

    /// Reports whether the cell lies inside the grid and is not blocked
    /// terrain.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.blocked.get(index).copied())
            .map_or(false, |blocked| !blocked)
    }

    /// Returns the enemy occupying the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<EnemyId> {
        self.index(cell)
            .and_then(|index| self.enemies.get(index).copied().flatten())
    }

    /// Reports whether the cell is walkable and free of enemies.
    #[must_use]
    pub fn is_free(&self, cell: CellCoord) -> bool {
        self.is_walkable(cell) && self.occupant(cell).is_none()
    }

    /// Reports whether an enemy may enter the cell: it must be free and not
    /// hold the player.
    #[must_use]
    pub fn is_free_for_enemy(&self, cell: CellCoord) -> bool {
        self.is_free(cell) && cell != self.player
    }

    /// Cell currently occupied by the player.
    #[must_use]
    pub const fn player(&self) -> CellCoord {
        self.player
    }

    /// Provides the dimensions of the underlying grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.x() < self.columns && cell.y() < self.rows {
            let y = usize::try_from(cell.y()).ok()?;
            let x = usize::try_from(cell.x()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(y * width + x)
        } else {
            None
        }
    }
}
