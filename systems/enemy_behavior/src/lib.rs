#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Enemy behavior system: idle wandering and aggro pursuit of the player.
//!
//! Each enemy carries an [`EnemyBrain`] owned by this system. Brains are
//! advanced once per tick in enemy id order and translate into
//! `Command::StepEnemy` proposals that the world validates.

use std::{
    collections::{BTreeMap, VecDeque},
    time::Duration,
};

use tilequest_core::{
    BehaviorRules, CellCoord, Command, Direction, EnemyId, EnemySnapshot, EnemyView, Event,
    LifeState, OccupancyView, PlayerSnapshot,
};
use tilequest_world::{navigation::find_path, rng::SeededRng};
use tracing::debug;

/// Salt mixed into the world seed for the behavior stream.
const BEHAVIOR_STREAM_SALT: u32 = 0x5bd1_e995;

/// Behavior state of a single enemy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnemyBrain {
    /// Standing still until the next wander decision.
    Idle {
        /// Time of the next wander decision.
        next_decision: Duration,
    },
    /// Took a random step on the last wander decision.
    Wandering {
        /// Time of the next wander decision.
        next_decision: Duration,
    },
    /// Pursuing the player.
    Aggro {
        /// Time at which pursuit stops unless the player is seen again.
        memory_deadline: Duration,
        /// Cached route toward a cell next to the player.
        path: VecDeque<CellCoord>,
        /// Time at which the cached route is recomputed.
        repath_deadline: Duration,
        /// Time of the next pursuit step.
        next_step: Duration,
    },
}

impl EnemyBrain {
    fn idle(now: Duration, rules: &BehaviorRules) -> Self {
        Self::Idle {
            next_decision: now.saturating_add(rules.wander_interval()),
        }
    }

    /// Reports whether the enemy is pursuing the player.
    #[must_use]
    pub fn is_aggro(&self) -> bool {
        matches!(self, Self::Aggro { .. })
    }
}

/// Pure system that turns enemy brains into step commands.
#[derive(Debug)]
pub struct EnemyBehavior {
    rules: BehaviorRules,
    rng: SeededRng,
    brains: BTreeMap<EnemyId, EnemyBrain>,
}

impl EnemyBehavior {
    /// Creates a behavior system whose wander rolls derive from `seed`.
    #[must_use]
    pub fn new(seed: u32, rules: BehaviorRules) -> Self {
        Self {
            rules,
            rng: SeededRng::new(seed ^ BEHAVIOR_STREAM_SALT),
            brains: BTreeMap::new(),
        }
    }

    /// Brain of the provided enemy, if it has been evaluated yet.
    #[must_use]
    pub fn brain(&self, enemy: EnemyId) -> Option<&EnemyBrain> {
        self.brains.get(&enemy)
    }

    /// Consumes world events and immutable views to emit enemy steps.
    ///
    /// Brains are dropped when their enemy respawns or the population is
    /// regenerated. Nothing is emitted without a tick or while the player is
    /// dead.
    pub fn handle(
        &mut self,
        events: &[Event],
        now: Duration,
        player: &PlayerSnapshot,
        enemies: &EnemyView,
        occupancy_view: OccupancyView<'_>,
        out: &mut Vec<Command>,
    ) {
        let mut ticked = false;
        for event in events {
            match event {
                Event::TimeAdvanced { .. } => ticked = true,
                Event::EnemyRespawned { enemy, .. } => {
                    let _ = self.brains.remove(enemy);
                }
                Event::PlayerRespawned { .. } => self.brains.clear(),
                _ => {}
            }
        }

        if !ticked || player.life != LifeState::Alive {
            return;
        }

        for enemy in enemies.iter() {
            let brain = self
                .brains
                .remove(&enemy.id)
                .unwrap_or_else(|| EnemyBrain::idle(now, &self.rules));
            let brain = self.perceive(brain, enemy, player.cell, now);
            let brain = self.act(brain, enemy, now, occupancy_view, out);
            let _ = self.brains.insert(enemy.id, brain);
        }
    }

    fn perceive(
        &self,
        brain: EnemyBrain,
        enemy: &EnemySnapshot,
        player: CellCoord,
        now: Duration,
    ) -> EnemyBrain {
        let detected = enemy.cell.manhattan_distance(player) <= self.rules.detection_radius;
        let memory_deadline = now.saturating_add(self.rules.aggro_memory());

        match brain {
            EnemyBrain::Aggro {
                path,
                repath_deadline,
                next_step,
                ..
            } if detected => EnemyBrain::Aggro {
                memory_deadline,
                path,
                repath_deadline,
                next_step,
            },
            EnemyBrain::Aggro {
                memory_deadline: deadline,
                ..
            } if now >= deadline => {
                debug!(enemy = enemy.id.get(), "enemy lost track of player");
                EnemyBrain::idle(now, &self.rules)
            }
            EnemyBrain::Idle { .. } | EnemyBrain::Wandering { .. } if detected => {
                debug!(enemy = enemy.id.get(), "enemy spotted player");
                EnemyBrain::Aggro {
                    memory_deadline,
                    path: VecDeque::new(),
                    repath_deadline: now,
                    next_step: now.saturating_add(self.rules.chase_step()),
                }
            }
            other => other,
        }
    }

    fn act(
        &mut self,
        brain: EnemyBrain,
        enemy: &EnemySnapshot,
        now: Duration,
        occupancy_view: OccupancyView<'_>,
        out: &mut Vec<Command>,
    ) -> EnemyBrain {
        match brain {
            EnemyBrain::Idle { next_decision } | EnemyBrain::Wandering { next_decision }
                if now < next_decision =>
            {
                brain
            }
            EnemyBrain::Idle { .. } | EnemyBrain::Wandering { .. } => {
                self.wander(enemy, now, occupancy_view, out)
            }
            EnemyBrain::Aggro {
                memory_deadline,
                path,
                repath_deadline,
                next_step,
            } => self.pursue(
                enemy,
                now,
                occupancy_view,
                Pursuit {
                    memory_deadline,
                    path,
                    repath_deadline,
                    next_step,
                },
                out,
            ),
        }
    }

    fn wander(
        &mut self,
        enemy: &EnemySnapshot,
        now: Duration,
        occupancy_view: OccupancyView<'_>,
        out: &mut Vec<Command>,
    ) -> EnemyBrain {
        let next_decision = now.saturating_add(self.rules.wander_interval());
        let choice = usize::try_from(self.rng.below(5)).unwrap_or(Direction::ALL.len());
        let (columns, rows) = occupancy_view.dimensions();

        let step = Direction::ALL.get(choice).and_then(|direction| {
            enemy
                .cell
                .neighbor(*direction, columns, rows)
                .filter(|cell| occupancy_view.is_free_for_enemy(*cell))
                .map(|_| *direction)
        });

        match step {
            Some(direction) => {
                out.push(Command::StepEnemy {
                    enemy: enemy.id,
                    direction,
                });
                EnemyBrain::Wandering { next_decision }
            }
            None => EnemyBrain::Idle { next_decision },
        }
    }

    fn pursue(
        &self,
        enemy: &EnemySnapshot,
        now: Duration,
        occupancy_view: OccupancyView<'_>,
        mut pursuit: Pursuit,
        out: &mut Vec<Command>,
    ) -> EnemyBrain {
        let player = occupancy_view.player();
        if enemy.cell.is_adjacent(player) {
            pursuit.path.clear();
            return pursuit.into_brain();
        }

        let head_is_stale = pursuit.path.front().map_or(true, |head| {
            !head.is_adjacent(enemy.cell) || !occupancy_view.is_free_for_enemy(*head)
        });
        if now >= pursuit.repath_deadline || head_is_stale {
            pursuit.path = pursuit_route(enemy.cell, occupancy_view).into();
            pursuit.repath_deadline = now.saturating_add(self.rules.repath_interval());
        }

        if now < pursuit.next_step {
            return pursuit.into_brain();
        }
        pursuit.next_step = now.saturating_add(self.rules.chase_step());

        if let Some(next) = pursuit.path.pop_front() {
            if let Some(direction) = Direction::between(enemy.cell, next) {
                out.push(Command::StepEnemy {
                    enemy: enemy.id,
                    direction,
                });
            }
        }

        pursuit.into_brain()
    }
}

struct Pursuit {
    memory_deadline: Duration,
    path: VecDeque<CellCoord>,
    repath_deadline: Duration,
    next_step: Duration,
}

impl Pursuit {
    fn into_brain(self) -> EnemyBrain {
        EnemyBrain::Aggro {
            memory_deadline: self.memory_deadline,
            path: self.path,
            repath_deadline: self.repath_deadline,
            next_step: self.next_step,
        }
    }
}

/// Shortest route to a free cell next to the player.
///
/// Candidate cells are tried in canonical direction order around the player
/// and only a strictly shorter route replaces an earlier one.
fn pursuit_route(from: CellCoord, occupancy_view: OccupancyView<'_>) -> Vec<CellCoord> {
    let (columns, rows) = occupancy_view.dimensions();
    let player = occupancy_view.player();
    let mut best: Option<Vec<CellCoord>> = None;

    for direction in Direction::ALL {
        let Some(goal) = player.neighbor(direction, columns, rows) else {
            continue;
        };
        let Some(route) = find_path(from, goal, columns, rows, |cell| {
            occupancy_view.is_free_for_enemy(cell)
        }) else {
            continue;
        };

        if best.as_ref().map_or(true, |current| route.len() < current.len()) {
            best = Some(route);
        }
    }

    best.unwrap_or_default()
}
