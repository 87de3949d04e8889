#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative simulation state for Tilequest.
//!
//! The [`World`] owns terrain, the player, enemies, pickups and the quest.
//! Every mutation flows through [`apply`], which validates a [`Command`] and
//! reports what happened as [`Event`] values. Read access goes through the
//! [`query`] module.

use std::collections::VecDeque;

use tilequest_core::{
    CellCoord, Command, Direction, EnemyId, Event, OccupancyView, Rules, SaveState,
    SimulationClock,
};
use tracing::debug;

mod combat;
mod entities;
pub mod navigation;
mod occupancy;
pub mod persistence;
pub mod progression;
pub mod rng;
pub mod terrain;

pub use combat::Cooldown;

use entities::{Enemy, Player};
use occupancy::OccupancyGrid;
use persistence::PersistenceError;
use progression::Quest;
use rng::SeededRng;
use terrain::Terrain;

/// Salt mixed into the seed for the combat roll stream.
const COMBAT_STREAM_SALT: u32 = 0x9e37_79b9;

/// Represents the authoritative Tilequest world state.
#[derive(Debug)]
pub struct World {
    rules: Rules,
    seed: u32,
    terrain: Terrain,
    generation: SeededRng,
    combat_rng: SeededRng,
    clock: SimulationClock,
    player: Player,
    enemies: Vec<Enemy>,
    occupancy: OccupancyGrid,
    coins: Vec<CellCoord>,
    potions: Vec<CellCoord>,
    quest: Quest,
    route: Option<Route>,
}

impl World {
    /// Creates a fresh world whose terrain and population derive from `seed`.
    ///
    /// Terrain generation and the initial spawn pass share one stream, in that
    /// order.
    #[must_use]
    pub fn new(seed: u32, rules: Rules) -> Self {
        let mut generation = SeededRng::new(seed);
        let terrain = Terrain::generate_with(&mut generation, &rules.grid);
        let player = Player::fresh(&rules);
        Self::assemble(seed, rules, generation, terrain, player, Quest::default())
    }

    /// Restores a persisted session.
    ///
    /// Terrain is regenerated from the saved seed and the population is
    /// spawned fresh around the restored player.
    pub fn from_save(save: &SaveState, rules: Rules) -> Result<Self, PersistenceError> {
        let mut generation = SeededRng::new(save.seed);
        let terrain = Terrain::generate_with(&mut generation, &rules.grid);
        let player = Player::restore(&save.player, &terrain, &rules)?;
        let quest = persistence::restore_quest(save, &rules.progression)?;
        Ok(Self::assemble(save.seed, rules, generation, terrain, player, quest))
    }

    fn assemble(
        seed: u32,
        rules: Rules,
        generation: SeededRng,
        terrain: Terrain,
        player: Player,
        quest: Quest,
    ) -> Self {
        let occupancy = OccupancyGrid::new(terrain.columns(), terrain.rows());
        let mut world = Self {
            seed,
            terrain,
            generation,
            combat_rng: SeededRng::new(seed ^ COMBAT_STREAM_SALT),
            clock: SimulationClock::default(),
            player,
            enemies: Vec::new(),
            occupancy,
            coins: Vec::new(),
            potions: Vec::new(),
            quest,
            route: None,
            rules,
        };
        world.spawn_all();
        world
    }

    /// Captures the persisted portion of the session.
    #[must_use]
    pub fn save_state(&self) -> SaveState {
        SaveState {
            seed: self.seed,
            player: self.player.record(),
            quest_progress: self.quest.progress(),
            quest_completed: self.quest.is_completed(),
        }
    }

    fn occupancy_view(&self) -> OccupancyView<'_> {
        OccupancyView::new(
            self.terrain.cells(),
            self.occupancy.cells(),
            self.player.cell,
            self.terrain.columns(),
            self.terrain.rows(),
        )
    }

    fn plan_route(&mut self, destination: CellCoord, out_events: &mut Vec<Event>) {
        if destination == self.player.cell {
            self.route = None;
            return;
        }

        let view = self.occupancy_view();
        let (columns, rows) = view.dimensions();
        let path = navigation::find_path(self.player.cell, destination, columns, rows, |cell| {
            view.is_free(cell)
        });

        match path {
            Some(cells) => {
                debug!(?destination, steps = cells.len(), "route planned");
                out_events.push(Event::RoutePlanned {
                    destination,
                    steps: cells.len(),
                });
                self.route = Some(Route {
                    destination,
                    cells: cells.into(),
                });
            }
            None => {
                // A fresh request that fails leaves the current route alone;
                // only a failed replan toward the same destination drops it.
                let replanning = self
                    .route
                    .as_ref()
                    .map_or(false, |route| route.destination == destination);
                if replanning {
                    self.route = None;
                    debug!(?destination, "route abandoned");
                    out_events.push(Event::RouteAbandoned { destination });
                }
            }
        }
    }

    fn step_player(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        let from = self.player.cell;
        let Some(next) = from.neighbor(direction, self.terrain.columns(), self.terrain.rows())
        else {
            return;
        };

        let follows_route = self
            .route
            .as_ref()
            .and_then(Route::next)
            .map_or(false, |head| head == next);
        if !follows_route {
            self.route = None;
        }

        if !self.occupancy_view().is_free(next) {
            return;
        }

        if let Some(route) = self.route.as_mut() {
            let _ = route.cells.pop_front();
            if route.cells.is_empty() {
                self.route = None;
            }
        }

        self.player.cell = next;
        out_events.push(Event::PlayerMoved { from, to: next });
        self.collect_at(next, out_events);
    }

    fn step_enemy(
        &mut self,
        enemy: EnemyId,
        direction: Direction,
        out_events: &mut Vec<Event>,
    ) {
        let Some(index) = self.enemy_index(enemy) else {
            return;
        };
        let from = self.enemies[index].cell;
        let Some(next) = from.neighbor(direction, self.terrain.columns(), self.terrain.rows())
        else {
            return;
        };

        if !self.occupancy_view().is_free_for_enemy(next) {
            return;
        }

        self.occupancy.vacate(enemy, from);
        self.occupancy.occupy(enemy, next);
        self.enemies[index].cell = next;
        out_events.push(Event::EnemyMoved {
            enemy,
            from,
            to: next,
        });
    }

    fn enemy_index(&self, enemy: EnemyId) -> Option<usize> {
        self.enemies.iter().position(|candidate| candidate.id == enemy)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Movement, attacks and enemy actions are ignored while the player is dead;
/// ticks, respawns and quest resets are always processed.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let alive = world.player.is_alive();

    match command {
        Command::Tick { dt } => {
            world.clock.advance(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::RequestMove { destination } => {
            if alive {
                world.plan_route(destination, out_events);
            }
        }
        Command::StepPlayer { direction } => {
            if alive {
                world.step_player(direction, out_events);
            }
        }
        Command::PlayerAttack { target } => {
            if alive {
                world.player_attack(target, out_events);
            }
        }
        Command::StepEnemy { enemy, direction } => {
            if alive {
                world.step_enemy(enemy, direction, out_events);
            }
        }
        Command::EnemyStrike { enemy } => {
            if alive {
                world.enemy_strike(enemy, out_events);
            }
        }
        Command::Respawn => {
            if !alive {
                world.respawn_player(out_events);
            }
        }
        Command::ResetQuest => {
            world.quest.reset();
            out_events.push(Event::QuestReset);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{Route, World};
    use crate::{progression::Progress, terrain::Terrain};
    use tilequest_core::{
        CellCoord, Clock, EnemySnapshot, EnemyView, LifeState, OccupancyView, PlayerSnapshot,
        QuestSnapshot, RouteSnapshot, Rules,
    };

    /// Seed the terrain was generated from.
    #[must_use]
    pub fn seed(world: &World) -> u32 {
        world.seed
    }

    /// Rules the world was created with.
    #[must_use]
    pub fn rules(world: &World) -> &Rules {
        &world.rules
    }

    /// Provides read-only access to the generated terrain.
    #[must_use]
    pub fn terrain(world: &World) -> &Terrain {
        &world.terrain
    }

    /// Current simulation timestamp.
    #[must_use]
    pub fn now(world: &World) -> Duration {
        world.clock.now()
    }

    /// Captures the player's current state.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        let player = &world.player;
        let progress: Progress = player.progress;
        PlayerSnapshot {
            cell: player.cell,
            health: player.health,
            max_health: player.max_health,
            mana: player.mana,
            max_mana: player.max_mana,
            coins: player.coins,
            potions: player.potions,
            level: progress.level(),
            experience: progress.experience(),
            experience_to_next: progress.experience_to_next(&world.rules.progression),
            life: life(world),
            attack_ready: player.attack.is_ready(&world.clock),
        }
    }

    /// Whether the player is alive.
    #[must_use]
    pub fn life(world: &World) -> LifeState {
        if world.player.is_alive() {
            LifeState::Alive
        } else {
            LifeState::Dead
        }
    }

    /// Captures a read-only view of the enemies on the grid.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .enemies
            .iter()
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                cell: enemy.cell,
                health: enemy.health,
                max_health: enemy.max_health,
                strike_ready: enemy.strike.is_ready(&world.clock),
            })
            .collect();
        EnemyView::from_snapshots(snapshots)
    }

    /// Cells holding coins, in spawn order.
    #[must_use]
    pub fn coins(world: &World) -> &[CellCoord] {
        &world.coins
    }

    /// Cells holding potions, in spawn order.
    #[must_use]
    pub fn potions(world: &World) -> &[CellCoord] {
        &world.potions
    }

    /// Player route still queued, if any.
    #[must_use]
    pub fn route(world: &World) -> Option<RouteSnapshot> {
        world.route.as_ref().map(Route::snapshot)
    }

    /// Progress of the coin quest.
    #[must_use]
    pub fn quest(world: &World) -> QuestSnapshot {
        QuestSnapshot {
            progress: world.quest.progress(),
            target: world.rules.progression.quest_target,
            completed: world.quest.is_completed(),
        }
    }

    /// Exposes terrain and enemy occupancy for path planning.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        world.occupancy_view()
    }

    /// Reports whether the cell is walkable terrain.
    #[must_use]
    pub fn is_free_static(world: &World, cell: CellCoord) -> bool {
        world.terrain.is_walkable(cell)
    }

    /// Reports whether the cell is walkable and not held by an enemy.
    #[must_use]
    pub fn is_free_dynamic(world: &World, cell: CellCoord) -> bool {
        world.occupancy_view().is_free(cell)
    }
}

/// Player route with the destination it was planned toward.
#[derive(Clone, Debug)]
struct Route {
    destination: CellCoord,
    cells: VecDeque<CellCoord>,
}

impl Route {
    fn next(&self) -> Option<CellCoord> {
        self.cells.front().copied()
    }

    fn snapshot(&self) -> tilequest_core::RouteSnapshot {
        tilequest_core::RouteSnapshot {
            destination: self.destination,
            cells: self.cells.iter().copied().collect(),
        }
    }
}
