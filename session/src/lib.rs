#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Single-player Tilequest session.
//!
//! [`SimulationSession`] owns the authoritative world, the three tick systems
//! and a [`SaveStore`]. Player input resolves immediately; stepwise work runs
//! on fixed-period ticks issued by [`SimulationSession::advance`].

use std::{mem, time::Duration};

use tilequest_core::{
    CellCoord, Command, Direction, EnemySnapshot, Event, LifeState, PlayerSnapshot,
    QuestSnapshot, RouteSnapshot, Rules, SaveState,
};
use tilequest_system_enemy_behavior::{EnemyBehavior, EnemyBrain};
use tilequest_system_enemy_combat::EnemyCombat;
use tilequest_system_movement::Movement;
use tilequest_world::{self as world, persistence, query, terrain::Terrain, World};
use tracing::{debug, info, warn};

mod store;

pub use store::{FileStore, MemoryStore, SaveStore, StoreError};

/// Enemy state together with its behavior.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnemyStatus {
    /// World-side state of the enemy.
    pub snapshot: EnemySnapshot,
    /// Behavior state, absent until the enemy is first evaluated.
    pub brain: Option<EnemyBrain>,
}

/// Session driver that owns the world, its systems and the save store.
#[derive(Debug)]
pub struct SimulationSession<S> {
    world: World,
    movement: Movement,
    enemy_combat: EnemyCombat,
    behavior: EnemyBehavior,
    store: S,
    tick: Duration,
    pending: Duration,
    unseen: Vec<Event>,
    events: Vec<Event>,
}

impl<S: SaveStore> SimulationSession<S> {
    /// Starts a fresh session generated from `seed` and persists it.
    pub fn new(seed: u32, rules: Rules, store: S) -> Self {
        let world = World::new(seed, rules.clone());
        let mut session = Self::assemble(world, &rules, store);
        session.persist();
        session
    }

    /// Resumes the session held by `store`, or starts a fresh one.
    ///
    /// A missing document starts a session with a random seed. A document
    /// that fails to decode or validate is logged and replaced the same way.
    pub fn load_or_new(rules: Rules, store: S) -> Self {
        let Some(document) = store.load() else {
            let seed = rand::random::<u32>();
            info!(seed, "no saved session, starting fresh");
            return Self::new(seed, rules, store);
        };

        let restored = persistence::decode(&document)
            .and_then(|state| World::from_save(&state, rules.clone()));
        match restored {
            Ok(world) => {
                info!(seed = query::seed(&world), "resumed saved session");
                Self::assemble(world, &rules, store)
            }
            Err(error) => {
                let seed = rand::random::<u32>();
                warn!(%error, seed, "discarding unreadable save");
                Self::new(seed, rules, store)
            }
        }
    }

    fn assemble(world: World, rules: &Rules, store: S) -> Self {
        let seed = query::seed(&world);
        Self {
            movement: Movement::new(&rules.cadence),
            enemy_combat: EnemyCombat::new(),
            behavior: EnemyBehavior::new(seed, rules.behavior.clone()),
            store,
            tick: rules.cadence.tick(),
            pending: Duration::ZERO,
            unseen: Vec::new(),
            events: Vec::new(),
            world,
        }
    }

    /// Plans a route toward `destination`, replacing any queued route.
    pub fn request_move(&mut self, destination: CellCoord) {
        self.dispatch(Command::RequestMove { destination });
    }

    /// Attacks the enemy standing on `target`.
    pub fn request_attack(&mut self, target: CellCoord) {
        self.dispatch(Command::PlayerAttack { target });
    }

    /// Attacks when an enemy stands next to the player on `cell`, otherwise
    /// plans a route there.
    pub fn handle_tap(&mut self, cell: CellCoord) {
        let player = query::player(&self.world).cell;
        let enemy_there = query::enemy_view(&self.world).at(cell).is_some();

        if enemy_there && player.is_adjacent(cell) {
            self.request_attack(cell);
        } else {
            self.request_move(cell);
        }
    }

    /// Moves the player a single cell.
    pub fn step(&mut self, direction: Direction) {
        self.dispatch(Command::StepPlayer { direction });
    }

    /// Revives a dead player. Does nothing while the player is alive.
    pub fn respawn(&mut self) {
        self.dispatch(Command::Respawn);
    }

    /// Clears quest progress.
    pub fn reset_quest(&mut self) {
        self.dispatch(Command::ResetQuest);
    }

    /// Advances simulated time, running one tick per elapsed tick period.
    ///
    /// Time shorter than a period is carried into the next call.
    pub fn advance(&mut self, dt: Duration) {
        self.pending = self.pending.saturating_add(dt);
        while self.pending >= self.tick {
            self.pending -= self.tick;
            self.run_tick();
        }
    }

    fn run_tick(&mut self) {
        self.dispatch(Command::Tick { dt: self.tick });

        let mut commands = Vec::new();
        let player = query::player(&self.world);
        let route = query::route(&self.world);
        self.movement.handle(
            &self.unseen,
            &player,
            route.as_ref(),
            query::occupancy_view(&self.world),
            &mut commands,
        );
        self.dispatch_all(&mut commands);

        let player = query::player(&self.world);
        let enemies = query::enemy_view(&self.world);
        self.enemy_combat
            .handle(&self.unseen, &player, &enemies, &mut commands);
        self.dispatch_all(&mut commands);

        let player = query::player(&self.world);
        let enemies = query::enemy_view(&self.world);
        self.behavior.handle(
            &self.unseen,
            query::now(&self.world),
            &player,
            &enemies,
            query::occupancy_view(&self.world),
            &mut commands,
        );
        self.unseen.clear();
        self.dispatch_all(&mut commands);
    }

    fn dispatch_all(&mut self, commands: &mut Vec<Command>) {
        for command in commands.drain(..) {
            self.dispatch(command);
        }
    }

    fn dispatch(&mut self, command: Command) {
        let mut produced = Vec::new();
        world::apply(&mut self.world, command, &mut produced);
        if produced.is_empty() {
            return;
        }

        let needs_save = produced.iter().any(|event| {
            matches!(
                event,
                Event::PickupCollected { .. }
                    | Event::ExperienceGained { .. }
                    | Event::LevelUp { .. }
                    | Event::QuestCompleted { .. }
                    | Event::QuestReset
                    | Event::PlayerDied { .. }
                    | Event::PlayerRespawned { .. }
            )
        });

        self.unseen.extend(produced.iter().cloned());
        self.events.extend(
            produced
                .into_iter()
                .filter(|event| !matches!(event, Event::TimeAdvanced { .. })),
        );

        if needs_save {
            self.persist();
        }
    }

    fn persist(&mut self) {
        let state = self.world.save_state();
        let document = match persistence::encode(&state) {
            Ok(document) => document,
            Err(error) => {
                warn!(%error, "failed to encode session");
                return;
            }
        };

        match self.store.store(&document) {
            Ok(()) => debug!(seed = state.seed, "session persisted"),
            Err(error) => warn!(%error, "failed to persist session"),
        }
    }

    /// Drains the events produced since the last call, ticks excluded.
    pub fn take_events(&mut self) -> Vec<Event> {
        mem::take(&mut self.events)
    }

    /// Current player state.
    #[must_use]
    pub fn player(&self) -> PlayerSnapshot {
        query::player(&self.world)
    }

    /// Whether the player is alive.
    #[must_use]
    pub fn life(&self) -> LifeState {
        query::life(&self.world)
    }

    /// Enemies in id order, with their behavior state.
    #[must_use]
    pub fn enemies(&self) -> Vec<EnemyStatus> {
        query::enemy_view(&self.world)
            .into_vec()
            .into_iter()
            .map(|snapshot| EnemyStatus {
                brain: self.behavior.brain(snapshot.id).cloned(),
                snapshot,
            })
            .collect()
    }

    /// Cells holding coins.
    #[must_use]
    pub fn coins(&self) -> &[CellCoord] {
        query::coins(&self.world)
    }

    /// Cells holding potions.
    #[must_use]
    pub fn potions(&self) -> &[CellCoord] {
        query::potions(&self.world)
    }

    /// Route the player is following, if any.
    #[must_use]
    pub fn route(&self) -> Option<RouteSnapshot> {
        query::route(&self.world)
    }

    /// Coin quest progress.
    #[must_use]
    pub fn quest(&self) -> QuestSnapshot {
        query::quest(&self.world)
    }

    /// Generated terrain.
    #[must_use]
    pub fn terrain(&self) -> &Terrain {
        query::terrain(&self.world)
    }

    /// Seed the session was generated from.
    #[must_use]
    pub fn seed(&self) -> u32 {
        query::seed(&self.world)
    }

    /// Simulated time elapsed in this session.
    #[must_use]
    pub fn now(&self) -> Duration {
        query::now(&self.world)
    }

    /// Persisted portion of the session.
    #[must_use]
    pub fn save_state(&self) -> SaveState {
        self.world.save_state()
    }

    /// Writes the session to the store immediately.
    pub fn save(&mut self) {
        self.persist();
    }

    /// Underlying world, for read-only queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Store the session persists into.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}
