//! Player and enemy records plus the spawn policy that places them.

use tilequest_core::{CellCoord, EnemyId, Event, PickupKind, Rules, SavedPlayer};
use tracing::{debug, info, warn};

use crate::{
    combat::Cooldown,
    persistence::{self, PersistenceError},
    progression::{Progress, QuestUpdate},
    terrain::Terrain,
    World,
};

#[derive(Clone, Debug)]
pub(crate) struct Player {
    pub(crate) cell: CellCoord,
    pub(crate) health: u32,
    pub(crate) max_health: u32,
    pub(crate) mana: u32,
    pub(crate) max_mana: u32,
    pub(crate) coins: u32,
    pub(crate) potions: u32,
    pub(crate) progress: Progress,
    pub(crate) attack: Cooldown,
}

impl Player {
    pub(crate) fn fresh(rules: &Rules) -> Self {
        Self {
            cell: rules.grid.start,
            health: rules.player.max_health,
            max_health: rules.player.max_health,
            mana: rules.player.max_mana,
            max_mana: rules.player.max_mana,
            coins: 0,
            potions: 0,
            progress: Progress::new(),
            attack: Cooldown::new(rules.combat.player_cooldown()),
        }
    }

    pub(crate) fn restore(
        saved: &SavedPlayer,
        terrain: &Terrain,
        rules: &Rules,
    ) -> Result<Self, PersistenceError> {
        persistence::validate_player(saved, terrain, rules)?;

        Ok(Self {
            cell: CellCoord::new(saved.x, saved.y),
            health: saved.hp,
            max_health: saved.max_hp,
            mana: saved.mp.min(saved.max_mp),
            max_mana: saved.max_mp,
            coins: saved.coins,
            potions: saved.potions,
            progress: Progress::restore(saved.level, saved.experience),
            attack: Cooldown::new(rules.combat.player_cooldown()),
        })
    }

    pub(crate) fn record(&self) -> SavedPlayer {
        SavedPlayer {
            x: self.cell.x(),
            y: self.cell.y(),
            hp: self.health,
            max_hp: self.max_health,
            mp: self.mana,
            max_mp: self.max_mana,
            coins: self.coins,
            potions: self.potions,
            level: self.progress.level(),
            experience: self.progress.experience(),
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.health > 0
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) cell: CellCoord,
    pub(crate) health: u32,
    pub(crate) max_health: u32,
    pub(crate) strike: Cooldown,
}

impl World {
    /// Draws a cell that is dynamically free, not held by the player and not
    /// listed in `exclude`.
    ///
    /// Candidates come from the world's generation stream. When no candidate
    /// qualifies within the configured number of attempts the fallback cell
    /// is returned instead.
    pub fn random_empty_cell(&mut self, exclude: &[CellCoord]) -> CellCoord {
        let (columns, rows) = (self.terrain.columns(), self.terrain.rows());

        for _ in 0..self.rules.spawn.placement_attempts {
            let candidate = self.generation.cell(columns, rows);
            if candidate == self.player.cell || exclude.contains(&candidate) {
                continue;
            }
            if self.occupancy_view().is_free(candidate) {
                return candidate;
            }
        }

        let fallback = self.rules.spawn.fallback;
        warn!(
            attempts = self.rules.spawn.placement_attempts,
            ?fallback,
            "degraded placement: no empty cell found"
        );
        fallback
    }

    /// Maximum enemy health for the player's current level.
    pub(crate) fn enemy_max_health(&self) -> u32 {
        let spawn = &self.rules.spawn;
        let scaled = (f64::from(self.player.progress.level()) * spawn.enemy_health_per_level)
            .floor()
            .max(0.0) as u32;
        spawn.enemy_base_health.saturating_add(scaled)
    }

    /// True when the player or an enemy stands on `cell`.
    pub(crate) fn is_held(&self, cell: CellCoord) -> bool {
        cell == self.player.cell || self.occupancy.occupant(cell).is_some()
    }

    /// Places a full-health enemy on a random empty cell outside `exclude`.
    ///
    /// Returns `None` without spawning when placement degraded to a fallback
    /// cell that is already held.
    pub(crate) fn spawn_enemy(
        &mut self,
        id: EnemyId,
        exclude: &[CellCoord],
    ) -> Option<CellCoord> {
        let cell = self.random_empty_cell(exclude);
        if self.is_held(cell) {
            warn!(
                enemy = id.get(),
                ?cell,
                "fallback cell is held, enemy not spawned"
            );
            return None;
        }
        let max_health = self.enemy_max_health();

        self.occupancy.occupy(id, cell);
        self.enemies.push(Enemy {
            id,
            cell,
            health: max_health,
            max_health,
            strike: Cooldown::new(self.rules.combat.enemy_cooldown()),
        });
        Some(cell)
    }

    /// Clears and repopulates enemies, coins and potions.
    pub(crate) fn spawn_all(&mut self) {
        self.enemies.clear();
        self.occupancy.clear();
        self.coins.clear();
        self.potions.clear();

        let mut placed = Vec::new();

        for index in 0..self.rules.spawn.enemies {
            let id = EnemyId::new(u32::try_from(index).unwrap_or(u32::MAX));
            if let Some(cell) = self.spawn_enemy(id, &placed) {
                placed.push(cell);
            }
        }

        for _ in 0..self.rules.spawn.coins {
            let cell = self.random_empty_cell(&placed);
            placed.push(cell);
            self.coins.push(cell);
        }

        for _ in 0..self.rules.spawn.potions {
            let cell = self.random_empty_cell(&placed);
            placed.push(cell);
            self.potions.push(cell);
        }

        debug!(
            enemies = self.enemies.len(),
            coins = self.coins.len(),
            potions = self.potions.len(),
            "population spawned"
        );
    }

    /// Picks up every item lying on `cell`.
    pub(crate) fn collect_at(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        while let Some(position) = self.coins.iter().position(|coin| *coin == cell) {
            let _ = self.coins.remove(position);
            self.collect_coin(cell, out_events);
        }

        while let Some(position) = self.potions.iter().position(|potion| *potion == cell) {
            let _ = self.potions.remove(position);
            self.collect_potion(cell, out_events);
        }
    }

    fn collect_coin(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        self.player.coins = self.player.coins.saturating_add(1);
        out_events.push(Event::PickupCollected {
            kind: PickupKind::Coin,
            cell,
        });
        self.award_experience(self.rules.progression.coin_experience, out_events);

        match self.quest.record_coin(self.rules.progression.quest_target) {
            QuestUpdate::Unchanged => {}
            QuestUpdate::Advanced { progress } => {
                out_events.push(Event::QuestAdvanced { progress });
            }
            QuestUpdate::Completed { progress } => {
                let bonus = self.rules.progression.quest_bonus_experience;
                info!(progress, bonus, "quest completed");
                out_events.push(Event::QuestAdvanced { progress });
                out_events.push(Event::QuestCompleted { bonus });
                self.award_experience(bonus, out_events);
            }
        }
    }

    fn collect_potion(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let player = &mut self.player;
        player.potions = player.potions.saturating_add(1);
        player.health = player
            .health
            .saturating_add(self.rules.progression.potion_heal)
            .min(player.max_health);
        out_events.push(Event::PickupCollected {
            kind: PickupKind::Potion,
            cell,
        });
        self.award_experience(self.rules.progression.potion_experience, out_events);
    }

    /// Grants experience and announces every level reached.
    pub(crate) fn award_experience(&mut self, amount: u32, out_events: &mut Vec<Event>) {
        out_events.push(Event::ExperienceGained { amount });

        let before = self.player.progress.level();
        let gained = self
            .player
            .progress
            .grant(amount, &self.rules.progression);
        for level in (before + 1)..=(before + gained) {
            info!(level, "level up");
            out_events.push(Event::LevelUp { level });
        }
    }

    /// Revives the player at the start cell and regenerates the population.
    pub(crate) fn respawn_player(&mut self, out_events: &mut Vec<Event>) {
        let start = self.rules.grid.start;
        let player = &mut self.player;
        player.health = player.max_health;
        player.mana = player.max_mana;
        player.cell = start;
        player.attack.clear();
        self.route = None;

        self.spawn_all();
        info!(cell = ?start, "player respawned");
        out_events.push(Event::PlayerRespawned { cell: start });
    }
}

#[cfg(test)]
mod tests {
    use tilequest_core::{CellCoord, GridRules, Rules, SpawnRules};

    use crate::{query, World};

    #[test]
    fn placement_is_deterministic_per_seed() {
        let mut first = World::new(9, Rules::default());
        let mut second = World::new(9, Rules::default());

        for _ in 0..20 {
            assert_eq!(first.random_empty_cell(&[]), second.random_empty_cell(&[]));
        }
    }

    #[test]
    fn spawned_population_does_not_overlap() {
        let world = World::new(2024, Rules::default());
        let player = query::player(&world).cell;
        let mut cells: Vec<CellCoord> = query::enemy_view(&world)
            .iter()
            .map(|enemy| enemy.cell)
            .collect();
        cells.extend_from_slice(query::coins(&world));
        cells.extend_from_slice(query::potions(&world));

        assert_eq!(cells.len(), 3 + 6 + 2);
        for (index, cell) in cells.iter().enumerate() {
            assert_ne!(*cell, player);
            assert!(query::is_free_static(&world, *cell));
            assert!(!cells[index + 1..].contains(cell));
        }
    }

    #[test]
    fn exhausted_attempts_fall_back() {
        let rules = Rules {
            spawn: SpawnRules {
                enemies: 0,
                coins: 0,
                potions: 0,
                placement_attempts: 0,
                fallback: CellCoord::new(4, 4),
                ..SpawnRules::default()
            },
            ..Rules::default()
        };
        let mut world = World::new(5, rules);

        assert_eq!(world.random_empty_cell(&[]), CellCoord::new(4, 4));
    }

    #[test]
    fn held_fallback_cell_is_never_doubly_occupied() {
        let rules = Rules {
            grid: GridRules {
                columns: 2,
                rows: 2,
                blocked_cells: 0,
                ..GridRules::default()
            },
            spawn: SpawnRules {
                enemies: 4,
                coins: 0,
                potions: 0,
                ..SpawnRules::default()
            },
            ..Rules::default()
        };
        let world = World::new(3, rules);
        let player = query::player(&world).cell;
        let cells: Vec<CellCoord> = query::enemy_view(&world)
            .iter()
            .map(|enemy| enemy.cell)
            .collect();

        assert_eq!(cells.len(), 3);
        assert!(!cells.contains(&player));
        for (index, cell) in cells.iter().enumerate() {
            assert!(!cells[index + 1..].contains(cell));
        }
    }

    #[test]
    fn enemy_health_scales_with_level() {
        let world = World::new(1, Rules::default());
        assert!(query::enemy_view(&world)
            .iter()
            .all(|enemy| enemy.max_health == 25 && enemy.health == 25));
    }
}
