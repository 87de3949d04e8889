//! Attack resolution, enemy defeat and player death.

use std::time::Duration;

use tilequest_core::{CellCoord, Clock, EnemyId, Event, PickupKind};
use tracing::{debug, info, warn};

use crate::World;

/// Fixed-period gate measured against a [`Clock`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cooldown {
    period: Duration,
    last: Option<Duration>,
}

impl Cooldown {
    /// Creates a cooldown that has never been triggered and is ready at once.
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    /// Reports whether a full period elapsed since the last trigger.
    #[must_use]
    pub fn is_ready(&self, clock: &impl Clock) -> bool {
        self.last
            .map_or(true, |last| clock.now().saturating_sub(last) >= self.period)
    }

    /// Starts a new period at the clock's current time.
    pub fn trigger(&mut self, clock: &impl Clock) {
        self.last = Some(clock.now());
    }

    /// Forgets the last trigger so the cooldown is ready again.
    pub fn clear(&mut self) {
        self.last = None;
    }
}

impl World {
    pub(crate) fn player_attack(&mut self, target: CellCoord, out_events: &mut Vec<Event>) {
        if !self.player.cell.is_adjacent(target) {
            return;
        }
        let Some(enemy) = self.occupancy.occupant(target) else {
            return;
        };
        let Some(index) = self.enemy_index(enemy) else {
            return;
        };
        if !self.player.attack.is_ready(&self.clock) {
            return;
        }

        self.player.attack.trigger(&self.clock);
        let range = self.rules.combat.player_damage;
        let damage = self.combat_rng.range_inclusive(range.min, range.max);

        let target_enemy = &mut self.enemies[index];
        target_enemy.health = target_enemy.health.saturating_sub(damage);
        let remaining = target_enemy.health;
        out_events.push(Event::EnemyDamaged {
            enemy,
            damage,
            remaining,
        });

        if remaining == 0 {
            self.defeat_enemy(index, out_events);
        }
    }

    fn defeat_enemy(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let (enemy, cell) = {
            let fallen = &self.enemies[index];
            (fallen.id, fallen.cell)
        };

        let combat = &self.rules.combat;
        let (coin_chance, potion_chance) = (combat.coin_drop_chance, combat.potion_drop_chance);
        let drop = if self.combat_rng.chance(coin_chance) {
            self.coins.push(cell);
            Some(PickupKind::Coin)
        } else if self.combat_rng.chance(potion_chance) {
            self.potions.push(cell);
            Some(PickupKind::Potion)
        } else {
            None
        };
        debug!(enemy = enemy.get(), ?cell, ?drop, "enemy defeated");
        out_events.push(Event::EnemyDefeated { enemy, cell, drop });

        self.award_experience(self.rules.progression.kill_experience, out_events);
        self.relocate_enemy(index, enemy, cell, out_events);
    }

    fn relocate_enemy(
        &mut self,
        index: usize,
        enemy: EnemyId,
        from: CellCoord,
        out_events: &mut Vec<Event>,
    ) {
        self.occupancy.vacate(enemy, from);

        let mut exclude = self.coins.clone();
        exclude.extend_from_slice(&self.potions);
        let mut cell = self.random_empty_cell(&exclude);
        if self.is_held(cell) {
            warn!(
                enemy = enemy.get(),
                ?cell,
                "fallback cell is held, enemy respawns where it fell"
            );
            cell = from;
        }
        let max_health = self.enemy_max_health();

        let respawned = &mut self.enemies[index];
        respawned.cell = cell;
        respawned.max_health = max_health;
        respawned.health = max_health;
        respawned.strike.trigger(&self.clock);
        self.occupancy.occupy(enemy, cell);

        out_events.push(Event::EnemyRespawned {
            enemy,
            cell,
            max_health,
        });
    }

    pub(crate) fn enemy_strike(&mut self, enemy: EnemyId, out_events: &mut Vec<Event>) {
        let Some(index) = self.enemy_index(enemy) else {
            return;
        };
        let attacker = &self.enemies[index];
        if !attacker.cell.is_adjacent(self.player.cell) || !attacker.strike.is_ready(&self.clock)
        {
            return;
        }

        self.enemies[index].strike.trigger(&self.clock);
        let range = self.rules.combat.enemy_damage;
        let damage = self.combat_rng.range_inclusive(range.min, range.max);

        self.player.health = self.player.health.saturating_sub(damage);
        let remaining = self.player.health;
        out_events.push(Event::PlayerDamaged {
            enemy,
            damage,
            remaining,
        });

        if remaining == 0 {
            self.kill_player(out_events);
        }
    }

    fn kill_player(&mut self, out_events: &mut Vec<Event>) {
        let penalty = self.rules.combat.death_coin_penalty.clamp(0.0, 1.0);
        let coins_lost = (f64::from(self.player.coins) * penalty).floor() as u32;
        self.player.coins = self.player.coins.saturating_sub(coins_lost);
        self.route = None;

        info!(
            coins_lost,
            coins = self.player.coins,
            cell = ?self.player.cell,
            "player died"
        );
        out_events.push(Event::PlayerDied { coins_lost });
    }
}
