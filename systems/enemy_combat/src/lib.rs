#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits enemy strike commands for adjacent, rested enemies.

use tilequest_core::{Command, EnemyView, Event, LifeState, PlayerSnapshot};

/// Enemy combat system that queues strikes once per tick.
#[derive(Debug, Default)]
pub struct EnemyCombat {
    scratch: Vec<Command>,
}

impl EnemyCombat {
    /// Creates a new enemy combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::EnemyStrike` for every enemy orthogonally adjacent to a
    /// living player whose strike cooldown has elapsed.
    ///
    /// Strikes are only evaluated on ticks, in enemy id order.
    pub fn handle(
        &mut self,
        events: &[Event],
        player: &PlayerSnapshot,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) {
        if player.life != LifeState::Alive {
            return;
        }

        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        self.scratch.clear();

        for enemy in enemies.iter() {
            if enemy.strike_ready && enemy.cell.is_adjacent(player.cell) {
                self.scratch.push(Command::EnemyStrike { enemy: enemy.id });
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}
