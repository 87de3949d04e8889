#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that walks the player along the queued route.

use std::time::Duration;

use tilequest_core::{
    CadenceRules, Command, Direction, Event, LifeState, OccupancyView, PlayerSnapshot,
    RouteSnapshot,
};

/// Pure system that reacts to ticks and proposes player steps.
#[derive(Debug)]
pub struct Movement {
    step_period: Duration,
    accumulated: Duration,
}

impl Movement {
    /// Creates a movement system stepping at the configured cadence.
    #[must_use]
    pub fn new(cadence: &CadenceRules) -> Self {
        let step_period = cadence.player_step();
        Self {
            step_period,
            accumulated: step_period,
        }
    }

    /// Consumes world events and immutable views to emit movement commands.
    ///
    /// At most one command is emitted per tick. When the next route cell is
    /// no longer free the system asks the world to replan toward the original
    /// destination instead of stepping.
    pub fn handle(
        &mut self,
        events: &[Event],
        player: &PlayerSnapshot,
        route: Option<&RouteSnapshot>,
        occupancy_view: OccupancyView<'_>,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                self.accumulated = self.accumulated.saturating_add(*dt);
            }
        }

        let Some(route) = route.filter(|_| player.life == LifeState::Alive) else {
            self.accumulated = self.accumulated.min(self.step_period);
            return;
        };

        if self.accumulated < self.step_period {
            return;
        }
        self.accumulated = Duration::ZERO;

        let Some(next) = route.next() else {
            return;
        };

        match Direction::between(player.cell, next) {
            Some(direction) if occupancy_view.is_free(next) => {
                out.push(Command::StepPlayer { direction });
            }
            _ => out.push(Command::RequestMove {
                destination: route.destination,
            }),
        }
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::new(&CadenceRules::default())
    }
}
