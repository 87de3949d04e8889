use std::fmt::Write as _;

use tilequest_core::{CellCoord, Event, PickupKind};
use tilequest_session::{EnemyStatus, SaveStore, SimulationSession};

/// Draws the grid as text, one row per line.
///
/// `@` player, `E` enemy, `A` enemy in pursuit, `$` coin, `+` potion,
/// `#` blocked, `*` queued route, `.` open ground.
pub(crate) fn render<S: SaveStore>(session: &SimulationSession<S>) -> String {
    let terrain = session.terrain();
    let player = session.player().cell;
    let enemies = session.enemies();
    let route = session.route().map(|route| route.cells).unwrap_or_default();

    let mut board = String::new();
    for y in 0..terrain.rows() {
        for x in 0..terrain.columns() {
            let cell = CellCoord::new(x, y);
            board.push(glyph(session, cell, player, &enemies, &route));
        }
        board.push('\n');
    }
    board
}

fn glyph<S: SaveStore>(
    session: &SimulationSession<S>,
    cell: CellCoord,
    player: CellCoord,
    enemies: &[EnemyStatus],
    route: &[CellCoord],
) -> char {
    if cell == player {
        return '@';
    }
    if let Some(enemy) = enemies.iter().find(|enemy| enemy.snapshot.cell == cell) {
        let pursuing = enemy.brain.as_ref().is_some_and(|brain| brain.is_aggro());
        return if pursuing { 'A' } else { 'E' };
    }
    if session.coins().contains(&cell) {
        return '$';
    }
    if session.potions().contains(&cell) {
        return '+';
    }
    if !session.terrain().is_walkable(cell) {
        return '#';
    }
    if route.contains(&cell) {
        return '*';
    }
    '.'
}

/// One-line summary of the player and quest.
pub(crate) fn status<S: SaveStore>(session: &SimulationSession<S>) -> String {
    let player = session.player();
    let quest = session.quest();
    let mut line = String::new();
    let _ = write!(
        line,
        "hp {}/{}  mp {}/{}  lvl {} ({} xp, {} to next)  coins {}  potions {}  quest {}/{}{}  at ({}, {})",
        player.health,
        player.max_health,
        player.mana,
        player.max_mana,
        player.level,
        player.experience,
        player.experience_to_next,
        player.coins,
        player.potions,
        quest.progress,
        quest.target,
        if quest.completed { " done" } else { "" },
        player.cell.x(),
        player.cell.y(),
    );
    line
}

/// Message shown to the player for an event, if it is worth telling.
pub(crate) fn describe(event: &Event) -> Option<String> {
    let message = match event {
        Event::RouteAbandoned { destination } => format!(
            "no way through to ({}, {})",
            destination.x(),
            destination.y()
        ),
        Event::PickupCollected {
            kind: PickupKind::Coin,
            ..
        } => "picked up a coin".to_owned(),
        Event::PickupCollected {
            kind: PickupKind::Potion,
            ..
        } => "drank a potion".to_owned(),
        Event::EnemyDamaged {
            enemy,
            damage,
            remaining,
        } => format!(
            "hit enemy {} for {damage} ({remaining} hp left)",
            enemy.get()
        ),
        Event::EnemyDefeated { enemy, drop, .. } => match drop {
            Some(PickupKind::Coin) => format!("enemy {} defeated, it dropped a coin", enemy.get()),
            Some(PickupKind::Potion) => {
                format!("enemy {} defeated, it dropped a potion", enemy.get())
            }
            None => format!("enemy {} defeated", enemy.get()),
        },
        Event::PlayerDamaged {
            enemy,
            damage,
            remaining,
        } => format!(
            "enemy {} hits you for {damage} ({remaining} hp left)",
            enemy.get()
        ),
        Event::LevelUp { level } => format!("level up! you are now level {level}"),
        Event::QuestCompleted { bonus } => format!("quest complete! +{bonus} xp"),
        Event::QuestReset => "quest progress cleared".to_owned(),
        Event::PlayerDied { coins_lost } => {
            format!("you died and lost {coins_lost} coins; type `respawn`")
        }
        Event::PlayerRespawned { .. } => "you wake up at the start".to_owned(),
        _ => return None,
    };
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilequest_core::{EnemyId, Rules};
    use tilequest_session::MemoryStore;

    #[test]
    fn board_matches_grid_dimensions() {
        let session = SimulationSession::new(1337, Rules::default(), MemoryStore::default());
        let board = render(&session);
        let lines: Vec<&str> = board.lines().collect();

        assert_eq!(lines.len(), 10);
        assert!(lines.iter().all(|line| line.chars().count() == 10));
        assert!(lines[0].starts_with('@'));
        assert_eq!(board.matches('E').count(), 3);
        assert_eq!(board.matches('$').count(), 6);
        assert_eq!(board.matches('+').count(), 2);
    }

    #[test]
    fn quiet_events_have_no_message() {
        assert!(describe(&Event::ExperienceGained { amount: 5 }).is_none());
        assert_eq!(
            describe(&Event::PlayerDied { coins_lost: 2 }).as_deref(),
            Some("you died and lost 2 coins; type `respawn`")
        );
        assert!(describe(&Event::EnemyDamaged {
            enemy: EnemyId::new(1),
            damage: 7,
            remaining: 18,
        })
        .is_some_and(|message| message.contains("18 hp left")));
    }
}
