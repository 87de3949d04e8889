use std::time::Duration;

use tilequest_core::{
    BehaviorRules, CellCoord, Direction, Event, LifeState, PlayerRules, Rules, SaveState,
};
use tilequest_session::{MemoryStore, SaveStore, SimulationSession};
use tilequest_world::{navigation::find_path, persistence, query};

/// Rules whose enemies never notice or wander toward the player.
fn static_enemy_rules() -> Rules {
    Rules {
        behavior: BehaviorRules {
            detection_radius: 0,
            wander_interval_ms: u64::MAX,
            ..BehaviorRules::default()
        },
        ..Rules::default()
    }
}

/// Free cell next to some enemy that the player can reach, and that enemy's cell.
fn reachable_stand(session: &SimulationSession<MemoryStore>) -> (CellCoord, CellCoord) {
    let world = session.world();
    let view = query::occupancy_view(world);
    let (columns, rows) = view.dimensions();
    let start = session.player().cell;

    for enemy in session.enemies() {
        for direction in Direction::ALL {
            let Some(stand) = enemy.snapshot.cell.neighbor(direction, columns, rows) else {
                continue;
            };
            if find_path(start, stand, columns, rows, |cell| view.is_free(cell)).is_some() {
                return (stand, enemy.snapshot.cell);
            }
        }
    }

    panic!("no enemy is reachable");
}

fn script(session: &mut SimulationSession<MemoryStore>) -> Vec<Event> {
    let mut log = Vec::new();
    for (x, y) in [(4, 4), (9, 0), (0, 9), (6, 3)] {
        session.handle_tap(CellCoord::new(x, y));
        session.advance(Duration::from_millis(1_730));
        log.extend(session.take_events());
    }
    session.step(Direction::East);
    session.advance(Duration::from_secs(3));
    log.extend(session.take_events());
    log
}

#[test]
fn sessions_replay_identically_for_a_seed() {
    let mut first = SimulationSession::new(1337, Rules::default(), MemoryStore::default());
    let mut second = SimulationSession::new(1337, Rules::default(), MemoryStore::default());

    let first_log = script(&mut first);
    let second_log = script(&mut second);

    assert!(!first_log.is_empty());
    assert_eq!(first_log, second_log);
    assert_eq!(first.save_state(), second.save_state());
    assert_eq!(first.enemies(), second.enemies());
    assert_eq!(first.now(), second.now());
}

#[test]
fn partial_ticks_carry_over() {
    let mut session = SimulationSession::new(5, Rules::default(), MemoryStore::default());

    session.advance(Duration::from_millis(30));
    assert_eq!(session.now(), Duration::ZERO);

    session.advance(Duration::from_millis(30));
    assert_eq!(session.now(), Duration::from_millis(40));

    session.advance(Duration::from_millis(100));
    assert_eq!(session.now(), Duration::from_millis(160));
}

#[test]
fn new_session_is_persisted_and_resumed() {
    let mut session = SimulationSession::new(99, static_enemy_rules(), MemoryStore::default());
    let (stand, _) = reachable_stand(&session);
    session.request_move(stand);
    session.advance(Duration::from_secs(4));
    assert_eq!(session.player().cell, stand);
    session.save();

    let store = session.store().clone();
    let resumed = SimulationSession::load_or_new(static_enemy_rules(), store);

    assert_eq!(resumed.seed(), 99);
    assert_eq!(resumed.player().cell, stand);
    assert_eq!(resumed.terrain(), session.terrain());
    assert_eq!(resumed.save_state(), session.save_state());
}

#[test]
fn corrupt_save_falls_back_to_fresh_session() {
    let store = MemoryStore::with_document("{\"seed\": 12, \"player\": ");
    let session = SimulationSession::load_or_new(Rules::default(), store);

    let document = session.store().load().expect("fresh session is persisted");
    let state = persistence::decode(&document).expect("replacement save is valid");
    assert_eq!(state.seed, session.seed());
    assert_eq!(session.player().level, 1);
    assert_eq!(session.player().cell, CellCoord::new(0, 0));
}

#[test]
fn invalid_save_falls_back_to_fresh_session() {
    let fresh = SimulationSession::new(8, Rules::default(), MemoryStore::default());
    let mut state: SaveState = fresh.save_state();
    state.player.coins = 12;
    state.quest_progress = 31;
    let document = persistence::encode(&state).expect("encodable");

    let session =
        SimulationSession::load_or_new(Rules::default(), MemoryStore::with_document(document));

    assert_eq!(session.player().coins, 0);
    assert_eq!(session.quest().progress, 0);
}

#[test]
fn tap_attacks_adjacent_enemy_and_moves_elsewhere() {
    let mut session = SimulationSession::new(2024, static_enemy_rules(), MemoryStore::default());
    let (stand, enemy_cell) = reachable_stand(&session);
    session.request_move(stand);
    session.advance(Duration::from_secs(4));
    assert_eq!(session.player().cell, stand);
    let _ = session.take_events();

    session.handle_tap(enemy_cell);
    let events = session.take_events();
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::EnemyDamaged { .. })));
    assert_eq!(session.player().cell, stand);

    session.handle_tap(session.player().cell);
    assert!(session.take_events().is_empty());
}

#[test]
fn death_is_persisted_and_blocks_input_until_respawn() {
    let rules = Rules {
        player: PlayerRules {
            max_health: 5,
            ..PlayerRules::default()
        },
        ..static_enemy_rules()
    };
    let mut session = SimulationSession::new(31, rules, MemoryStore::default());
    let (stand, _) = reachable_stand(&session);
    session.request_move(stand);
    session.advance(Duration::from_secs(10));

    assert_eq!(session.life(), LifeState::Dead);
    assert!(session
        .take_events()
        .iter()
        .any(|event| matches!(event, Event::PlayerDied { .. })));
    let saved = session.store().document().expect("death is persisted");
    let saved = persistence::decode(saved).expect("valid save");
    assert_eq!(saved.player.hp, 0);

    let dead_at = session.player().cell;
    session.request_move(CellCoord::new(0, 0));
    session.step(Direction::South);
    session.advance(Duration::from_secs(2));
    assert_eq!(session.player().cell, dead_at);
    assert!(session.take_events().is_empty());

    session.respawn();
    assert_eq!(session.life(), LifeState::Alive);
    assert_eq!(session.player().cell, CellCoord::new(0, 0));
    assert_eq!(session.player().health, 5);
    let saved = persistence::decode(session.store().document().expect("respawn is persisted"))
        .expect("valid save");
    assert_eq!(saved.player.hp, 5);
}

#[test]
fn kill_experience_is_persisted_without_explicit_save() {
    let mut session = SimulationSession::new(2024, static_enemy_rules(), MemoryStore::default());
    let (stand, enemy_cell) = reachable_stand(&session);
    session.request_move(stand);
    session.advance(Duration::from_secs(4));
    assert_eq!(session.player().cell, stand);
    let _ = session.take_events();

    let mut defeated = false;
    for _ in 0..10 {
        session.request_attack(enemy_cell);
        defeated = session
            .take_events()
            .iter()
            .any(|event| matches!(event, Event::EnemyDefeated { .. }));
        if defeated {
            break;
        }
        session.advance(Duration::from_millis(400));
    }
    assert!(defeated);

    let saved = persistence::decode(session.store().document().expect("session is persisted"))
        .expect("valid save");
    assert!(session.player().experience >= 15);
    assert_eq!(saved.player.experience, session.player().experience);
    assert_eq!(saved.player.level, session.player().level);
}
