use std::time::Duration;

use tilequest_core::{
    CellCoord, Command, CombatRules, DamageRange, Direction, EnemyId, Event, GridRules,
    LifeState, PickupKind, ProgressionRules, Rules, SaveState, SavedPlayer, SpawnRules,
};
use tilequest_world::{self as world, query, terrain::Terrain, World};

fn tick(world: &mut World, millis: u64) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::Tick {
            dt: Duration::from_millis(millis),
        },
        &mut events,
    );
}

/// Walks the player along a planned route, one step at a time.
fn walk_to(world: &mut World, goal: CellCoord, log: &mut Vec<Event>) -> bool {
    world::apply(world, Command::RequestMove { destination: goal }, log);

    while let Some(route) = query::route(world) {
        let from = query::player(world).cell;
        let Some(direction) = route.next().and_then(|next| Direction::between(from, next)) else {
            break;
        };
        world::apply(world, Command::StepPlayer { direction }, log);
        if query::player(world).cell == from {
            break;
        }
    }

    query::player(world).cell == goal
}

/// Moves the player next to some enemy and returns that enemy and its cell.
fn approach_enemy(world: &mut World, log: &mut Vec<Event>) -> (EnemyId, CellCoord) {
    let (columns, rows) = query::occupancy_view(world).dimensions();
    let enemies: Vec<_> = query::enemy_view(world).into_vec();

    for enemy in enemies {
        for direction in Direction::ALL {
            let Some(stand) = enemy.cell.neighbor(direction, columns, rows) else {
                continue;
            };
            if query::player(world).cell == stand {
                return (enemy.id, enemy.cell);
            }
            if query::is_free_dynamic(world, stand) && walk_to(world, stand, log) {
                return (enemy.id, enemy.cell);
            }
        }
    }

    panic!("no enemy is reachable");
}

fn saved_player(hp: u32, coins: u32) -> SavedPlayer {
    SavedPlayer {
        x: 0,
        y: 0,
        hp,
        max_hp: 100,
        mp: 30,
        max_mp: 30,
        coins,
        potions: 0,
        level: 1,
        experience: 0,
    }
}

#[test]
fn seed_1337_terrain_keeps_start_open() {
    let rules = Rules::default();
    let terrain = Terrain::generate(1337, &rules.grid);

    assert_eq!(terrain.blocked_count(), 12);
    assert!(terrain.is_walkable(CellCoord::new(0, 0)));

    let world = World::new(1337, rules);
    assert_eq!(query::terrain(&world), &terrain);
    assert_eq!(query::seed(&world), 1337);
}

#[test]
fn enemy_dies_once_on_third_heavy_hit() {
    let rules = Rules {
        combat: CombatRules {
            player_damage: DamageRange::new(9, 9),
            coin_drop_chance: 1.0,
            ..CombatRules::default()
        },
        ..Rules::default()
    };
    let mut world = World::new(1337, rules);
    let mut log = Vec::new();
    let (enemy, target) = approach_enemy(&mut world, &mut log);
    let coins_before = query::coins(&world).len();
    let experience_before = query::player(&world).experience;

    let mut events = Vec::new();
    for _ in 0..4 {
        world::apply(&mut world, Command::PlayerAttack { target }, &mut events);
        tick(&mut world, 400);
    }

    let remaining: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemyDamaged { remaining, .. } => Some(*remaining),
            _ => None,
        })
        .collect();
    assert_eq!(remaining, vec![16, 7, 0]);

    let defeats = events
        .iter()
        .filter(|event| matches!(event, Event::EnemyDefeated { .. }))
        .count();
    assert_eq!(defeats, 1);
    assert!(events.contains(&Event::EnemyDefeated {
        enemy,
        cell: target,
        drop: Some(PickupKind::Coin),
    }));
    assert!(events.contains(&Event::ExperienceGained { amount: 15 }));

    let respawned = query::enemy_view(&world)
        .iter()
        .find(|snapshot| snapshot.id == enemy)
        .copied()
        .expect("enemy is never removed");
    assert_ne!(respawned.cell, target);
    assert_eq!(respawned.health, 25);
    assert_eq!(query::coins(&world).len(), coins_before + 1);
    assert!(query::coins(&world).contains(&target));
    assert_eq!(query::player(&world).experience, experience_before + 15);
}

#[test]
fn attacks_respect_cooldown_and_adjacency() {
    let mut world = World::new(1337, Rules::default());
    let mut log = Vec::new();
    let (_, target) = approach_enemy(&mut world, &mut log);

    let mut events = Vec::new();
    world::apply(&mut world, Command::PlayerAttack { target }, &mut events);
    world::apply(&mut world, Command::PlayerAttack { target }, &mut events);
    tick(&mut world, 399);
    world::apply(&mut world, Command::PlayerAttack { target }, &mut events);
    assert_eq!(events.len(), 1);
    assert!(!query::player(&world).attack_ready);

    tick(&mut world, 1);
    assert!(query::player(&world).attack_ready);

    let player = query::player(&world).cell;
    let far = CellCoord::new(
        if player.x() >= 5 { 0 } else { 9 },
        if player.y() >= 5 { 0 } else { 9 },
    );
    let mut ignored = Vec::new();
    world::apply(&mut world, Command::PlayerAttack { target: far }, &mut ignored);
    assert!(ignored.is_empty());
}

#[test]
fn stepping_onto_enemy_is_rejected() {
    let mut world = World::new(1337, Rules::default());
    let mut log = Vec::new();
    let (_, enemy_cell) = approach_enemy(&mut world, &mut log);
    let player = query::player(&world).cell;
    let direction = Direction::between(player, enemy_cell).expect("adjacent");

    assert!(!query::is_free_dynamic(&world, enemy_cell));

    let mut events = Vec::new();
    world::apply(&mut world, Command::StepPlayer { direction }, &mut events);

    assert!(events.is_empty());
    assert_eq!(query::player(&world).cell, player);
}

#[test]
fn death_costs_coins_and_blocks_input_until_respawn() {
    let rules = Rules {
        combat: CombatRules {
            enemy_damage: DamageRange::new(3, 6),
            ..CombatRules::default()
        },
        ..Rules::default()
    };
    let save = SaveState {
        seed: 1337,
        player: saved_player(5, 25),
        quest_progress: 0,
        quest_completed: false,
    };
    let mut world = World::from_save(&save, rules).expect("valid save");
    let mut log = Vec::new();
    let (enemy, enemy_cell) = approach_enemy(&mut world, &mut log);

    let mut coins_before_death = 0;
    let mut events = Vec::new();
    for _ in 0..4 {
        coins_before_death = query::player(&world).coins;
        tick(&mut world, 900);
        world::apply(&mut world, Command::EnemyStrike { enemy }, &mut events);
        if query::player(&world).life == LifeState::Dead {
            break;
        }
    }

    let player = query::player(&world);
    assert_eq!(player.life, LifeState::Dead);
    assert_eq!(player.health, 0);
    let expected_loss = coins_before_death / 10;
    assert!(events.contains(&Event::PlayerDied {
        coins_lost: expected_loss
    }));
    assert_eq!(player.coins, coins_before_death - expected_loss);

    let mut ignored = Vec::new();
    let direction = Direction::between(player.cell, enemy_cell).expect("adjacent");
    world::apply(&mut world, Command::StepPlayer { direction }, &mut ignored);
    world::apply(
        &mut world,
        Command::PlayerAttack { target: enemy_cell },
        &mut ignored,
    );
    world::apply(
        &mut world,
        Command::RequestMove {
            destination: CellCoord::new(0, 0),
        },
        &mut ignored,
    );
    world::apply(&mut world, Command::EnemyStrike { enemy }, &mut ignored);
    assert!(ignored.is_empty());
    assert_eq!(query::player(&world).cell, player.cell);

    let mut revived = Vec::new();
    world::apply(&mut world, Command::Respawn, &mut revived);
    assert!(revived.contains(&Event::PlayerRespawned {
        cell: CellCoord::new(0, 0)
    }));
    let player = query::player(&world);
    assert_eq!(player.life, LifeState::Alive);
    assert_eq!(player.health, 100);
    assert_eq!(player.cell, CellCoord::new(0, 0));

    let mut second = Vec::new();
    world::apply(&mut world, Command::Respawn, &mut second);
    assert!(second.is_empty());
}

#[test]
fn quest_bonus_is_granted_once_until_reset() {
    let save = SaveState {
        seed: 4242,
        player: saved_player(100, 29),
        quest_progress: 29,
        quest_completed: false,
    };
    let mut world = World::from_save(&save, Rules::default()).expect("valid save");
    let mut events = Vec::new();

    let targets: Vec<CellCoord> = query::coins(&world).to_vec();
    let mut collected = 0;
    for coin in targets {
        if collected == 2 {
            break;
        }
        if query::coins(&world).contains(&coin) && walk_to(&mut world, coin, &mut events) {
            collected += 1;
        }
    }
    assert_eq!(collected, 2, "expected two reachable coins");

    let completions = events
        .iter()
        .filter(|event| matches!(event, Event::QuestCompleted { .. }))
        .count();
    assert_eq!(completions, 1);
    assert!(events.contains(&Event::QuestCompleted { bonus: 30 }));
    assert!(events.contains(&Event::ExperienceGained { amount: 30 }));
    assert_eq!(
        query::quest(&world).progress,
        query::quest(&world).target
    );
    assert!(query::quest(&world).completed);

    let mut reset = Vec::new();
    world::apply(&mut world, Command::ResetQuest, &mut reset);
    assert_eq!(reset, vec![Event::QuestReset]);
    assert_eq!(query::quest(&world).progress, 0);
    assert!(!query::quest(&world).completed);
}

#[test]
fn reset_quest_allows_exactly_one_more_completion() {
    let rules = Rules {
        grid: GridRules {
            blocked_cells: 0,
            ..GridRules::default()
        },
        spawn: SpawnRules {
            enemies: 0,
            coins: 6,
            potions: 0,
            ..SpawnRules::default()
        },
        progression: ProgressionRules {
            quest_target: 2,
            ..ProgressionRules::default()
        },
        ..Rules::default()
    };
    let mut world = World::new(77, rules);
    let mut events = Vec::new();
    let mut reset = false;

    while let Some(coin) = query::coins(&world).first().copied() {
        world::apply(&mut world, Command::RequestMove { destination: coin }, &mut events);
        while let Some(route) = query::route(&world) {
            let from = query::player(&world).cell;
            let direction = route
                .next()
                .and_then(|next| Direction::between(from, next))
                .expect("route head is adjacent");
            world::apply(&mut world, Command::StepPlayer { direction }, &mut events);
            assert_ne!(query::player(&world).cell, from, "open grid never blocks");

            if !reset && query::player(&world).coins == 2 {
                world::apply(&mut world, Command::ResetQuest, &mut events);
                reset = true;
            }
        }
    }

    assert_eq!(query::player(&world).coins, 6);
    let completions: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, event)| matches!(event, Event::QuestCompleted { .. }))
        .map(|(index, _)| index)
        .collect();
    assert_eq!(completions.len(), 2);

    let reset_at = events
        .iter()
        .position(|event| *event == Event::QuestReset)
        .expect("quest was reset");
    assert!(completions[0] < reset_at && reset_at < completions[1]);

    let after_second = &events[completions[1]..];
    let late_coins = after_second
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::PickupCollected {
                    kind: PickupKind::Coin,
                    ..
                }
            )
        })
        .count();
    assert_eq!(late_coins, 2);
    assert!(!after_second
        .iter()
        .any(|event| matches!(event, Event::QuestAdvanced { .. })));
    assert!(query::quest(&world).completed);
    assert_eq!(query::quest(&world).progress, 2);
}

#[test]
fn unreachable_request_keeps_current_route() {
    let rules = Rules {
        grid: GridRules {
            blocked_cells: 0,
            ..GridRules::default()
        },
        spawn: SpawnRules {
            enemies: 0,
            ..SpawnRules::default()
        },
        ..Rules::default()
    };
    let mut world = World::new(3, rules);
    let destination = CellCoord::new(9, 9);

    let mut events = Vec::new();
    world::apply(&mut world, Command::RequestMove { destination }, &mut events);
    let planned = query::route(&world).expect("open grid");

    let mut ignored = Vec::new();
    world::apply(
        &mut world,
        Command::RequestMove {
            destination: CellCoord::new(30, 2),
        },
        &mut ignored,
    );

    assert!(ignored.is_empty());
    assert_eq!(query::route(&world), Some(planned));
}

#[test]
fn saved_state_restores_player_and_terrain() {
    let mut world = World::new(2024, Rules::default());
    let mut log = Vec::new();
    let _ = walk_to(&mut world, CellCoord::new(4, 4), &mut log);

    let save = world.save_state();
    let restored = World::from_save(&save, Rules::default()).expect("round trip");

    assert_eq!(query::terrain(&restored), query::terrain(&world));
    assert_eq!(query::player(&restored).cell, query::player(&world).cell);
    assert_eq!(query::player(&restored).coins, query::player(&world).coins);
    assert_eq!(restored.save_state(), save);
}

#[test]
fn invalid_saves_are_rejected() {
    let rules = Rules::default();
    let terrain = Terrain::generate(1337, &rules.grid);
    let blocked = terrain.blocked_cells().next().expect("seed blocks cells");

    let save = SaveState {
        seed: 1337,
        player: SavedPlayer {
            x: blocked.x(),
            y: blocked.y(),
            ..saved_player(100, 0)
        },
        quest_progress: 0,
        quest_completed: false,
    };

    assert!(World::from_save(&save, rules).is_err());
}
