use std::time::Duration;

use gate_defence_core::{
    EnemyStats, Event, LevelConfig, ProgressLedger, RemovalCause, StatusLedger, TileLayout,
    TowerStats,
};
use gate_defence_system_waves::WaveController;
use proptest::prelude::*;

fn corridor(waves: u32, enemies_per_wave: u32, duration: f64, lives: u32) -> LevelConfig {
    LevelConfig {
        name: "Corridor".to_owned(),
        size: 2,
        tiles: vec![2, 3, 1, 1],
        waves,
        enemies_per_wave,
        duration,
        starting_cash: 0,
        starting_lives: lives,
        diagonal: false,
        enemy: EnemyStats::default(),
        tower: TowerStats::default(),
    }
}

proptest! {
    #[test]
    fn never_spawns_more_than_budget_per_wave(
        enemies_per_wave in 1_u32..8,
        duration_ms in 200_u64..4000,
        steps in prop::collection::vec(1_u64..700, 1..200),
    ) {
        let level = corridor(50, enemies_per_wave, duration_ms as f64 / 1000.0, 1000);
        let mut controller =
            WaveController::new(&level, &TileLayout::default(), Duration::ZERO).expect("level");
        let mut ledger = StatusLedger::new(level.starting_cash, level.starting_lives);
        let mut events = Vec::new();

        let mut now = Duration::ZERO;
        for step in steps {
            controller.update(now, &mut ledger, &mut events);
            now += Duration::from_millis(step);
        }

        let mut spawned_this_wave = 0;
        for event in &events {
            match event {
                Event::WaveStarted { .. } => spawned_this_wave = 0,
                Event::EnemySpawned { .. } => {
                    spawned_this_wave += 1;
                    prop_assert!(spawned_this_wave <= enemies_per_wave);
                }
                _ => {}
            }
        }
    }
}

#[test]
fn escaping_enemies_cost_lives_and_end_the_game() {
    let level = corridor(10, 2, 1.0, 2);
    let mut controller =
        WaveController::new(&level, &TileLayout::default(), Duration::ZERO).expect("level");
    let mut ledger = StatusLedger::new(level.starting_cash, level.starting_lives);
    let mut events = Vec::new();

    let mut now = Duration::ZERO;
    while !ledger.game_over() && now < Duration::from_secs(30) {
        controller.update(now, &mut ledger, &mut events);
        now += Duration::from_millis(16);
    }

    assert!(ledger.game_over());
    assert_eq!(ledger.lives(), 0);
    let escaped = events
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::EnemyRemoved {
                    cause: RemovalCause::Escaped,
                    ..
                }
            )
        })
        .count();
    assert_eq!(escaped, 2);
}

#[test]
fn spawned_enemies_start_on_the_start_gate() {
    let level = corridor(10, 1, 1.0, 5);
    let layout = TileLayout::default();
    let mut controller = WaveController::new(&level, &layout, Duration::ZERO).expect("level");
    let mut ledger = StatusLedger::new(level.starting_cash, level.starting_lives);
    let mut events = Vec::new();

    controller.update(Duration::ZERO, &mut ledger, &mut events);
    controller.update(Duration::from_secs(1), &mut ledger, &mut events);

    let spawned: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemySpawned {
                position, health, worth, ..
            } => Some((*position, *health, *worth)),
            _ => None,
        })
        .collect();
    assert_eq!(spawned.len(), 1);
    assert_eq!(spawned[0], (controller.path().start().expect("start"), 6, 11));
    assert_eq!(controller.enemy_view().len(), 1);
}

#[test]
fn long_frame_across_a_wave_boundary_keeps_owed_spawns() {
    let level = corridor(10, 2, 1.0, 5);
    let mut controller =
        WaveController::new(&level, &TileLayout::default(), Duration::ZERO).expect("level");
    let mut ledger = StatusLedger::new(level.starting_cash, level.starting_lives);
    let mut events = Vec::new();

    controller.update(Duration::ZERO, &mut ledger, &mut events);
    controller.update(Duration::from_millis(1300), &mut ledger, &mut events);

    let first_wave: Vec<_> = events
        .iter()
        .take_while(|event| **event != Event::WaveStarted { wave: 2 })
        .filter_map(|event| match event {
            Event::EnemySpawned { health, .. } => Some(*health),
            _ => None,
        })
        .collect();
    assert_eq!(first_wave, vec![6, 6]);
    assert!(events.contains(&Event::WaveStarted { wave: 2 }));
    assert_eq!(controller.wave(), 2);
    assert_eq!(controller.pending_spawns(), 2);
    assert_eq!(controller.enemies().len(), 2);
}
