use std::time::Duration;

use gate_defence_core::{
    CashLedger, EnemyId, EnemyProvider, EnemyState, EnemyStats, Event, GridCoord, Path,
    StatusLedger, TileLayout, TowerId, TowerStats,
};
use gate_defence_system_enemies::Enemy;
use gate_defence_system_towers::Tower;

struct Horde(Vec<Enemy>);

impl EnemyProvider for Horde {
    type Enemy = Enemy;

    fn list_active(&mut self) -> &mut [Enemy] {
        &mut self.0
    }
}

fn path() -> Path {
    Path::resolve(
        vec![GridCoord::new(0, 0), GridCoord::new(0, 1)],
        &TileLayout::default(),
    )
}

#[test]
fn seven_cooldown_spaced_shots_kill_a_wave_two_enemy() {
    let path = path();
    let mut ledger = StatusLedger::new(100, 20);
    let mut tower = Tower::build(
        TowerId::new(0),
        GridCoord::new(1, 0),
        &TileLayout::default(),
        &TowerStats::default(),
        &mut ledger,
    )
    .expect("affordable");
    assert_eq!(ledger.cash(), 0);

    let mut horde = Horde(vec![Enemy::spawn(
        EnemyId::new(0),
        2,
        &EnemyStats::default(),
        &path,
        Duration::ZERO,
    )]);
    let mut events = Vec::new();

    let mut hits = 0;
    for second in 0..20 {
        let now = Duration::from_secs(second);
        if tower.tick(now, &mut horde, &mut ledger, &mut events) {
            hits += 1;
        }
        let _ = tower.tick(now + Duration::from_millis(500), &mut horde, &mut ledger, &mut events);
    }

    assert_eq!(hits, 7);
    assert_eq!(horde.0[0].state(), EnemyState::Dead);
    assert_eq!(ledger.cash(), 12);

    let fired = events
        .iter()
        .filter(|event| matches!(event, Event::TowerFired { .. }))
        .count();
    assert_eq!(fired, 7);
}

#[test]
fn towers_skip_dead_enemies() {
    let path = path();
    let mut ledger = StatusLedger::new(200, 20);
    let layout = TileLayout::default();
    let stats = TowerStats {
        damage: 10,
        ..TowerStats::default()
    };
    let mut first = Tower::build(TowerId::new(0), GridCoord::new(1, 0), &layout, &stats, &mut ledger)
        .expect("affordable");
    let mut second =
        Tower::build(TowerId::new(1), GridCoord::new(1, 1), &layout, &stats, &mut ledger)
            .expect("affordable");

    let mut horde = Horde(vec![Enemy::spawn(
        EnemyId::new(0),
        0,
        &EnemyStats::default(),
        &path,
        Duration::ZERO,
    )]);
    let mut events = Vec::new();

    assert!(first.tick(Duration::ZERO, &mut horde, &mut ledger, &mut events));
    assert!(!second.tick(Duration::ZERO, &mut horde, &mut ledger, &mut events));
    assert_eq!(ledger.cash(), 10);
    assert_eq!(second.last_shot(), None);
}
