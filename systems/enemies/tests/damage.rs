use std::time::Duration;

use gate_defence_core::{
    CashLedger, DamageOutcome, EnemyId, EnemyState, EnemyStats, GridCoord, Path, StatusLedger,
    TileLayout,
};
use gate_defence_system_enemies::Enemy;
use proptest::prelude::*;

fn gate() -> Path {
    Path::resolve(vec![GridCoord::new(0, 0)], &TileLayout::default())
}

proptest! {
    #[test]
    fn repeated_hits_subtract_until_the_single_killing_blow(
        base_health in 1_i32..40,
        wave in 0_u32..20,
        damage in 1_u32..12,
        hits in 0_u32..60,
    ) {
        let stats = EnemyStats {
            health: base_health,
            ..EnemyStats::default()
        };
        let mut enemy = Enemy::spawn(EnemyId::new(0), wave, &stats, &gate(), Duration::ZERO);
        let mut ledger = StatusLedger::new(0, 1);

        let start = base_health + wave as i32;
        let step = damage as i32;
        let killing_hit = (start + step - 1) / step;
        prop_assert_eq!(enemy.health(), start);

        for hit in 1..=hits as i32 {
            let outcome = enemy.apply_damage(damage, &mut ledger);
            if hit < killing_hit {
                prop_assert_eq!(outcome, DamageOutcome::Wounded { remaining: start - hit * step });
            } else if hit == killing_hit {
                prop_assert_eq!(outcome, DamageOutcome::Killed { worth: enemy.worth() });
            } else {
                prop_assert_eq!(outcome, DamageOutcome::Ignored);
            }
        }

        let landed = (hits as i32).min(killing_hit);
        prop_assert_eq!(enemy.health(), start - landed * step);
        if hits as i32 >= killing_hit {
            prop_assert_eq!(enemy.state(), EnemyState::Dead);
            prop_assert_eq!(ledger.cash(), stats.worth + wave);
        } else {
            prop_assert_eq!(enemy.state(), EnemyState::Active);
            prop_assert_eq!(ledger.cash(), 0);
        }
    }
}
