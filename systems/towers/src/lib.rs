#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tower state machine: construction, cooldown-gated attacks and upgrades.

use std::time::Duration;

use gate_defence_core::{
    CashLedger, CombatTarget, DamageOutcome, EnemyProvider, Event, GridCoord, TileLayout,
    TowerId, TowerSnapshot, TowerStats, WorldPoint,
};

/// Tower anchored to a single tile.
#[derive(Clone, Debug, PartialEq)]
pub struct Tower {
    id: TowerId,
    tile: GridCoord,
    position: WorldPoint,
    tile_size: f32,
    stats: TowerStats,
    damage: u32,
    upgrades: u32,
    last_shot: Option<Duration>,
    attack_visual_until: Option<Duration>,
}

impl Tower {
    /// Builds a tower on `tile` if the ledger can afford it.
    ///
    /// Deducts the tower cost on success. Returns `None` without touching the
    /// ledger when cash is short.
    #[must_use]
    pub fn build<L>(
        id: TowerId,
        tile: GridCoord,
        layout: &TileLayout,
        stats: &TowerStats,
        ledger: &mut L,
    ) -> Option<Self>
    where
        L: CashLedger + ?Sized,
    {
        if !ledger.try_spend(stats.cost) {
            log::debug!(
                "cannot afford tower at {tile}: cost {}, cash {}",
                stats.cost,
                ledger.cash()
            );
            return None;
        }

        Some(Self {
            id,
            tile,
            position: layout.tile_position(tile),
            tile_size: layout.tile_size(),
            stats: *stats,
            damage: stats.damage,
            upgrades: 0,
            last_shot: None,
            attack_visual_until: None,
        })
    }

    /// Identifier allocated to the tower.
    #[must_use]
    pub const fn id(&self) -> TowerId {
        self.id
    }

    /// Tile occupied by the tower.
    #[must_use]
    pub const fn tile(&self) -> GridCoord {
        self.tile
    }

    /// World-space anchor of the tower.
    #[must_use]
    pub const fn position(&self) -> WorldPoint {
        self.position
    }

    /// Damage dealt per shot.
    #[must_use]
    pub const fn damage(&self) -> u32 {
        self.damage
    }

    /// Number of upgrades applied.
    #[must_use]
    pub const fn upgrades(&self) -> u32 {
        self.upgrades
    }

    /// Time of the last successful attack.
    #[must_use]
    pub const fn last_shot(&self) -> Option<Duration> {
        self.last_shot
    }

    /// Attack reach in world units, measured as Manhattan distance.
    #[must_use]
    pub fn reach(&self) -> f32 {
        self.stats.range * self.tile_size
    }

    /// Cash required for the next upgrade.
    #[must_use]
    pub fn upgrade_cost(&self) -> u32 {
        self.stats.upgrade_cost(self.upgrades)
    }

    /// Whether the attack visual is showing.
    #[must_use]
    pub const fn is_attacking(&self) -> bool {
        self.attack_visual_until.is_some()
    }

    /// Captures an immutable snapshot for queries.
    #[must_use]
    pub fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            tile: self.tile,
            position: self.position,
            damage: self.damage,
            upgrades: self.upgrades,
            upgrade_cost: self.upgrade_cost(),
            attacking: self.is_attacking(),
        }
    }

    /// Runs the tower for simulation time `now`.
    ///
    /// Expired attack visuals are cleared first. While the cooldown runs the
    /// tower does nothing else. Afterwards the first active enemy, in spawn
    /// order, within reach is hit; nearer enemies later in the list are not
    /// preferred. When nothing is in reach the cooldown is left untouched so
    /// the tower checks again next tick.
    ///
    /// Returns `true` when the tower fired.
    pub fn tick<P, L>(
        &mut self,
        now: Duration,
        enemies: &mut P,
        ledger: &mut L,
        out: &mut Vec<Event>,
    ) -> bool
    where
        P: EnemyProvider + ?Sized,
        L: CashLedger + ?Sized,
    {
        if self.attack_visual_until.is_some_and(|deadline| now >= deadline) {
            self.attack_visual_until = None;
            out.push(Event::AttackVisualCleared { tower: self.id });
        }

        if self
            .last_shot
            .is_some_and(|shot| now < shot.saturating_add(self.stats.cooldown()))
        {
            return false;
        }

        let reach = self.reach();
        let position = self.position;
        let Some(target) = enemies
            .list_active()
            .iter_mut()
            .find(|enemy| enemy.is_active() && enemy.position().manhattan_distance(position) < reach)
        else {
            return false;
        };

        let enemy = target.id();
        let to = target.position();
        let outcome = target.apply_damage(self.damage, ledger);
        if outcome == DamageOutcome::Ignored {
            return false;
        }

        self.attack_visual_until = Some(now.saturating_add(self.stats.attack_visual()));
        self.last_shot = Some(now);
        log::debug!(
            "tower {} hit enemy {} for {} ({:?})",
            self.id.get(),
            enemy.get(),
            self.damage,
            outcome
        );
        out.push(Event::TowerFired {
            tower: self.id,
            enemy,
            from: self.position,
            to,
            damage: self.damage,
        });
        true
    }

    /// Drops a pending attack visual, returning whether one was showing.
    pub fn clear_attack_visual(&mut self) -> bool {
        self.attack_visual_until.take().is_some()
    }

    /// Upgrades the tower if the ledger can afford it.
    ///
    /// Returns the cash spent, or `None` when cash is short.
    pub fn upgrade<L>(&mut self, ledger: &mut L) -> Option<u32>
    where
        L: CashLedger + ?Sized,
    {
        let cost = self.upgrade_cost();
        if !ledger.try_spend(cost) {
            log::debug!(
                "cannot afford upgrade of tower {}: cost {cost}, cash {}",
                self.id.get(),
                ledger.cash()
            );
            return None;
        }

        self.upgrades += 1;
        self.damage = self.damage.saturating_add(self.stats.upgrade_damage_step);
        Some(cost)
    }
}

#[cfg(test)]
mod tests {
    use gate_defence_core::{EnemyId, StatusLedger};

    use super::*;

    #[derive(Debug)]
    struct Dummy {
        id: EnemyId,
        position: WorldPoint,
        health: i32,
    }

    impl CombatTarget for Dummy {
        fn id(&self) -> EnemyId {
            self.id
        }

        fn position(&self) -> WorldPoint {
            self.position
        }

        fn is_active(&self) -> bool {
            self.health > 0
        }

        fn apply_damage<L>(&mut self, amount: u32, ledger: &mut L) -> DamageOutcome
        where
            L: CashLedger + ?Sized,
        {
            if self.health <= 0 {
                return DamageOutcome::Ignored;
            }
            self.health -= amount as i32;
            if self.health <= 0 {
                ledger.increment_cash(1);
                DamageOutcome::Killed { worth: 1 }
            } else {
                DamageOutcome::Wounded {
                    remaining: self.health,
                }
            }
        }
    }

    struct Dummies(Vec<Dummy>);

    impl EnemyProvider for Dummies {
        type Enemy = Dummy;

        fn list_active(&mut self) -> &mut [Dummy] {
            &mut self.0
        }
    }

    fn dummy(id: u32, x: f32, y: f32) -> Dummy {
        Dummy {
            id: EnemyId::new(id),
            position: WorldPoint::new(x, y),
            health: 100,
        }
    }

    fn tower(ledger: &mut StatusLedger) -> Tower {
        Tower::build(
            TowerId::new(0),
            GridCoord::new(0, 0),
            &TileLayout::default(),
            &TowerStats::default(),
            ledger,
        )
        .expect("affordable")
    }

    #[test]
    fn build_is_noop_when_unaffordable() {
        let mut ledger = StatusLedger::new(90, 20);
        let built = Tower::build(
            TowerId::new(0),
            GridCoord::new(1, 1),
            &TileLayout::default(),
            &TowerStats::default(),
            &mut ledger,
        );
        assert!(built.is_none());
        assert_eq!(ledger.cash(), 90);
    }

    #[test]
    fn build_deducts_cost_and_anchors_to_tile() {
        let mut ledger = StatusLedger::new(250, 20);
        let built = Tower::build(
            TowerId::new(3),
            GridCoord::new(1, 2),
            &TileLayout::default(),
            &TowerStats::default(),
            &mut ledger,
        )
        .expect("affordable");
        assert_eq!(ledger.cash(), 150);
        assert_eq!(built.position(), WorldPoint::new(80.0, 40.0));
        assert_eq!(built.reach(), 80.0);
        assert_eq!(built.upgrade_cost(), 150);
    }

    #[test]
    fn tick_is_noop_during_cooldown() {
        let mut ledger = StatusLedger::new(100, 20);
        let mut tower = tower(&mut ledger);
        let mut enemies = Dummies(vec![dummy(0, 40.0, 0.0)]);
        let mut events = Vec::new();

        assert!(tower.tick(Duration::from_millis(100), &mut enemies, &mut ledger, &mut events));
        assert_eq!(enemies.0[0].health, 99);

        events.clear();
        assert!(!tower.tick(Duration::from_millis(1099), &mut enemies, &mut ledger, &mut events));
        assert_eq!(enemies.0[0].health, 99);
        assert_eq!(tower.last_shot(), Some(Duration::from_millis(100)));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::TowerFired { .. })));

        assert!(tower.tick(Duration::from_millis(1100), &mut enemies, &mut ledger, &mut events));
        assert_eq!(enemies.0[0].health, 98);
    }

    #[test]
    fn range_is_strict_manhattan_distance() {
        let mut ledger = StatusLedger::new(100, 20);
        let mut tower = tower(&mut ledger);
        let mut enemies = Dummies(vec![dummy(0, 40.0, 40.0), dummy(1, 79.0, 0.0)]);
        let mut events = Vec::new();

        assert!(tower.tick(Duration::ZERO, &mut enemies, &mut ledger, &mut events));
        assert_eq!(enemies.0[0].health, 100);
        assert_eq!(enemies.0[1].health, 99);
    }

    #[test]
    fn no_target_leaves_cooldown_untouched() {
        let mut ledger = StatusLedger::new(100, 20);
        let mut tower = tower(&mut ledger);
        let mut enemies = Dummies(vec![dummy(0, 400.0, 0.0)]);
        let mut events = Vec::new();

        assert!(!tower.tick(Duration::from_millis(10), &mut enemies, &mut ledger, &mut events));
        assert_eq!(tower.last_shot(), None);

        enemies.0[0].position = WorldPoint::new(10.0, 0.0);
        assert!(tower.tick(Duration::from_millis(20), &mut enemies, &mut ledger, &mut events));
    }

    #[test]
    fn targets_first_in_list_not_nearest() {
        // Spawn order wins over proximity: the second dummy is closer.
        let mut ledger = StatusLedger::new(100, 20);
        let mut tower = tower(&mut ledger);
        let mut enemies = Dummies(vec![dummy(0, 60.0, 0.0), dummy(1, 1.0, 0.0)]);
        let mut events = Vec::new();

        assert!(tower.tick(Duration::ZERO, &mut enemies, &mut ledger, &mut events));
        assert_eq!(enemies.0[0].health, 99);
        assert_eq!(enemies.0[1].health, 100);
        assert_eq!(
            events,
            vec![Event::TowerFired {
                tower: TowerId::new(0),
                enemy: EnemyId::new(0),
                from: WorldPoint::new(0.0, 0.0),
                to: WorldPoint::new(60.0, 0.0),
                damage: 1,
            }]
        );
    }

    #[test]
    fn attack_visual_clears_after_its_lifetime() {
        let mut ledger = StatusLedger::new(100, 20);
        let mut tower = tower(&mut ledger);
        let mut enemies = Dummies(vec![dummy(0, 0.0, 0.0)]);
        let mut events = Vec::new();

        assert!(tower.tick(Duration::ZERO, &mut enemies, &mut ledger, &mut events));
        assert!(tower.is_attacking());

        events.clear();
        let _ = tower.tick(Duration::from_millis(499), &mut enemies, &mut ledger, &mut events);
        assert!(tower.is_attacking());
        assert!(events.is_empty());

        let _ = tower.tick(Duration::from_millis(500), &mut enemies, &mut ledger, &mut events);
        assert!(!tower.is_attacking());
        assert_eq!(
            events,
            vec![Event::AttackVisualCleared {
                tower: TowerId::new(0)
            }]
        );
    }

    #[test]
    fn clearing_the_visual_reports_whether_it_was_showing() {
        let mut ledger = StatusLedger::new(100, 20);
        let mut tower = tower(&mut ledger);
        let mut enemies = Dummies(vec![dummy(0, 0.0, 0.0)]);
        let mut events = Vec::new();

        assert!(!tower.clear_attack_visual());
        assert!(tower.tick(Duration::ZERO, &mut enemies, &mut ledger, &mut events));
        assert!(tower.clear_attack_visual());
        assert!(!tower.is_attacking());
        assert!(!tower.clear_attack_visual());
    }

    #[test]
    fn upgrades_cost_more_each_time() {
        let mut ledger = StatusLedger::new(600, 20);
        let mut tower = tower(&mut ledger);
        assert_eq!(ledger.cash(), 500);

        assert_eq!(tower.upgrade(&mut ledger), Some(150));
        assert_eq!(tower.damage(), 2);
        assert_eq!(tower.upgrade(&mut ledger), Some(300));
        assert_eq!(tower.damage(), 3);
        assert_eq!(ledger.cash(), 50);

        assert_eq!(tower.upgrade(&mut ledger), None);
        assert_eq!(tower.upgrades(), 2);
        assert_eq!(tower.upgrade_cost(), 450);
        assert_eq!(ledger.cash(), 50);
    }
}
