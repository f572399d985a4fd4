#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Enemy state machine: spawning, path following, damage and escape.
//!
//! An enemy starts [`EnemyState::Active`] at the start gate and ends in
//! exactly one terminal state. [`EnemyState::Dead`] is reached through
//! [`Enemy::apply_damage`], which credits the enemy's worth to the cash
//! ledger once. [`EnemyState::Escaped`] is reached through [`Enemy::tick`]
//! when the enemy walks past the last waypoint, costing the player a life.
//! Terminal enemies ignore further damage and movement.

use std::time::Duration;

use gate_defence_core::{
    CashLedger, CombatTarget, DamageOutcome, EnemyId, EnemySnapshot, EnemyState, EnemyStats,
    Path, ProgressLedger, RemovalCause, WorldPoint,
};

/// Distance, in world units, under which an enemy snaps onto its waypoint.
pub const SNAP_DISTANCE: f32 = 1.0;

/// Single enemy walking the level's path.
#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    id: EnemyId,
    state: EnemyState,
    health: i32,
    worth: u32,
    speed: f32,
    counter: usize,
    position: WorldPoint,
    last_tick: Duration,
}

impl Enemy {
    /// Creates an enemy at the path's start gate, scaled to the current wave.
    ///
    /// Health and worth both grow by the wave number. An empty path places
    /// the enemy at the world origin; it escapes on its first tick.
    #[must_use]
    pub fn spawn(id: EnemyId, wave: u32, stats: &EnemyStats, path: &Path, now: Duration) -> Self {
        let bonus = i32::try_from(wave).unwrap_or(i32::MAX);
        Self {
            id,
            state: EnemyState::Active,
            health: stats.health.saturating_add(bonus),
            worth: stats.worth.saturating_add(wave),
            speed: stats.speed,
            counter: 0,
            position: path.start().unwrap_or_default(),
            last_tick: now,
        }
    }

    /// Identifier allocated to the enemy.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> EnemyState {
        self.state
    }

    /// Remaining health. Zero or below once dead.
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    /// Cash credited when the enemy is killed.
    #[must_use]
    pub const fn worth(&self) -> u32 {
        self.worth
    }

    /// Current world-space position.
    #[must_use]
    pub const fn position(&self) -> WorldPoint {
        self.position
    }

    /// Index of the waypoint the enemy is walking towards.
    #[must_use]
    pub const fn path_index(&self) -> usize {
        self.counter
    }

    /// Why the enemy should leave the active list, if it is terminal.
    #[must_use]
    pub const fn removal_cause(&self) -> Option<RemovalCause> {
        match self.state {
            EnemyState::Active => None,
            EnemyState::Dead => Some(RemovalCause::Killed { worth: self.worth }),
            EnemyState::Escaped => Some(RemovalCause::Escaped),
        }
    }

    /// Captures an immutable snapshot for queries.
    #[must_use]
    pub const fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            position: self.position,
            health: self.health,
            path_index: self.counter,
            state: self.state,
        }
    }

    /// Subtracts `amount` from the enemy's health.
    ///
    /// The first hit that drops health to zero or below kills the enemy and
    /// credits its worth. Hits against terminal enemies are ignored.
    pub fn apply_damage<L>(&mut self, amount: u32, ledger: &mut L) -> DamageOutcome
    where
        L: CashLedger + ?Sized,
    {
        if self.state != EnemyState::Active {
            return DamageOutcome::Ignored;
        }

        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        self.health = self.health.saturating_sub(amount);
        if self.health > 0 {
            return DamageOutcome::Wounded {
                remaining: self.health,
            };
        }

        self.state = EnemyState::Dead;
        ledger.increment_cash(self.worth);
        log::debug!("enemy {} killed, worth {}", self.id.get(), self.worth);
        DamageOutcome::Killed { worth: self.worth }
    }

    /// Advances the enemy along the path to simulation time `now`.
    ///
    /// Each axis moves independently at `speed` world units per second and
    /// stops on the waypoint, snapping when less than [`SNAP_DISTANCE`] away.
    /// Once a tick starts on the waypoint the enemy targets the next one;
    /// walking past the last waypoint marks it escaped and costs a life.
    ///
    /// Returns `true` when the enemy should leave the active list.
    pub fn tick<L>(&mut self, now: Duration, path: &Path, ledger: &mut L) -> bool
    where
        L: ProgressLedger + ?Sized,
    {
        if self.state != EnemyState::Active {
            return true;
        }

        let elapsed = now.saturating_sub(self.last_tick);
        self.last_tick = now;

        let Some(target) = path.waypoint(self.counter) else {
            self.escape(ledger);
            return true;
        };

        let dx = target.x - self.position.x;
        let dy = target.y - self.position.y;
        let step = self.speed * elapsed.as_secs_f32();

        self.position.x = advance_axis(self.position.x, target.x, dx, step);
        self.position.y = advance_axis(self.position.y, target.y, dy, step);

        if dx == 0.0 && dy == 0.0 {
            self.counter += 1;
            if self.counter >= path.len() {
                self.escape(ledger);
                return true;
            }
        }

        false
    }

    fn escape<L>(&mut self, ledger: &mut L)
    where
        L: ProgressLedger + ?Sized,
    {
        self.state = EnemyState::Escaped;
        ledger.lose_life();
        log::debug!(
            "enemy {} escaped, {} lives left",
            self.id.get(),
            ledger.lives()
        );
    }
}

// Steps are clamped to the remaining distance so a long frame cannot
// carry the enemy past its waypoint.
fn advance_axis(position: f32, target: f32, delta: f32, step: f32) -> f32 {
    if delta.abs() < SNAP_DISTANCE {
        return target;
    }
    if step >= delta.abs() {
        target
    } else {
        position + step.copysign(delta)
    }
}

impl CombatTarget for Enemy {
    fn id(&self) -> EnemyId {
        self.id
    }

    fn position(&self) -> WorldPoint {
        self.position
    }

    fn is_active(&self) -> bool {
        self.state == EnemyState::Active
    }

    fn apply_damage<L>(&mut self, amount: u32, ledger: &mut L) -> DamageOutcome
    where
        L: CashLedger + ?Sized,
    {
        Enemy::apply_damage(self, amount, ledger)
    }
}
