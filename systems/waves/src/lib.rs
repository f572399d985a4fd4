#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave progression, timed spawning and the active enemy list.
//!
//! The controller owns the level's [`Path`] and lends it to every enemy it
//! spawns. Two deadlines drive it: the inter-wave deadline, spaced
//! `duration * 1.2` apart, and the spawn deadline, spaced
//! `duration / enemies_per_wave` apart while a wave still has enemies to
//! release. Both are plain timestamps compared against the tick's `now`.
//! Starting a wave first releases the spawns its predecessor still owed up
//! to the boundary, then replaces the spawn deadline.

use std::time::Duration;

use gate_defence_core::{
    EnemyId, EnemyProvider, EnemyStats, EnemyView, Event, LevelConfig, LevelError, Path,
    ProgressLedger, TileLayout,
};
use gate_defence_system_enemies::Enemy;
use gate_defence_system_pathfinding::{search, Graph, Movement};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SpawnTimer {
    next_at: Duration,
    remaining: u32,
}

/// Orchestrates waves and the enemies they release.
#[derive(Clone, Debug)]
pub struct WaveController {
    total_waves: u32,
    enemies_per_wave: u32,
    wave_interval: Duration,
    spawn_interval: Duration,
    enemy_stats: EnemyStats,
    path: Path,
    enemies: Vec<Enemy>,
    wave: u32,
    next_wave_at: Duration,
    spawn_timer: Option<SpawnTimer>,
    next_enemy_id: u32,
}

impl WaveController {
    /// Prepares the controller for a level, computing its route once.
    ///
    /// Fails when the level data is malformed or no route links the gates.
    /// The first wave starts on the first update at or after `now`.
    pub fn new(level: &LevelConfig, layout: &TileLayout, now: Duration) -> Result<Self, LevelError> {
        let tiles = level.validate()?;
        let graph = Graph::from_tiles(&tiles, Movement::from_diagonal(level.diagonal))?;
        let cells = search(&graph, graph.start(), graph.end());
        if cells.is_empty() {
            return Err(LevelError::UnreachableEndGate {
                start: graph.start(),
                end: graph.end(),
            });
        }

        let path = Path::resolve(cells, layout);
        log::info!(
            "level '{}' routed from {} to {} in {} steps",
            level.name,
            graph.start(),
            graph.end(),
            path.len().saturating_sub(1)
        );
        Ok(Self::with_path(level, path, now))
    }

    /// Prepares the controller with a route computed elsewhere.
    #[must_use]
    pub fn with_path(level: &LevelConfig, path: Path, now: Duration) -> Self {
        Self {
            total_waves: level.waves,
            enemies_per_wave: level.enemies_per_wave,
            wave_interval: level.wave_interval(),
            spawn_interval: level.spawn_interval(),
            enemy_stats: level.enemy,
            path,
            enemies: Vec::new(),
            wave: 0,
            next_wave_at: now,
            spawn_timer: None,
            next_enemy_id: 0,
        }
    }

    /// Route shared by every enemy of the level.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of waves started so far.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Enemies in play, oldest spawn first.
    #[must_use]
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    /// Enemies the current wave has yet to release.
    #[must_use]
    pub fn pending_spawns(&self) -> u32 {
        self.spawn_timer.map_or(0, |timer| timer.remaining)
    }

    /// Time at which the next wave starts.
    #[must_use]
    pub const fn next_wave_at(&self) -> Duration {
        self.next_wave_at
    }

    /// Captures a snapshot of every enemy in play.
    #[must_use]
    pub fn enemy_view(&self) -> EnemyView {
        EnemyView::from_snapshots(self.enemies.iter().map(Enemy::snapshot).collect())
    }

    /// Runs one simulation tick.
    ///
    /// Does nothing once the ledger reports game over. Otherwise starts a
    /// wave when its deadline is reached, after releasing what the previous
    /// wave still owed up to that deadline, releases every spawn whose
    /// deadline has passed, then moves all enemies and drops those that
    /// died or escaped. Reaching the configured wave total ends the game.
    pub fn update<L>(&mut self, now: Duration, ledger: &mut L, out: &mut Vec<Event>)
    where
        L: ProgressLedger + ?Sized,
    {
        if ledger.game_over() {
            return;
        }

        if now >= self.next_wave_at {
            // Spawns owed by the ending wave are released up to its boundary.
            self.release_due_spawns(self.next_wave_at, ledger, out);
            self.spawn_timer = None;
            self.next_wave_at = now.saturating_add(self.wave_interval);
            self.wave += 1;
            ledger.set_wave(self.wave);

            if self.wave >= self.total_waves {
                log::info!("final wave {} reached, level complete", self.wave);
                ledger.set_game_over(true);
                return;
            }

            log::info!(
                "wave {} started with {} enemies",
                self.wave,
                self.enemies_per_wave
            );
            self.spawn_timer = Some(SpawnTimer {
                next_at: now.saturating_add(self.spawn_interval),
                remaining: self.enemies_per_wave,
            });
            out.push(Event::WaveStarted { wave: self.wave });
        }

        self.release_due_spawns(now, ledger, out);
        self.advance_enemies(now, ledger, out);
    }

    fn release_due_spawns<L>(&mut self, now: Duration, ledger: &mut L, out: &mut Vec<Event>)
    where
        L: ProgressLedger + ?Sized,
    {
        while let Some(timer) = self.spawn_timer {
            if now < timer.next_at {
                break;
            }
            if timer.remaining == 0 || ledger.game_over() {
                self.spawn_timer = None;
                break;
            }

            self.spawn(timer.next_at, out);

            let remaining = timer.remaining - 1;
            self.spawn_timer = if remaining == 0 || ledger.game_over() {
                None
            } else {
                Some(SpawnTimer {
                    next_at: timer.next_at.saturating_add(self.spawn_interval),
                    remaining,
                })
            };
        }
    }

    fn spawn(&mut self, at: Duration, out: &mut Vec<Event>) {
        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id = self.next_enemy_id.wrapping_add(1);

        let enemy = Enemy::spawn(id, self.wave, &self.enemy_stats, &self.path, at);
        log::debug!(
            "enemy {} spawned for wave {} with {} health",
            id.get(),
            self.wave,
            enemy.health()
        );
        out.push(Event::EnemySpawned {
            enemy: id,
            position: enemy.position(),
            health: enemy.health(),
            worth: enemy.worth(),
        });
        self.enemies.push(enemy);
    }

    fn advance_enemies<L>(&mut self, now: Duration, ledger: &mut L, out: &mut Vec<Event>)
    where
        L: ProgressLedger + ?Sized,
    {
        let path = &self.path;
        self.enemies.retain_mut(|enemy| {
            if !enemy.tick(now, path, ledger) {
                return true;
            }
            if let Some(cause) = enemy.removal_cause() {
                log::debug!("enemy {} removed: {:?}", enemy.id().get(), cause);
                out.push(Event::EnemyRemoved {
                    enemy: enemy.id(),
                    cause,
                });
            }
            false
        });
    }
}

impl EnemyProvider for WaveController {
    type Enemy = Enemy;

    fn list_active(&mut self) -> &mut [Enemy] {
        &mut self.enemies
    }
}
