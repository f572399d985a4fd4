#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level state for Gate Defence.
//!
//! A [`World`] is built once per level and mutated exclusively through
//! [`apply`]. It owns the status ledger, the wave controller with its enemies,
//! and the towers the player has built. Each tick runs the towers first and
//! then the wave controller, and stops doing anything once the game is over.

use std::time::Duration;

use gate_defence_core::{
    AudioSink, CashLedger, Command, Event, GridCoord, LevelConfig, LevelError, Outcome,
    ProgressLedger, SilentAudio, StatusLedger, TileGrid, TileLayout, TowerId, TowerStats,
};
use gate_defence_system_towers::Tower;
use gate_defence_system_waves::WaveController;

/// Represents the authoritative state of a level in play.
#[derive(Debug)]
pub struct World {
    level_name: String,
    layout: TileLayout,
    tiles: TileGrid,
    tower_stats: TowerStats,
    ledger: StatusLedger,
    waves: WaveController,
    towers: Vec<Tower>,
    next_tower_id: u32,
    outcome: Option<Outcome>,
    audio: Box<dyn AudioSink>,
}

impl World {
    /// Loads a level, computing its route and seeding the ledger.
    ///
    /// `now` is the simulation time at which the level starts; the first wave
    /// begins on the first tick at or after it.
    pub fn new(level: &LevelConfig, layout: TileLayout, now: Duration) -> Result<Self, LevelError> {
        let tiles = level.validate()?;
        let waves = WaveController::new(level, &layout, now)?;
        log::info!(
            "loaded level '{}' ({}x{}, {} waves of {})",
            level.name,
            level.size,
            level.size,
            level.waves,
            level.enemies_per_wave
        );

        Ok(Self {
            level_name: level.name.clone(),
            layout,
            tiles,
            tower_stats: level.tower,
            ledger: StatusLedger::new(level.starting_cash, level.starting_lives),
            waves,
            towers: Vec::new(),
            next_tower_id: 0,
            outcome: None,
            audio: Box::new(SilentAudio),
        })
    }

    /// Replaces the sink that receives attack sounds.
    #[must_use]
    pub fn with_audio(mut self, audio: Box<dyn AudioSink>) -> Self {
        self.audio = audio;
        self
    }

    fn tick(&mut self, now: Duration, out_events: &mut Vec<Event>) {
        if self.ledger.game_over() {
            self.announce_outcome(out_events);
            return;
        }

        for tower in &mut self.towers {
            if tower.tick(now, &mut self.waves, &mut self.ledger, out_events) {
                if let Err(error) = self.audio.play_attack() {
                    log::warn!("attack sound failed: {error}");
                }
            }
        }

        self.waves.update(now, &mut self.ledger, out_events);
        self.announce_outcome(out_events);
    }

    fn announce_outcome(&mut self, out_events: &mut Vec<Event>) {
        if !self.ledger.game_over() || self.outcome.is_some() {
            return;
        }

        let outcome = if self.ledger.lives() == 0 {
            Outcome::Defeat
        } else {
            Outcome::Victory
        };
        self.outcome = Some(outcome);
        for tower in &mut self.towers {
            if tower.clear_attack_visual() {
                out_events.push(Event::AttackVisualCleared { tower: tower.id() });
            }
        }
        log::info!(
            "level '{}' over: {:?} at wave {} with {} lives",
            self.level_name,
            outcome,
            self.ledger.wave(),
            self.ledger.lives()
        );
        out_events.push(Event::GameOver { outcome });
    }

    fn build_tower(&mut self, tile: GridCoord, out_events: &mut Vec<Event>) {
        if self.ledger.game_over() {
            return;
        }
        if !self.tiles.value(tile).is_some_and(|value| value.is_buildable()) {
            log::debug!("tile {tile} cannot hold a tower");
            return;
        }
        if self.towers.iter().any(|tower| tower.tile() == tile) {
            log::debug!("tile {tile} already holds a tower");
            return;
        }

        let id = TowerId::new(self.next_tower_id);
        let Some(tower) = Tower::build(id, tile, &self.layout, &self.tower_stats, &mut self.ledger)
        else {
            return;
        };

        self.next_tower_id = self.next_tower_id.wrapping_add(1);
        log::debug!(
            "tower {} built at {tile}, {} cash left",
            id.get(),
            self.ledger.cash()
        );
        out_events.push(Event::TowerBuilt {
            tower: id,
            tile,
            position: tower.position(),
            damage: tower.damage(),
            cost: self.tower_stats.cost,
        });
        self.towers.push(tower);
    }

    fn upgrade_tower(&mut self, id: TowerId, out_events: &mut Vec<Event>) {
        if self.ledger.game_over() {
            return;
        }
        let Some(tower) = self.towers.iter_mut().find(|tower| tower.id() == id) else {
            log::debug!("no tower {} to upgrade", id.get());
            return;
        };
        let Some(cost) = tower.upgrade(&mut self.ledger) else {
            return;
        };

        log::debug!(
            "tower {} upgraded to damage {} for {cost}",
            id.get(),
            tower.damage()
        );
        out_events.push(Event::TowerUpgraded {
            tower: id,
            damage: tower.damage(),
            upgrades: tower.upgrades(),
            cost,
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Unaffordable or invalid build and upgrade requests change nothing and emit
/// no events.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { now } => world.tick(now, out_events),
        Command::BuildTower { tile } => world.build_tower(tile, out_events),
        Command::UpgradeTower { tower } => world.upgrade_tower(tower, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use gate_defence_core::{
        EnemyView, GridCoord, Outcome, Path, StatusLedger, TileGrid, TileLayout, TowerId,
        TowerView,
    };

    use super::World;

    /// Name of the level being played.
    #[must_use]
    pub fn level_name(world: &World) -> &str {
        &world.level_name
    }

    /// Copy of the status counters shown by the HUD.
    #[must_use]
    pub fn ledger(world: &World) -> StatusLedger {
        world.ledger
    }

    /// Provides read-only access to the level's tile grid.
    #[must_use]
    pub fn tile_grid(world: &World) -> &TileGrid {
        &world.tiles
    }

    /// Placement of the grid in world space.
    #[must_use]
    pub fn layout(world: &World) -> TileLayout {
        world.layout
    }

    /// Route enemies follow from the start gate to the end gate.
    #[must_use]
    pub fn path(world: &World) -> &Path {
        world.waves.path()
    }

    /// Captures a read-only view of the enemies in play, oldest spawn first.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        world.waves.enemy_view()
    }

    /// Captures a read-only view of the towers, in build order.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Identifier of the tower occupying the tile, if any.
    #[must_use]
    pub fn tower_at(world: &World, tile: GridCoord) -> Option<TowerId> {
        world
            .towers
            .iter()
            .find(|tower| tower.tile() == tile)
            .map(|tower| tower.id())
    }

    /// How the level ended, once it has.
    #[must_use]
    pub fn outcome(world: &World) -> Option<Outcome> {
        world.outcome
    }

    /// Enemies the current wave has yet to release.
    #[must_use]
    pub fn pending_spawns(world: &World) -> u32 {
        world.waves.pending_spawns()
    }
}

#[cfg(test)]
mod tests {
    use gate_defence_core::{EnemyStats, TileValue};

    use super::*;

    fn level() -> LevelConfig {
        LevelConfig {
            name: "Bend".to_owned(),
            size: 3,
            tiles: vec![2, 0, 0, 0, 1, 0, 0, 0, 3],
            waves: 3,
            enemies_per_wave: 2,
            duration: 1.0,
            starting_cash: 250,
            starting_lives: 5,
            diagonal: false,
            enemy: EnemyStats::default(),
            tower: TowerStats::default(),
        }
    }

    #[test]
    fn towers_only_go_on_empty_tiles() {
        let mut world = World::new(&level(), TileLayout::default(), Duration::ZERO).expect("level");
        let mut events = Vec::new();

        for tile in [GridCoord::new(0, 0), GridCoord::new(1, 1), GridCoord::new(5, 5)] {
            apply(&mut world, Command::BuildTower { tile }, &mut events);
        }
        assert!(events.is_empty());
        assert_eq!(query::ledger(&world).cash(), 250);
        assert_eq!(
            query::tile_grid(&world).value(GridCoord::new(1, 0)),
            Some(TileValue::Empty)
        );

        apply(
            &mut world,
            Command::BuildTower {
                tile: GridCoord::new(1, 0),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::BuildTower {
                tile: GridCoord::new(1, 0),
            },
            &mut events,
        );
        assert_eq!(events.len(), 1);
        assert_eq!(query::ledger(&world).cash(), 150);
        assert_eq!(
            query::tower_at(&world, GridCoord::new(1, 0)),
            Some(TowerId::new(0))
        );
    }

    #[test]
    fn game_over_clears_pending_attack_visuals() {
        let mut level = level();
        level.waves = 2;
        level.tower.attack_visual_ms = 5000;
        let mut world = World::new(&level, TileLayout::default(), Duration::ZERO).expect("level");
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::BuildTower {
                tile: GridCoord::new(0, 1),
            },
            &mut events,
        );
        for now in [0, 500, 516, 1000] {
            apply(
                &mut world,
                Command::Tick {
                    now: Duration::from_millis(now),
                },
                &mut events,
            );
        }
        assert!(query::tower_view(&world).iter().all(|tower| tower.attacking));

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                now: Duration::from_millis(1200),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![
                Event::AttackVisualCleared {
                    tower: TowerId::new(0)
                },
                Event::GameOver {
                    outcome: Outcome::Victory
                },
            ]
        );
        assert!(query::tower_view(&world).iter().all(|tower| !tower.attacking));
    }

    #[test]
    fn upgrade_emits_event_with_cost() {
        let mut world = World::new(&level(), TileLayout::default(), Duration::ZERO).expect("level");
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::BuildTower {
                tile: GridCoord::new(0, 1),
            },
            &mut events,
        );
        events.clear();

        apply(
            &mut world,
            Command::UpgradeTower {
                tower: TowerId::new(0),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::TowerUpgraded {
                tower: TowerId::new(0),
                damage: 2,
                upgrades: 1,
                cost: 150,
            }]
        );
        assert_eq!(query::ledger(&world).cash(), 0);

        events.clear();
        apply(
            &mut world,
            Command::UpgradeTower {
                tower: TowerId::new(0),
            },
            &mut events,
        );
        assert!(events.is_empty());
    }
}
