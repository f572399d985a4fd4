//! Level configuration loaded from level data files.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{GridCoord, TileGrid, TileValue};

/// Ratio between the wave interval and the level duration, leaving a 20% rest buffer.
pub const WAVE_REST_FACTOR: f64 = 1.2;

/// Collection of playable levels, in menu order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelSet {
    levels: Vec<LevelConfig>,
}

impl LevelSet {
    /// Creates a level set from the provided levels.
    #[must_use]
    pub fn new(levels: Vec<LevelConfig>) -> Self {
        Self { levels }
    }

    /// Finds the first level with the provided name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&LevelConfig> {
        self.levels.iter().find(|level| level.name == name)
    }

    /// Retrieves the level at the provided menu index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LevelConfig> {
        self.levels.get(index)
    }

    /// Iterates over the levels in menu order.
    pub fn iter(&self) -> impl Iterator<Item = &LevelConfig> {
        self.levels.iter()
    }

    /// Number of levels in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Reports whether the set holds no levels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Structured record describing a single level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Display name of the level.
    pub name: String,
    /// Number of rows and columns in the square grid.
    pub size: u32,
    /// Flattened, row-major tile values.
    pub tiles: Vec<u8>,
    /// Total number of waves configured for the level.
    pub waves: u32,
    /// Number of enemies spawned per wave.
    #[serde(rename = "enemyPerWave")]
    pub enemies_per_wave: u32,
    /// Length of a wave's spawn window, in seconds.
    pub duration: f64,
    /// Cash available when the level starts.
    #[serde(rename = "money")]
    pub starting_cash: u32,
    /// Lives available when the level starts.
    #[serde(rename = "lives")]
    pub starting_lives: u32,
    /// Enables 8-directional movement.
    #[serde(default)]
    pub diagonal: bool,
    /// Base statistics of the level's enemies.
    #[serde(default)]
    pub enemy: EnemyStats,
    /// Statistics of the level's towers.
    #[serde(default)]
    pub tower: TowerStats,
}

impl LevelConfig {
    /// Checks the scalar parameters and decodes the tile grid.
    ///
    /// Reachability of the end gate is checked when the path is computed.
    pub fn validate(&self) -> Result<TileGrid, LevelError> {
        if self.enemies_per_wave == 0 {
            return Err(LevelError::NoEnemiesPerWave);
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(LevelError::InvalidDuration {
                seconds: self.duration,
            });
        }
        self.enemy.validate()?;
        self.tower.validate()?;
        self.tile_grid()
    }

    /// Decodes the tile grid and locates both gates.
    pub fn tile_grid(&self) -> Result<TileGrid, LevelError> {
        let grid = TileGrid::from_raw(self.size, &self.tiles)?;
        if grid.find(TileValue::Start).is_none() {
            return Err(LevelError::MissingStartGate);
        }
        if grid.find(TileValue::End).is_none() {
            return Err(LevelError::MissingEndGate);
        }
        Ok(grid)
    }

    /// Time between two wave starts.
    #[must_use]
    pub fn wave_interval(&self) -> Duration {
        millis(self.duration * WAVE_REST_FACTOR)
    }

    /// Time between two spawns inside a wave.
    #[must_use]
    pub fn spawn_interval(&self) -> Duration {
        millis(self.duration / f64::from(self.enemies_per_wave.max(1)))
    }
}

// Timers run at millisecond resolution, rounded to the nearest millisecond.
fn millis(seconds: f64) -> Duration {
    let millis = (seconds * 1000.0).round();
    if millis.is_finite() && millis > 0.0 {
        Duration::from_millis(millis as u64)
    } else {
        Duration::ZERO
    }
}

fn check_stat(table: &'static str, field: &'static str, value: f64) -> Result<(), LevelError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LevelError::InvalidStat {
            table,
            field,
            value,
        })
    }
}

/// Base statistics used when spawning enemies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyStats {
    /// Health at wave zero. The wave number is added on spawn.
    pub health: i32,
    /// Cash reward at wave zero. The wave number is added on spawn.
    pub worth: u32,
    /// Movement speed in world units per second.
    pub speed: f32,
}

impl EnemyStats {
    /// Rejects non-finite or negative speeds.
    pub fn validate(&self) -> Result<(), LevelError> {
        check_stat("enemy", "speed", f64::from(self.speed))
    }
}

impl Default for EnemyStats {
    fn default() -> Self {
        Self {
            health: 5,
            worth: 10,
            speed: 40.0,
        }
    }
}

/// Statistics shared by every tower of a level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TowerStats {
    /// Cash required to build a tower.
    pub cost: u32,
    /// Damage dealt per shot before upgrades.
    pub damage: u32,
    /// Attack range as a multiple of the tile size.
    pub range: f32,
    /// Minimum time between two shots, in milliseconds.
    pub cooldown_ms: u64,
    /// Multiplier applied to the upgrade cost.
    pub upgrade_multiplier: f64,
    /// Damage added by each upgrade.
    pub upgrade_damage_step: u32,
    /// Lifetime of the attack visual, in milliseconds.
    pub attack_visual_ms: u64,
}

impl TowerStats {
    /// Rejects non-finite or negative range and upgrade multiplier.
    pub fn validate(&self) -> Result<(), LevelError> {
        check_stat("tower", "range", f64::from(self.range))?;
        check_stat("tower", "upgradeMultiplier", self.upgrade_multiplier)
    }

    /// Minimum time between two shots.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Lifetime of the attack visual.
    #[must_use]
    pub const fn attack_visual(&self) -> Duration {
        Duration::from_millis(self.attack_visual_ms)
    }

    /// Cash required for the upgrade following `upgrades` earlier ones.
    ///
    /// Fractional costs round up.
    #[must_use]
    pub fn upgrade_cost(&self, upgrades: u32) -> u32 {
        let cost = f64::from(self.cost) * (f64::from(upgrades) + 1.0) * self.upgrade_multiplier;
        if cost >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            cost.ceil().max(0.0) as u32
        }
    }
}

impl Default for TowerStats {
    fn default() -> Self {
        Self {
            cost: 100,
            damage: 1,
            range: 2.0,
            cooldown_ms: 1000,
            upgrade_multiplier: 1.5,
            upgrade_damage_step: 1,
            attack_visual_ms: 500,
        }
    }
}

/// Errors reported while loading a level.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LevelError {
    /// The grid has no rows.
    #[error("level grid must contain at least one tile")]
    EmptyGrid,
    /// The tile array does not fill the square grid.
    #[error("expected {size}x{size} tiles, found {actual}")]
    TileCountMismatch {
        /// Declared grid size.
        size: u32,
        /// Number of tiles supplied.
        actual: usize,
    },
    /// A tile carries a value outside the known set.
    #[error("tile {index} has unknown value {value}")]
    UnknownTileValue {
        /// Row-major index of the offending tile.
        index: usize,
        /// Raw value found.
        value: u8,
    },
    /// The level spawns no enemies.
    #[error("level must spawn at least one enemy per wave")]
    NoEnemiesPerWave,
    /// The wave duration is not a positive number of seconds.
    #[error("wave duration must be positive, found {seconds}")]
    InvalidDuration {
        /// Duration found in the level data.
        seconds: f64,
    },
    /// A statistics table holds a negative or non-finite number.
    #[error("{table} {field} must be a finite, non-negative number, found {value}")]
    InvalidStat {
        /// Table holding the field, `enemy` or `tower`.
        table: &'static str,
        /// Field name as written in level data.
        field: &'static str,
        /// Value found.
        value: f64,
    },
    /// No tile marks the start gate.
    #[error("level has no start gate")]
    MissingStartGate,
    /// No tile marks the end gate.
    #[error("level has no end gate")]
    MissingEndGate,
    /// Blocked tiles disconnect the gates.
    #[error("end gate {end} cannot be reached from start gate {start}")]
    UnreachableEndGate {
        /// Start gate coordinate.
        start: GridCoord,
        /// End gate coordinate.
        end: GridCoord,
    },
}
