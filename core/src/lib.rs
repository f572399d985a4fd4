#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gate Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the entity systems. Adapters submit [`Command`]
//! values describing player input and the passage of time, the world executes
//! those commands via its `apply` entry point, and then broadcasts [`Event`]
//! values so rendering and audio layers can add, move, and remove visuals.
//! Entity systems never touch each other directly: enemies and towers mutate
//! the shared economy through the [`CashLedger`] and [`ProgressLedger`]
//! capabilities, and towers discover targets through [`EnemyProvider`].

mod ledger;
mod level;

use std::{
    fmt,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use ledger::{CashLedger, ProgressLedger, StatusLedger};
pub use level::{EnemyStats, LevelConfig, LevelError, LevelSet, TowerStats, WAVE_REST_FACTOR};

/// Side length of a tile, in world units, when the rendering layer does not provide one.
pub const DEFAULT_TILE_SIZE: f32 = 40.0;

/// Location of a single tile expressed as row and column indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    row: u32,
    column: u32,
}

impl GridCoord {
    /// Creates a new grid coordinate from a row and a column.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Computes the Manhattan distance between two grid coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: GridCoord) -> u32 {
        self.row().abs_diff(other.row()) + self.column().abs_diff(other.column())
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Meaning assigned to a tile by the level data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileValue {
    /// Open ground that enemies may cross and towers may occupy.
    Empty,
    /// Tile that enemies cannot traverse.
    Blocked,
    /// Gate where enemies enter the level.
    Start,
    /// Gate enemies attempt to reach.
    End,
}

impl TileValue {
    /// Decodes the numeric value stored in level data.
    #[must_use]
    pub const fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Empty),
            1 => Some(Self::Blocked),
            2 => Some(Self::Start),
            3 => Some(Self::End),
            _ => None,
        }
    }

    /// Numeric value used by level data.
    #[must_use]
    pub const fn raw(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Blocked => 1,
            Self::Start => 2,
            Self::End => 3,
        }
    }

    /// Reports whether enemies may traverse the tile.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Blocked)
    }

    /// Reports whether the player may build a tower on the tile.
    #[must_use]
    pub const fn is_buildable(self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Square grid of tile values describing a level layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    size: u32,
    values: Vec<TileValue>,
}

impl TileGrid {
    /// Decodes a flattened, row-major array of raw tile values.
    ///
    /// The array must contain exactly `size * size` entries and every entry
    /// must map onto a [`TileValue`].
    pub fn from_raw(size: u32, raw: &[u8]) -> Result<Self, LevelError> {
        if size == 0 {
            return Err(LevelError::EmptyGrid);
        }

        let expected = usize::try_from(u64::from(size) * u64::from(size)).unwrap_or(usize::MAX);
        if raw.len() != expected {
            return Err(LevelError::TileCountMismatch {
                size,
                actual: raw.len(),
            });
        }

        let values = raw
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                TileValue::from_raw(value).ok_or(LevelError::UnknownTileValue { index, value })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { size, values })
    }

    /// Number of rows and columns contained in the grid.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Value of the tile at the provided coordinate, if it lies within the grid.
    #[must_use]
    pub fn value(&self, coord: GridCoord) -> Option<TileValue> {
        self.index(coord)
            .and_then(|index| self.values.get(index).copied())
    }

    /// Iterates over every tile in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, TileValue)> + '_ {
        let size = self.size;
        self.values.iter().enumerate().map(move |(index, value)| {
            let index = u32::try_from(index).unwrap_or(u32::MAX);
            (GridCoord::new(index / size, index % size), *value)
        })
    }

    /// Locates the first tile, in row-major order, that carries the provided value.
    #[must_use]
    pub fn find(&self, value: TileValue) -> Option<GridCoord> {
        self.iter()
            .find(|(_, candidate)| *candidate == value)
            .map(|(coord, _)| coord)
    }

    fn index(&self, coord: GridCoord) -> Option<usize> {
        if coord.row() < self.size && coord.column() < self.size {
            let row = usize::try_from(coord.row()).ok()?;
            let column = usize::try_from(coord.column()).ok()?;
            let width = usize::try_from(self.size).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Continuous position expressed in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal coordinate, growing to the right.
    pub x: f32,
    /// Vertical coordinate, growing downwards.
    pub y: f32,
}

impl WorldPoint {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Computes the Manhattan distance between two points.
    #[must_use]
    pub fn manhattan_distance(self, other: WorldPoint) -> f32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Placement of the tile grid in world space, owned by the rendering layer.
///
/// Tiles are anchored at their upper-left corner: tile `(row, column)` sits at
/// `origin + (column * tile_size, row * tile_size)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileLayout {
    origin: WorldPoint,
    tile_size: f32,
}

impl TileLayout {
    /// Creates a new layout from the grid origin and the tile side length.
    #[must_use]
    pub const fn new(origin: WorldPoint, tile_size: f32) -> Self {
        Self { origin, tile_size }
    }

    /// Upper-left corner of the grid.
    #[must_use]
    pub const fn origin(&self) -> WorldPoint {
        self.origin
    }

    /// Side length of a single square tile expressed in world units.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// World-space position of the provided tile.
    #[must_use]
    pub fn tile_position(&self, coord: GridCoord) -> WorldPoint {
        WorldPoint::new(
            self.origin.x + coord.column() as f32 * self.tile_size,
            self.origin.y + coord.row() as f32 * self.tile_size,
        )
    }
}

impl Default for TileLayout {
    fn default() -> Self {
        Self::new(WorldPoint::default(), DEFAULT_TILE_SIZE)
    }
}

/// Route from the start gate to the end gate, resolved into world space.
///
/// A path is computed once per level and lent read-only to every enemy.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    cells: Vec<GridCoord>,
    waypoints: Vec<WorldPoint>,
}

impl Path {
    /// Resolves grid coordinates into world-space waypoints using the layout.
    #[must_use]
    pub fn resolve(cells: Vec<GridCoord>, layout: &TileLayout) -> Self {
        let waypoints = cells
            .iter()
            .map(|cell| layout.tile_position(*cell))
            .collect();
        Self { cells, waypoints }
    }

    /// Grid coordinates visited by the path, start and end inclusive.
    #[must_use]
    pub fn cells(&self) -> &[GridCoord] {
        &self.cells
    }

    /// World-space position of the waypoint at the provided index.
    #[must_use]
    pub fn waypoint(&self, index: usize) -> Option<WorldPoint> {
        self.waypoints.get(index).copied()
    }

    /// World-space position of the start gate.
    #[must_use]
    pub fn start(&self) -> Option<WorldPoint> {
        self.waypoints.first().copied()
    }

    /// Number of waypoints composing the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the path holds no waypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Lifecycle state of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyState {
    /// The enemy walks the path and can be targeted.
    Active,
    /// Health dropped to zero or below. Terminal.
    Dead,
    /// The enemy reached the end gate. Terminal.
    Escaped,
}

/// Result of applying damage to a combat target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The target was already dead or escaped; nothing changed.
    Ignored,
    /// The target survived with the remaining health.
    Wounded {
        /// Health left after the hit.
        remaining: i32,
    },
    /// The hit killed the target and its worth was credited.
    Killed {
        /// Cash credited to the ledger for the kill.
        worth: u32,
    },
}

/// Contract a tower relies on when attacking an enemy.
pub trait CombatTarget {
    /// Identifier of the target.
    fn id(&self) -> EnemyId;

    /// Current world-space position of the target.
    fn position(&self) -> WorldPoint;

    /// Reports whether the target is still walking the path.
    fn is_active(&self) -> bool;

    /// Subtracts `amount` from the target's health, crediting its worth on death.
    fn apply_damage<L>(&mut self, amount: u32, ledger: &mut L) -> DamageOutcome
    where
        L: CashLedger + ?Sized;
}

/// Capability that lends towers the active enemy list.
pub trait EnemyProvider {
    /// Concrete enemy type stored by the provider.
    type Enemy: CombatTarget;

    /// Enemies currently in play, oldest spawn first.
    fn list_active(&mut self) -> &mut [Self::Enemy];
}

/// Source of monotonic simulation time measured from session start.
pub trait Clock {
    /// Current simulation time.
    fn now(&self) -> Duration;
}

/// Clock backed by the operating system's monotonic timer.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Starts a clock whose zero is the moment of the call.
    #[must_use]
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to, used by tests and headless replays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManualClock {
    now: Duration,
}

impl ManualClock {
    /// Creates a clock frozen at the provided time.
    #[must_use]
    pub const fn at(now: Duration) -> Self {
        Self { now }
    }

    /// Moves the clock forward by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now
    }
}

/// Fire-and-forget sound effects requested by the simulation.
pub trait AudioSink: fmt::Debug {
    /// Plays the tower attack sound.
    fn play_attack(&mut self) -> Result<(), AudioError>;
}

/// Errors reported by audio sinks. The simulation logs and otherwise ignores them.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AudioError {
    /// No audio device is available.
    #[error("audio device unavailable")]
    Unavailable,
    /// The sound could not be played.
    #[error("failed to play sound: {0}")]
    Playback(String),
}

/// Audio sink that discards every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play_attack(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Runs one simulation tick at the provided monotonic time.
    Tick {
        /// Simulation time measured from session start.
        now: Duration,
    },
    /// Requests a tower on the provided tile.
    BuildTower {
        /// Tile the player clicked.
        tile: GridCoord,
    },
    /// Requests an upgrade of an existing tower.
    UpgradeTower {
        /// Identifier of the tower the player clicked.
        tower: TowerId,
    },
}

/// Reason an enemy left the active list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemovalCause {
    /// The enemy was destroyed by towers.
    Killed {
        /// Cash credited for the kill.
        worth: u32,
    },
    /// The enemy reached the end gate and cost a life.
    Escaped,
}

/// How a level ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Every configured wave elapsed with lives remaining.
    Victory,
    /// The player ran out of lives.
    Defeat,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that a new wave began spawning.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
    },
    /// Confirms that an enemy entered the level at the start gate.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// World-space spawn position.
        position: WorldPoint,
        /// Health granted for the current wave.
        health: i32,
        /// Cash the enemy is worth when killed.
        worth: u32,
    },
    /// Signals that an enemy left the active list and its visual should go.
    EnemyRemoved {
        /// Identifier of the removed enemy.
        enemy: EnemyId,
        /// Why the enemy was removed.
        cause: RemovalCause,
    },
    /// Confirms that a tower was built.
    TowerBuilt {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Tile the tower occupies.
        tile: GridCoord,
        /// World-space anchor of the tower.
        position: WorldPoint,
        /// Damage dealt per shot.
        damage: u32,
        /// Cash deducted for the tower.
        cost: u32,
    },
    /// Confirms that a tower was upgraded.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Damage dealt per shot after the upgrade.
        damage: u32,
        /// Number of upgrades applied so far.
        upgrades: u32,
        /// Cash deducted for the upgrade.
        cost: u32,
    },
    /// Reports that a tower hit an enemy.
    TowerFired {
        /// Identifier of the attacking tower.
        tower: TowerId,
        /// Identifier of the enemy hit.
        enemy: EnemyId,
        /// World-space anchor of the tower.
        from: WorldPoint,
        /// World-space position of the enemy when hit.
        to: WorldPoint,
        /// Damage applied by the shot.
        damage: u32,
    },
    /// Signals that a tower's attack visual expired.
    AttackVisualCleared {
        /// Identifier of the tower whose beam should disappear.
        tower: TowerId,
    },
    /// Announces the end of the level. Emitted once.
    GameOver {
        /// How the level ended.
        outcome: Outcome,
    },
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Current world-space position.
    pub position: WorldPoint,
    /// Remaining health.
    pub health: i32,
    /// Index of the waypoint the enemy is walking towards.
    pub path_index: usize,
    /// Lifecycle state.
    pub state: EnemyState,
}

/// Read-only snapshot describing all enemies in play, oldest spawn first.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from snapshots already in spawn order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<EnemySnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no enemies are in play.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Tile the tower occupies.
    pub tile: GridCoord,
    /// World-space anchor of the tower.
    pub position: WorldPoint,
    /// Damage dealt per shot.
    pub damage: u32,
    /// Number of upgrades applied.
    pub upgrades: u32,
    /// Cash required for the next upgrade.
    pub upgrade_cost: u32,
    /// Indicates whether the tower's attack visual is showing.
    pub attacking: bool,
}

/// Read-only snapshot describing all towers, in build order.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}
