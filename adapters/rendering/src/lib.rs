#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Gate Defence adapters.
//!
//! The simulation computes positions and broadcasts events; a [`Scene`]
//! folds those events into the set of visuals a backend should draw. Backends
//! implement [`RenderingBackend`] and drive the simulation once per frame.

use std::time::Duration;

use anyhow::Result as AnyResult;
use gate_defence_core::{
    CashLedger, EnemyId, EnemyView, Event, GridCoord, Outcome, ProgressLedger, StatusLedger,
    TileGrid, TileLayout, TileValue, TowerId, WorldPoint,
};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Fill color used for a tile of the provided value.
    #[must_use]
    pub const fn for_tile(value: TileValue) -> Self {
        match value {
            TileValue::Empty => Self::from_rgb_u8(86, 125, 70),
            TileValue::Blocked => Self::from_rgb_u8(150, 120, 90),
            TileValue::Start => Self::from_rgb_u8(60, 90, 200),
            TileValue::End => Self::from_rgb_u8(200, 60, 60),
        }
    }
}

/// Converts a simulation point into a rendering vector.
#[must_use]
pub fn to_vec2(point: WorldPoint) -> Vec2 {
    Vec2::new(point.x, point.y)
}

/// Tile grid as drawn on screen.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGridPresentation {
    size: u32,
    origin: Vec2,
    tile_size: f32,
    tiles: Vec<TileValue>,
}

impl TileGridPresentation {
    /// Creates a grid presentation from the level's tiles and layout.
    pub fn new(tiles: &TileGrid, layout: TileLayout) -> Result<Self, RenderingError> {
        let tile_size = layout.tile_size();
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(RenderingError::InvalidTileSize { tile_size });
        }

        Ok(Self {
            size: tiles.size(),
            origin: to_vec2(layout.origin()),
            tile_size,
            tiles: tiles.iter().map(|(_, value)| value).collect(),
        })
    }

    /// Number of rows and columns.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Side length of a tile in world units.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Width and height of the grid in world units.
    #[must_use]
    pub fn extent(&self) -> f32 {
        self.size as f32 * self.tile_size
    }

    /// Iterates over the tiles with their upper-left corner and fill color.
    pub fn tiles(&self) -> impl Iterator<Item = (Vec2, Color)> + '_ {
        let size = self.size.max(1) as usize;
        self.tiles.iter().enumerate().map(move |(index, value)| {
            let column = (index % size) as f32;
            let row = (index / size) as f32;
            let corner = self.origin + Vec2::new(column, row) * self.tile_size;
            (corner, Color::for_tile(*value))
        })
    }

    /// Maps a world-space point, such as a click, onto the tile beneath it.
    #[must_use]
    pub fn tile_at(&self, position: Vec2) -> Option<GridCoord> {
        let local = (position - self.origin) / self.tile_size;
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let column = local.x.floor() as u32;
        let row = local.y.floor() as u32;
        (column < self.size && row < self.size).then(|| GridCoord::new(row, column))
    }

    /// World-space centre of a tile.
    #[must_use]
    pub fn tile_centre(&self, tile: GridCoord) -> Vec2 {
        self.origin
            + (Vec2::new(tile.column() as f32, tile.row() as f32) + Vec2::splat(0.5))
                * self.tile_size
    }
}

/// Artwork chosen for a tower when it is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TowerSkin {
    /// Goose portrait.
    Gander,
    /// Demon portrait.
    Demon,
}

impl TowerSkin {
    /// Scale applied to the skin's texture.
    #[must_use]
    pub const fn scale(self) -> f32 {
        match self {
            Self::Gander => 0.15,
            Self::Demon => 0.75,
        }
    }
}

/// Enemy sprite state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyPresentation {
    /// Identifier of the enemy.
    pub id: EnemyId,
    /// Upper-left corner of the sprite.
    pub position: Vec2,
    /// Remaining health.
    pub health: i32,
}

/// Tower sprite state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerPresentation {
    /// Identifier of the tower.
    pub id: TowerId,
    /// Tile the tower occupies.
    pub tile: GridCoord,
    /// Upper-left corner of the sprite.
    pub position: Vec2,
    /// Artwork drawn for the tower.
    pub skin: TowerSkin,
    /// Damage dealt per shot.
    pub damage: u32,
    /// Number of upgrades applied.
    pub upgrades: u32,
}

/// Laser drawn from a tower towards the enemy it hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackBeam {
    /// Tower emitting the beam.
    pub tower: TowerId,
    /// Start of the beam, at the tower's centre.
    pub origin: Vec2,
    /// Length of the beam in world units.
    pub length: f32,
    /// Rotation of the beam in radians.
    pub angle: f32,
}

impl AttackBeam {
    /// Builds the beam between a tower anchor and the enemy it hit.
    ///
    /// The length is the Manhattan distance shortened by half a tile, so the
    /// beam stops short of the target's sprite.
    #[must_use]
    pub fn between(tower: TowerId, from: Vec2, to: Vec2, tile_size: f32) -> Self {
        let offset = to - from;
        let distance = offset.x.abs() + offset.y.abs();
        Self {
            tower,
            origin: from + Vec2::splat(tile_size / 2.0),
            length: (distance - tile_size / 2.0).max(0.0),
            angle: offset.y.atan2(offset.x),
        }
    }
}

/// Counters drawn in the info bar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hud {
    /// Cash available.
    pub cash: u32,
    /// Lives remaining.
    pub lives: u32,
    /// Current wave.
    pub wave: u32,
    /// Whether the level ended.
    pub game_over: bool,
}

impl From<StatusLedger> for Hud {
    fn from(ledger: StatusLedger) -> Self {
        Self {
            cash: ledger.cash(),
            lives: ledger.lives(),
            wave: ledger.wave(),
            game_over: ledger.game_over(),
        }
    }
}

/// Everything a backend draws for one frame.
#[derive(Clone, Debug)]
pub struct Scene {
    /// Tile grid forming the play area.
    pub tile_grid: TileGridPresentation,
    /// Enemies in play, oldest spawn first.
    pub enemies: Vec<EnemyPresentation>,
    /// Towers in build order.
    pub towers: Vec<TowerPresentation>,
    /// Attack beams currently showing, at most one per tower.
    pub beams: Vec<AttackBeam>,
    /// Info bar counters.
    pub hud: Hud,
    /// How the level ended, once it has.
    pub outcome: Option<Outcome>,
    skins: ChaCha8Rng,
}

impl Scene {
    /// Creates an empty scene. `seed` drives the artwork chosen for towers.
    #[must_use]
    pub fn new(tile_grid: TileGridPresentation, seed: u64) -> Self {
        Self {
            tile_grid,
            enemies: Vec::new(),
            towers: Vec::new(),
            beams: Vec::new(),
            hud: Hud::default(),
            outcome: None,
            skins: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Folds simulation events into the visuals.
    pub fn apply_events(&mut self, events: &[Event]) {
        for event in events {
            match *event {
                Event::WaveStarted { wave } => self.hud.wave = wave,
                Event::EnemySpawned {
                    enemy,
                    position,
                    health,
                    ..
                } => self.enemies.push(EnemyPresentation {
                    id: enemy,
                    position: to_vec2(position),
                    health,
                }),
                Event::EnemyRemoved { enemy, .. } => {
                    self.enemies.retain(|presentation| presentation.id != enemy);
                }
                Event::TowerBuilt {
                    tower,
                    tile,
                    position,
                    damage,
                    ..
                } => {
                    let skin = if self.skins.gen_bool(0.5) {
                        TowerSkin::Demon
                    } else {
                        TowerSkin::Gander
                    };
                    self.towers.push(TowerPresentation {
                        id: tower,
                        tile,
                        position: to_vec2(position),
                        skin,
                        damage,
                        upgrades: 0,
                    });
                }
                Event::TowerUpgraded {
                    tower,
                    damage,
                    upgrades,
                    ..
                } => {
                    if let Some(presentation) = self.towers.iter_mut().find(|t| t.id == tower) {
                        presentation.damage = damage;
                        presentation.upgrades = upgrades;
                    }
                }
                Event::TowerFired {
                    tower,
                    from,
                    to,
                    damage,
                    ..
                } => {
                    if let Some(presentation) = self.towers.iter_mut().find(|t| t.id == tower) {
                        presentation.damage = damage;
                    }
                    let beam = AttackBeam::between(
                        tower,
                        to_vec2(from),
                        to_vec2(to),
                        self.tile_grid.tile_size(),
                    );
                    self.beams.retain(|existing| existing.tower != tower);
                    self.beams.push(beam);
                }
                Event::AttackVisualCleared { tower } => {
                    self.beams.retain(|beam| beam.tower != tower);
                }
                Event::GameOver { outcome } => {
                    self.outcome = Some(outcome);
                    self.hud.game_over = true;
                }
            }
        }
    }

    /// Moves enemy sprites to the positions reported by the simulation.
    pub fn sync_enemies(&mut self, view: &EnemyView) {
        for snapshot in view.iter() {
            if let Some(presentation) = self
                .enemies
                .iter_mut()
                .find(|presentation| presentation.id == snapshot.id)
            {
                presentation.position = to_vec2(snapshot.position);
                presentation.health = snapshot.health;
            }
        }
    }

    /// Replaces the info bar counters.
    pub fn set_hud(&mut self, ledger: StatusLedger) {
        self.hud = Hud::from(ledger);
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Input gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// World-space position of a click or tap registered this frame.
    pub click: Option<Vec2>,
}

/// Whether the backend should keep presenting frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Present another frame.
    Continue,
    /// Stop the backend.
    Exit,
}

/// Rendering backend capable of presenting Gate Defence scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the simulation time of the
    /// frame and the input captured by the adapter, and mutates the scene
    /// before it is presented.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<Presentation>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameOutcome;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq, Error)]
pub enum RenderingError {
    /// Tiles must have a positive, finite side length.
    #[error("tile size must be positive (received {tile_size})")]
    InvalidTileSize {
        /// Provided tile size that failed validation.
        tile_size: f32,
    },
}

#[cfg(test)]
mod tests {
    use gate_defence_core::{RemovalCause, WorldPoint};

    use super::*;

    fn grid() -> TileGridPresentation {
        let tiles = TileGrid::from_raw(3, &[2, 0, 0, 0, 1, 0, 0, 0, 3]).expect("valid grid");
        TileGridPresentation::new(&tiles, TileLayout::new(WorldPoint::new(10.0, 0.0), 40.0))
            .expect("valid layout")
    }

    #[test]
    fn rejects_non_positive_tile_size_without_panicking() {
        let tiles = TileGrid::from_raw(1, &[2]).expect("valid grid");
        let error = TileGridPresentation::new(&tiles, TileLayout::new(WorldPoint::default(), 0.0))
            .expect_err("zero tile size must be rejected");
        assert_eq!(error, RenderingError::InvalidTileSize { tile_size: 0.0 });
    }

    #[test]
    fn clicks_map_onto_tiles() {
        let grid = grid();
        assert_eq!(grid.tile_at(Vec2::new(15.0, 5.0)), Some(GridCoord::new(0, 0)));
        assert_eq!(grid.tile_at(Vec2::new(95.0, 45.0)), Some(GridCoord::new(1, 2)));
        assert_eq!(grid.tile_at(Vec2::new(5.0, 5.0)), None);
        assert_eq!(grid.tile_at(Vec2::new(130.0, 5.0)), None);
        assert_eq!(
            grid.tile_at(grid.tile_centre(GridCoord::new(2, 1))),
            Some(GridCoord::new(2, 1))
        );
    }

    #[test]
    fn beam_stops_half_a_tile_short() {
        let beam = AttackBeam::between(
            TowerId::new(0),
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 60.0),
            40.0,
        );
        assert_eq!(beam.origin, Vec2::new(20.0, 20.0));
        assert_eq!(beam.length, 40.0);
        assert!((beam.angle - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn events_add_and_remove_visuals() {
        let mut scene = Scene::new(grid(), 7);
        let tower = TowerId::new(0);
        let enemy = EnemyId::new(4);
        scene.apply_events(&[
            Event::TowerBuilt {
                tower,
                tile: GridCoord::new(0, 1),
                position: WorldPoint::new(50.0, 0.0),
                damage: 1,
                cost: 100,
            },
            Event::EnemySpawned {
                enemy,
                position: WorldPoint::new(10.0, 0.0),
                health: 6,
                worth: 11,
            },
            Event::TowerFired {
                tower,
                enemy,
                from: WorldPoint::new(50.0, 0.0),
                to: WorldPoint::new(10.0, 0.0),
                damage: 1,
            },
        ]);
        assert_eq!(scene.towers.len(), 1);
        assert_eq!(scene.enemies.len(), 1);
        assert_eq!(scene.beams.len(), 1);

        scene.apply_events(&[
            Event::AttackVisualCleared { tower },
            Event::EnemyRemoved {
                enemy,
                cause: RemovalCause::Killed { worth: 11 },
            },
            Event::GameOver {
                outcome: Outcome::Victory,
            },
        ]);
        assert!(scene.beams.is_empty());
        assert!(scene.enemies.is_empty());
        assert_eq!(scene.outcome, Some(Outcome::Victory));
        assert!(scene.hud.game_over);
    }

    #[test]
    fn tower_skins_follow_the_seed() {
        let build = |seed| {
            let mut scene = Scene::new(grid(), seed);
            let events: Vec<_> = (0..8)
                .map(|id| Event::TowerBuilt {
                    tower: TowerId::new(id),
                    tile: GridCoord::new(0, 1),
                    position: WorldPoint::default(),
                    damage: 1,
                    cost: 100,
                })
                .collect();
            scene.apply_events(&events);
            scene.towers.iter().map(|tower| tower.skin).collect::<Vec<_>>()
        };
        assert_eq!(build(42), build(42));
    }
}
