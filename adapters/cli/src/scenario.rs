//! Scripted player input replayed during headless runs.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use gate_defence_core::GridCoord;
use gate_defence_rendering::TileGridPresentation;
use glam::Vec2;
use serde::Deserialize;
use thiserror::Error;

/// Timed clicks loaded from a TOML file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct Scenario {
    #[serde(default)]
    click: Vec<Click>,
}

/// Click on a tile at a given simulation time.
///
/// Clicking an empty tile builds a tower; clicking a tower upgrades it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
struct Click {
    at_ms: u64,
    row: u32,
    column: u32,
}

impl Scenario {
    /// Reads and parses a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self, ScenarioError> {
        let contents = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(contents)?)
    }

    /// Converts the clicks into world-space points at tile centres, ordered by time.
    pub(crate) fn clicks(
        &self,
        grid: &TileGridPresentation,
    ) -> Result<Vec<(Duration, Vec2)>, ScenarioError> {
        let mut clicks = self
            .click
            .iter()
            .map(|click| {
                if click.row >= grid.size() || click.column >= grid.size() {
                    return Err(ScenarioError::OutsideGrid {
                        row: click.row,
                        column: click.column,
                        size: grid.size(),
                    });
                }
                let tile = GridCoord::new(click.row, click.column);
                Ok((Duration::from_millis(click.at_ms), grid.tile_centre(tile)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        clicks.sort_by_key(|(at, _)| *at);
        Ok(clicks)
    }
}

/// Errors raised while loading a scenario.
#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    /// The file could not be read.
    #[error("failed to read scenario {}", path.display())]
    Read {
        /// Location of the scenario.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// The file is not valid scenario TOML.
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),
    /// A click targets a tile outside the level.
    #[error("click at ({row}, {column}) lies outside the {size}x{size} grid")]
    OutsideGrid {
        /// Row of the click.
        row: u32,
        /// Column of the click.
        column: u32,
        /// Grid size of the level.
        size: u32,
    },
}
