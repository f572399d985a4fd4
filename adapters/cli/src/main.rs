#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that loads Gate Defence levels and plays them headlessly.

mod headless;
mod logging;
mod scenario;

use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use gate_defence_core::{
    Command, GridCoord, LevelConfig, LevelSet, Outcome, TileLayout, TileValue,
};
use gate_defence_rendering::{
    Color, FrameOutcome, Presentation, RenderingBackend, Scene, TileGridPresentation,
};
use gate_defence_world::{self as world, query, World};

use crate::{
    headless::{CountingAudio, HeadlessBackend, Pacing},
    scenario::Scenario,
};

/// Tower defence on a square grid, played from the terminal.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// List the levels in a level file.
    Levels {
        /// JSON file holding the level set.
        file: PathBuf,
    },
    /// Print the route enemies take through a level.
    Path {
        /// JSON file holding the level set.
        file: PathBuf,
        #[command(flatten)]
        selection: LevelSelection,
    },
    /// Play a level without a window until it ends or the frame budget runs out.
    Run {
        /// JSON file holding the level set.
        file: PathBuf,
        #[command(flatten)]
        selection: LevelSelection,
        /// TOML file of timed clicks to replay.
        #[arg(long)]
        scenario: Option<PathBuf>,
        /// Maximum number of frames to simulate.
        #[arg(long, default_value_t = 36_000)]
        frames: u32,
        /// Simulated time between frames, in milliseconds.
        #[arg(long, default_value_t = 16)]
        frame_ms: u64,
        /// Follow the wall clock instead of stepping time as fast as possible.
        #[arg(long)]
        realtime: bool,
        /// Seed for cosmetic randomness such as tower skins.
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

#[derive(Debug, Args)]
struct LevelSelection {
    /// Name of the level to load.
    #[arg(long, conflicts_with = "index")]
    level: Option<String>,
    /// Menu index of the level to load.
    #[arg(long)]
    index: Option<usize>,
}

impl LevelSelection {
    fn pick<'a>(&self, levels: &'a LevelSet) -> Result<&'a LevelConfig> {
        match (&self.level, self.index) {
            (Some(name), _) => levels
                .find(name)
                .with_context(|| format!("no level named '{name}'")),
            (None, Some(index)) => levels
                .get(index)
                .with_context(|| format!("no level at index {index} ({} levels)", levels.len())),
            (None, None) => levels.get(0).context("level file holds no levels"),
        }
    }
}

/// Entry point for the Gate Defence command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        CliCommand::Levels { file } => list_levels(&load_levels(&file)?),
        CliCommand::Path { file, selection } => {
            let levels = load_levels(&file)?;
            print_path(selection.pick(&levels)?)
        }
        CliCommand::Run {
            file,
            selection,
            scenario,
            frames,
            frame_ms,
            realtime,
            seed,
        } => {
            let levels = load_levels(&file)?;
            let pacing = if realtime {
                Pacing::Realtime
            } else {
                Pacing::Fixed
            };
            let backend = HeadlessBackend::new(frames, Duration::from_millis(frame_ms), pacing);
            run_level(selection.pick(&levels)?, scenario, backend, seed)
        }
    }
}

fn load_levels(file: &Path) -> Result<LevelSet> {
    let contents = fs::read_to_string(file)
        .with_context(|| format!("failed to read level file {}", file.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse level file {}", file.display()))
}

fn list_levels(levels: &LevelSet) -> Result<()> {
    if levels.is_empty() {
        bail!("level file holds no levels");
    }
    for (index, level) in levels.iter().enumerate() {
        println!(
            "{index}: {} ({}x{}, {} waves of {}, {} cash, {} lives)",
            level.name,
            level.size,
            level.size,
            level.waves,
            level.enemies_per_wave,
            level.starting_cash,
            level.starting_lives
        );
    }
    Ok(())
}

fn print_path(level: &LevelConfig) -> Result<()> {
    let world = World::new(level, TileLayout::default(), Duration::ZERO)
        .with_context(|| format!("level '{}' is not playable", level.name))?;
    let tiles = query::tile_grid(&world);
    let route = query::path(&world).cells();

    let steps: Vec<String> = route.iter().map(GridCoord::to_string).collect();
    println!("{} tiles: {}", route.len(), steps.join(" "));

    let mut map = String::new();
    for row in 0..tiles.size() {
        for column in 0..tiles.size() {
            let coord = GridCoord::new(row, column);
            let glyph = match tiles.value(coord) {
                Some(TileValue::Start) => 'S',
                Some(TileValue::End) => 'E',
                Some(TileValue::Blocked) => '#',
                _ if route.contains(&coord) => '*',
                _ => '.',
            };
            map.push(glyph);
        }
        writeln!(map)?;
    }
    print!("{map}");
    Ok(())
}

fn run_level(
    level: &LevelConfig,
    scenario: Option<PathBuf>,
    backend: HeadlessBackend,
    seed: u64,
) -> Result<()> {
    let layout = TileLayout::default();
    let audio = CountingAudio::default();
    let mut world = World::new(level, layout, Duration::ZERO)
        .with_context(|| format!("level '{}' is not playable", level.name))?
        .with_audio(Box::new(audio.clone()));

    let grid = TileGridPresentation::new(query::tile_grid(&world), layout)?;
    let clicks = match scenario {
        Some(path) => Scenario::load(&path)?.clicks(&grid)?,
        None => Vec::new(),
    };
    let mut scene = Scene::new(grid, seed);
    scene.set_hud(query::ledger(&world));
    let presentation = Presentation::new(
        format!("Gate Defence - {}", level.name),
        Color::from_rgb_u8(24, 24, 32),
        scene,
    );

    let mut events = Vec::new();
    let mut last_frame = Duration::ZERO;
    let presentation = backend.with_clicks(clicks).run(presentation, |now, input, scene| {
        last_frame = now;
        events.clear();

        if let Some(tile) = input.click.and_then(|point| scene.tile_grid.tile_at(point)) {
            let command = match query::tower_at(&world, tile) {
                Some(tower) => Command::UpgradeTower { tower },
                None => Command::BuildTower { tile },
            };
            world::apply(&mut world, command, &mut events);
        }
        world::apply(&mut world, Command::Tick { now }, &mut events);

        scene.apply_events(&events);
        scene.sync_enemies(&query::enemy_view(&world));
        scene.set_hud(query::ledger(&world));

        if query::outcome(&world).is_some() {
            FrameOutcome::Exit
        } else {
            FrameOutcome::Continue
        }
    })?;

    let hud = presentation.scene.hud;
    let verdict = match query::outcome(&world) {
        Some(Outcome::Victory) => "victory",
        Some(Outcome::Defeat) => "defeat",
        None => "unfinished",
    };
    println!(
        "{}: {verdict} after {:.1}s at wave {} with {} lives, {} cash, {} towers, {} shots",
        query::level_name(&world),
        last_frame.as_secs_f64(),
        hud.wave,
        hud.lives,
        hud.cash,
        query::tower_view(&world).iter().count(),
        audio.plays()
    );
    Ok(())
}
