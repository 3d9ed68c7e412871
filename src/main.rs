//! Tremolo headless runner.
//!
//! Loads the configuration and a level grid, fills the terrain with solid
//! tiles, spawns a demo population and runs the simulation for a number of
//! ticks, logging what a renderer and an audio backend would receive.
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run -- --level level.json --ticks 600
//! ```

use std::path::PathBuf;

use clap::Parser;
use glam::Vec2;

use tremolo::actors::SpawnParams;
use tremolo::components::kind::Kind;
use tremolo::error::Result;
use tremolo::events::input::InputKind;
use tremolo::game::Simulation;
use tremolo::resources::gameconfig::GameConfig;
use tremolo::resources::input::keys;
use tremolo::resources::tilegrid::{SolidMasks, TileGrid};
use tremolo::selection::Selection;
use tremolo::systems::render::{DrawCmd, Renderer};

/// Tremolo simulation core, headless
#[derive(Parser)]
#[command(version, about = "Runs the tremolo simulation without a window.")]
struct Cli {
    /// INI configuration; defaults are used when the file is missing.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Level grid descriptor (JSON or digit rows). A flat strip when absent.
    #[arg(long, value_name = "PATH")]
    level: Option<PathBuf>,

    /// Number of ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Seconds per tick.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Seed for the demo population.
    #[arg(long)]
    seed: Option<u64>,
}

const DEFAULT_LEVEL: &str = "theme = desert\n0000\n1111\n";
const REPORT_EVERY: u64 = 60;

/// Counts draw calls and logs HUD lines.
#[derive(Default)]
struct LogRenderer {
    tiles: usize,
    sprites: usize,
    effects: usize,
}

impl Renderer for LogRenderer {
    fn draw(&mut self, cmd: DrawCmd) {
        match cmd {
            DrawCmd::Tile { .. } => self.tiles += 1,
            DrawCmd::Sprite { .. } => self.sprites += 1,
            DrawCmd::Effect { .. } => self.effects += 1,
            DrawCmd::Text { text, .. } => log::debug!("hud: {}", text),
        }
    }
}

impl LogRenderer {
    fn take(&mut self) -> (usize, usize, usize) {
        let counts = (self.tiles, self.sprites, self.effects);
        *self = Self::default();
        counts
    }
}

fn load_level(path: Option<&PathBuf>) -> Result<TileGrid> {
    match path {
        Some(path) => TileGrid::load_from_file(path),
        None => TileGrid::parse(DEFAULT_LEVEL),
    }
}

fn populate(sim: &mut Simulation) -> Result<()> {
    let width = sim.terrain().cols() as f32 * sim.terrain().tile_size().x;
    let sky = sim.config().origin_y - 60.0;

    let red = sim.spawn(
        Kind::Tank,
        Vec2::new(150.0, sky),
        &SpawnParams::new().with_facing(1),
    )?;
    sim.spawn(
        Kind::Tank,
        Vec2::new(width - 150.0, sky),
        &SpawnParams::new().with_facing(-1),
    )?;
    sim.spawn(Kind::Walker, Vec2::new(260.0, sky), &SpawnParams::new())?;
    sim.spawn(
        Kind::Physor,
        Vec2::new(width / 2.0, sky - 200.0),
        &SpawnParams::new().with_magnitude(if fastrand::bool() { 2.0 } else { -2.0 }),
    )?;
    for _ in 0..3 {
        let x = fastrand::f32() * width;
        sim.spawn(Kind::Digger, Vec2::new(x, sky - 100.0), &SpawnParams::new())?;
    }
    for _ in 0..4 {
        let x = fastrand::f32() * width;
        let y = sky - 150.0 - fastrand::f32() * 200.0;
        sim.spawn(Kind::Lantern, Vec2::new(x, y), &SpawnParams::new())?;
    }

    // hand the red tank the keyboard
    let mut selection = Selection::new();
    selection.click(sim.world_mut(), Some(red));
    selection.release(sim.world_mut());
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let config = GameConfig::load(&cli.config)?;
    let grid = load_level(cli.level.as_ref())?;

    let mut sim = Simulation::new(config);
    sim.load_terrain(&grid, &SolidMasks);
    populate(&mut sim)?;
    log::info!("Spawned {}", sim.summary());

    let mut renderer = LogRenderer::default();
    let mut sounds = 0usize;
    for tick in 0..cli.ticks {
        // a shot every couple of seconds from the red tank
        if tick % 120 == 30 {
            sim.on_input_event(InputKind::KeyDown, keys::SPACE);
        } else if tick % 120 == 31 {
            sim.on_input_event(InputKind::KeyUp, keys::SPACE);
        }

        sim.update_tick(cli.dt);
        sim.render_pass(0.0, 0.0, &mut renderer);
        for cmd in sim.drain_audio() {
            log::trace!("audio: {:?}", cmd);
            sounds += 1;
        }
        sim.drain_collisions();

        if (tick + 1) % REPORT_EVERY == 0 {
            let (tiles, sprites, effects) = renderer.take();
            log::info!(
                "tick {}: {} | last {} frames drew {} tiles, {} sprites, {} effects; {} sounds",
                sim.tick(),
                sim.summary(),
                REPORT_EVERY,
                tiles,
                sprites,
                effects,
                sounds
            );
            sounds = 0;
        }
    }
    log::info!("Done after {} ticks: {}", sim.tick(), sim.summary());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Some(seed) = cli.seed {
        fastrand::seed(seed);
    }
    if let Err(e) = run(&cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
