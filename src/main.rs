//! Laser Runner - headless runner
//!
//! Drives a run without a renderer: a tile probe stands in for the physics
//! host and a small autopilot holds the keys.
//!
//! # Usage
//!
//! ```bash
//! laser-runner --seed 7 --ticks 3600
//! laser-runner --level my_level.json --config tuning.json --runs 5
//! RUST_LOG=debug laser-runner --dump-frame
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use glam::Vec2;
use thiserror::Error;

use laser_runner::consts::{PLAYER_HALF_SIZE, TILE_HEIGHT};
use laser_runner::frame::Frame;
use laser_runner::sim::{GameState, LevelError, RunError, SegmentLibrary, TickInput};
use laser_runner::tuning::TuningError;
use laser_runner::{RunConfig, RunSession, Settings};

const DEMO_LEVEL: &str = include_str!("../assets/levels/demo.json");

/// Fixed simulation step
const SIM_DT: f32 = 1.0 / 60.0;

#[derive(Parser)]
#[command(name = "laser-runner")]
#[command(author, version, about = "Endless tile-segment runner (headless)")]
struct Args {
    /// Tiled JSON level (defaults to the built-in demo level)
    #[arg(long, short = 'l')]
    level: Option<PathBuf>,

    /// Tuning overrides as JSON
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Settings file (mute flags, high score); updated after the runs
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Run seed
    #[arg(long, short = 's', default_value = "1")]
    seed: u64,

    /// Maximum ticks per run
    #[arg(long, short = 't', default_value = "3600")]
    ticks: u64,

    /// Number of runs (restarts after each death)
    #[arg(long, short = 'r', default_value = "1")]
    runs: u64,

    /// Print the final frame as JSON
    #[arg(long)]
    dump_frame: bool,
}

#[derive(Debug, Error)]
enum RunnerError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Tuning(#[from] TuningError),
    #[error(transparent)]
    Run(#[from] RunError),
    #[error("failed to encode frame: {0}")]
    Frame(#[from] serde_json::Error),
}

fn read(path: &Path) -> Result<String, RunnerError> {
    fs::read_to_string(path).map_err(|source| RunnerError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve ground and ceiling contact against the live window
///
/// Snaps the body onto the floor when its feet sank into a solid tile.
fn probe(state: &GameState) -> TickInput {
    let position = state.player.position;
    let window = &state.window;
    let config = &state.config;

    let feet = position.y + PLAYER_HALF_SIZE;
    let falling = state.player.velocity.y >= 0.0;
    let grounded = falling && window.is_solid_at(position.x, feet, config);
    let resting = falling && window.is_solid_at(position.x, feet + 1.0, config);

    let resolved_position = grounded.then(|| {
        let floor = (feet / TILE_HEIGHT).floor() * TILE_HEIGHT;
        Vec2::new(position.x, floor - PLAYER_HALF_SIZE)
    });

    TickInput {
        blocked_down: grounded || resting,
        blocked_up: window.is_solid_at(position.x, position.y - PLAYER_HALF_SIZE - 1.0, config),
        resolved_position,
        ..Default::default()
    }
}

/// Hold up before gaps, walls and live spikes; dash once past the danger
fn autopilot(state: &GameState, input: &mut TickInput) {
    let position = state.player.position;
    let window = &state.window;
    let config = &state.config;
    let feet = position.y + PLAYER_HALF_SIZE;
    let look_ahead = 24.0;

    let gap_ahead = !window.is_solid_at(position.x + look_ahead, feet + 1.0, config);
    let wall_ahead = window.is_solid_at(position.x + look_ahead, position.y, config);
    let spike_ahead = window.segments().flat_map(|s| s.hazards.iter()).any(|marker| {
        !marker.triggered()
            && marker.bounds.left > position.x
            && marker.bounds.left - position.x < look_ahead
    });

    if input.blocked_down {
        input.up = gap_ahead || wall_ahead || spike_ahead;
    } else {
        input.up = state.player.is_jumping();
        input.down = !gap_ahead && state.player.velocity.y > 0.0 && position.y < 200.0;
    }
}

fn run(args: &Args) -> Result<(), RunnerError> {
    let config = match &args.config {
        Some(path) => RunConfig::from_json_str(&read(path)?)?,
        None => RunConfig::default(),
    };
    let level = match &args.level {
        Some(path) => read(path)?,
        None => DEMO_LEVEL.to_string(),
    };
    let library = SegmentLibrary::load(&level, &config.successor_properties)?;

    let settings = args
        .settings
        .as_deref()
        .map(Settings::load)
        .unwrap_or_default();

    let mut session = RunSession::new(library, config, settings, args.seed)?;
    for run in 1..=args.runs {
        if run > 1 {
            session.restart()?;
        }
        for _ in 0..args.ticks {
            let mut input = probe(session.state());
            autopilot(session.state(), &mut input);
            for cue in session.advance(&input, SIM_DT)? {
                log::debug!("Sound: {}", cue.key());
            }
            if session.awaiting_restart() {
                break;
            }
        }
        let state = session.state();
        println!(
            "run {} (seed {}): score {} after {} ticks{}",
            run,
            state.seed,
            state.score,
            state.time_ticks,
            if session.awaiting_restart() { ", died" } else { "" }
        );
    }
    println!("best score: {}", session.best_score().max(session.state().score));
    if let Some(path) = &args.settings {
        session.settings.save(path);
    }

    if args.dump_frame {
        println!("{}", Frame::capture(session.state()).to_json()?);
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Laser Runner (headless) starting...");

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
