//! Game state and core simulation types
//!
//! Everything a run needs lives here as plain values; the host reads it back
//! each frame through [`crate::frame::Frame`].

use std::sync::Arc;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::library::{LevelError, SegmentLibrary};
use super::player::{AnimationState, PlayerState};
use super::ramp::{DifficultyRamp, Laser};
use super::sequencer::SequenceError;
use super::window::{DropCue, SegmentId, StreamingWindow};
use crate::tuning::{RunConfig, TuningError};

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Player died; waiting for the scene to restart
    GameOver,
}

/// Why a run could not be started
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] TuningError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// Things that happened during a tick, for the host to react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    SegmentAppended { segment: SegmentId, key: String },
    SegmentEvicted { segment: SegmentId },
    /// A segment started dropping in; the host tweens it and shakes the camera on landing
    SegmentDropping(DropCue),
    Jumped,
    Dashed,
    SpikeTriggered { segment: SegmentId, col: usize, row: usize },
    SlowRecovered,
    SpeedUp { nominal_speed: f32, laser_speed: f32 },
    Paused,
    Resumed,
    /// Fired exactly once per run
    Died { score: u64 },
    /// Follows `Died`: the scene should throw this run away
    RestartRequested,
}

/// Complete state of one run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub(crate) library: Arc<SegmentLibrary>,
    pub config: RunConfig,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub player: PlayerState,
    pub laser: Laser,
    pub ramp: DifficultyRamp,
    pub window: StreamingWindow,
    pub score: u64,
    /// Events produced by the last tick
    pub events: Vec<GameEvent>,
    pub(crate) pause_held: bool,
}

impl GameState {
    /// Start a fresh run; the opening segments are streamed in immediately
    ///
    /// The config is validated and every template must match its segment
    /// width before anything is streamed.
    pub fn new(
        library: Arc<SegmentLibrary>,
        config: RunConfig,
        seed: u64,
    ) -> Result<Self, RunError> {
        config.validate()?;
        library.check_width(config.segment_width_tiles as usize)?;

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            player: PlayerState::new(config.player_start, config.initial_speed),
            laser: Laser::new(&config),
            ramp: DifficultyRamp::new(&config),
            window: StreamingWindow::new(),
            library,
            config,
            phase: GamePhase::Playing,
            time_ticks: 0,
            score: 0,
            events: Vec::new(),
            pause_held: false,
        };

        let appended = state.window.fill(
            &state.library,
            &state.config,
            &mut state.rng,
            state.player.position.x,
        )?;
        log::info!(
            "Run started (seed {}, {} segments streamed)",
            seed,
            appended.len()
        );
        Ok(state)
    }

    pub fn library(&self) -> &SegmentLibrary {
        &self.library
    }

    /// Camera width used for eviction
    pub fn camera_width(&self) -> f32 {
        self.config.trail_evict_threshold_px
    }

    /// Whether the fixed opening run is still being streamed
    pub fn is_opening_phase(&self) -> bool {
        self.window.appended() < self.config.opening_segments
    }

    pub fn animation_state(&self) -> AnimationState {
        self.player.animation_state(self.laser.x, &self.config)
    }

    pub fn died(&self) -> bool {
        self.events.iter().any(|e| matches!(e, GameEvent::Died { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::library::SegmentTemplate;

    fn library(width: usize) -> Arc<SegmentLibrary> {
        Arc::new(
            SegmentLibrary::from_templates([SegmentTemplate::new(
                "start",
                vec![vec![2; width]; 17],
                vec!["start".to_string()],
            )])
            .unwrap(),
        )
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = RunConfig {
            spike_probability: 1.5,
            ..RunConfig::default()
        };
        let err = GameState::new(library(5), config, 1).unwrap_err();
        assert!(matches!(err, RunError::Config(TuningError::Invalid(_))));
    }

    #[test]
    fn test_rejects_mismatched_segment_width() {
        let err = GameState::new(library(4), RunConfig::default(), 1).unwrap_err();
        assert!(matches!(err, RunError::Level(LevelError::SegmentWidth { actual: 4, .. })));

        let config = RunConfig {
            segment_width_tiles: 4,
            ..RunConfig::default()
        };
        let state = GameState::new(library(4), config, 1).unwrap();
        assert_eq!(state.window.next_segment_position(), 12.0 * 64.0);
    }
}

