//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (window order, oldest segment first)
//! - No rendering, audio or platform dependencies

pub mod hazard;
pub mod library;
pub mod player;
pub mod ramp;
pub mod score;
pub mod sequencer;
pub mod state;
pub mod tick;
pub mod timer;
pub mod window;

pub use hazard::{HazardMarker, TileBounds};
pub use library::{LevelError, SegmentLibrary, SegmentTemplate};
pub use player::{AnimationState, ControlInput, PlayerMode, PlayerState};
pub use ramp::{DifficultyRamp, Laser};
pub use score::score_for;
pub use sequencer::{SequenceError, next_key};
pub use state::{GameEvent, GamePhase, GameState, RunError};
pub use tick::{TickInput, tick};
pub use timer::{Countdown, RepeatingTimer};
pub use window::{DropCue, GradientMarker, SegmentId, SegmentInstance, StreamingWindow};
