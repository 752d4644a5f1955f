//! Per-frame snapshot for the rendering/physics host
//!
//! A `Frame` is everything needed to draw the run and build its colliders,
//! copied out of the simulation so the host never touches `GameState`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{GRADIENT_FADE_DELAY_MS, GRADIENT_FADE_MS};
use crate::sim::{
    AnimationState, GameEvent, GamePhase, GameState, PlayerMode, SegmentId, TileBounds,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardView {
    pub col: usize,
    pub row: usize,
    pub bounds: TileBounds,
    pub triggered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentView {
    pub id: SegmentId,
    pub key: String,
    pub x: f32,
    pub y: f32,
    pub tiles: Vec<Vec<i32>>,
    pub hazards: Vec<HazardView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientView {
    pub x: f32,
    pub width: f32,
    pub tint: u32,
    /// Fade timing once the segment starts dropping
    pub fade: Option<(f32, f32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub position: Vec2,
    pub velocity: Vec2,
    pub mode: PlayerMode,
    pub animation: AnimationState,
}

/// Snapshot of one simulation frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub tick: u64,
    pub phase: GamePhase,
    pub score: u64,
    pub player: PlayerView,
    pub laser_x: f32,
    pub laser_speed: f32,
    /// Difficulty ramp clock scale
    pub time_scale: f32,
    /// Scale for drop-in tweens started this frame
    pub tween_time_scale: f32,
    pub segments: Vec<SegmentView>,
    pub gradients: Vec<GradientView>,
    pub events: Vec<GameEvent>,
}

impl Frame {
    pub fn capture(state: &GameState) -> Self {
        let segments = state
            .window
            .segments()
            .map(|segment| SegmentView {
                id: segment.id,
                key: segment.source_key.clone(),
                x: segment.world_x,
                y: segment.y,
                tiles: segment.tiles.clone(),
                hazards: segment
                    .hazards
                    .iter()
                    .map(|marker| HazardView {
                        col: marker.col,
                        row: marker.row,
                        bounds: marker.bounds,
                        triggered: marker.triggered(),
                    })
                    .collect(),
            })
            .collect();

        let gradients = state
            .window
            .gradients()
            .iter()
            .map(|gradient| GradientView {
                x: gradient.x,
                width: gradient.width,
                tint: gradient.tint,
                fade: gradient
                    .fading
                    .then_some((GRADIENT_FADE_MS, GRADIENT_FADE_DELAY_MS)),
            })
            .collect();

        Self {
            tick: state.time_ticks,
            phase: state.phase,
            score: state.score,
            player: PlayerView {
                position: state.player.position,
                velocity: state.player.velocity,
                mode: state.player.mode,
                animation: state.animation_state(),
            },
            laser_x: state.laser.x,
            laser_speed: state.laser.speed,
            time_scale: state.ramp.time_scale(),
            tween_time_scale: state.ramp.tween_time_scale(),
            segments,
            gradients,
            events: state.events.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
