//! Data-driven game balance
//!
//! Every gameplay number that a level designer might want to tweak lives in
//! [`RunConfig`]. Configs are plain JSON; missing fields fall back to the
//! shipped defaults so an override file only needs the values it changes.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse run config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid run config: {0}")]
    Invalid(String),
}

/// Constants governing a single run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    // === Difficulty ramp ===
    /// Player speed at run start (px/s)
    pub initial_speed: f32,
    /// Player speed cap (px/s)
    pub max_speed: f32,
    /// Speed gained per ramp tick; also the slow-recovery increment
    pub speed_step: f32,
    /// Ramp timer period before time scaling
    pub speed_ramp_interval_ms: f32,
    /// Applied to the ramp's own time scale each fire: `scale *= 1 + decay`
    pub speed_ramp_time_scale_decay: f32,

    // === Spikes ===
    /// Chance that a hazard tile becomes a live spike
    pub spike_probability: f64,
    /// Tile indices that mark hazard spots in the level definition
    pub hazard_tile_ids: Vec<i32>,
    /// Non-colliding tile left behind under a live spike
    pub hazard_backdrop_tile: i32,
    /// Spikes only bite above this nominal speed
    pub spike_min_speed: f32,
    /// Slowed speed is `nominal / divisor`
    pub hazard_slow_divisor: f32,
    /// Recovery timer period
    pub hazard_recover_interval_ms: f32,
    /// Markers further than this behind the player are dropped
    pub hazard_evict_distance_px: f32,

    // === Streaming window ===
    pub segment_width_tiles: u32,
    /// Number of live segments kept around the player
    pub window_depth: usize,
    /// Leading `start` segments that never drop in and never carry spikes
    pub opening_segments: usize,
    /// Lead (px) below which the window is considered too shallow
    pub lead_append_threshold_px: f32,
    /// Segments ending further than this behind the player are evicted
    pub trail_evict_threshold_px: f32,
    /// A segment drops in once its left edge is this close to the player
    pub drop_trigger_distance_px: f32,

    // === Player ===
    pub player_start: Vec2,
    pub jump_impulse: f32,
    pub jump_hold_ms: f32,
    pub jump_boost: f32,
    pub dash_velocity: f32,
    pub gravity: f32,
    /// Falling below this y is fatal
    pub death_y: f32,

    // === Laser ===
    pub laser_start_x: f32,
    pub laser_initial_speed: f32,
    /// Laser speed stays at least this far below the player's
    pub laser_speed_gap: f32,
    pub laser_close_px: f32,
    pub laser_close_y: f32,
    pub laser_in_frame_px: f32,

    // === Level loading ===
    /// Accepted names for the successor list property, in priority order
    pub successor_properties: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            initial_speed: 80.0,
            max_speed: 220.0,
            speed_step: 2.0,
            speed_ramp_interval_ms: 1000.0,
            speed_ramp_time_scale_decay: -0.01,

            spike_probability: 0.35,
            hazard_tile_ids: vec![319],
            hazard_backdrop_tile: 0,
            spike_min_speed: 20.0,
            hazard_slow_divisor: 1.75,
            hazard_recover_interval_ms: 200.0,
            hazard_evict_distance_px: 240.0,

            segment_width_tiles: 5,
            window_depth: 12,
            opening_segments: 6,
            lead_append_threshold_px: 320.0,
            trail_evict_threshold_px: 480.0,
            drop_trigger_distance_px: 200.0,

            player_start: Vec2::new(8.0, 8.0),
            jump_impulse: -125.0,
            jump_hold_ms: 250.0,
            jump_boost: 30.0,
            dash_velocity: 500.0,
            gravity: 600.0,
            death_y: 280.0,

            laser_start_x: -200.0,
            laser_initial_speed: 50.0,
            laser_speed_gap: 10.0,
            laser_close_px: 60.0,
            laser_close_y: 225.0,
            laser_in_frame_px: 240.0,

            successor_properties: vec!["next".to_string(), "connections".to_string()],
        }
    }
}

impl RunConfig {
    /// Parse a (possibly partial) JSON override and validate it
    pub fn from_json_str(json: &str) -> Result<Self, TuningError> {
        let config: RunConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let invalid = |msg: &str| Err(TuningError::Invalid(msg.to_string()));

        if self.speed_ramp_interval_ms <= 0.0 || self.hazard_recover_interval_ms <= 0.0 {
            return invalid("timer intervals must be positive");
        }
        if self.initial_speed > self.max_speed {
            return invalid("initial_speed exceeds max_speed");
        }
        if self.speed_step <= 0.0 {
            return invalid("speed_step must be positive");
        }
        if self.hazard_slow_divisor < 1.0 {
            return invalid("hazard_slow_divisor must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.spike_probability) {
            return invalid("spike_probability must lie in [0, 1]");
        }
        if self.hazard_tile_ids.is_empty() {
            return invalid("hazard_tile_ids must not be empty");
        }
        if self.segment_width_tiles == 0 {
            return invalid("segment_width_tiles must be positive");
        }
        if self.window_depth <= self.opening_segments {
            return invalid("window_depth must exceed opening_segments");
        }
        if self.successor_properties.is_empty() {
            return invalid("successor_properties must name at least one property");
        }
        if 1.0 + self.speed_ramp_time_scale_decay <= 0.0 {
            return invalid("speed_ramp_time_scale_decay would stall the ramp");
        }
        Ok(())
    }

    /// Width of one segment in pixels
    pub fn segment_width_px(&self) -> f32 {
        self.segment_width_tiles as f32 * crate::consts::TILE_WIDTH
    }

    /// Lowest hazard id; indices in `1..solid_limit` collide
    pub fn solid_limit(&self) -> i32 {
        self.hazard_tile_ids.iter().copied().min().unwrap_or(i32::MAX)
    }

    /// Whether a tile index is solid for the physics host
    pub fn is_solid_tile(&self, index: i32) -> bool {
        index >= 1 && index < self.solid_limit()
    }

    pub fn is_hazard_tile(&self, index: i32) -> bool {
        self.hazard_tile_ids.contains(&index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = RunConfig::from_json_str(r#"{ "initial_speed": 100, "hazard_tile_ids": [300, 301] }"#)
            .unwrap();
        assert_eq!(config.initial_speed, 100.0);
        assert_eq!(config.hazard_tile_ids, vec![300, 301]);
        assert_eq!(config.window_depth, 12);
        assert_eq!(config.solid_limit(), 300);
    }

    #[test]
    fn test_rejects_bad_probability() {
        let err = RunConfig::from_json_str(r#"{ "spike_probability": 1.5 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));
    }

    #[test]
    fn test_rejects_garbage() {
        let err = RunConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }

    #[test]
    fn test_solid_range() {
        let config = RunConfig::default();
        assert!(!config.is_solid_tile(-1));
        assert!(!config.is_solid_tile(0));
        assert!(config.is_solid_tile(1));
        assert!(config.is_solid_tile(318));
        assert!(!config.is_solid_tile(319));
        assert!(config.is_hazard_tile(319));
    }
}
