//! Difficulty ramp and the pursuing laser
//!
//! Every ramp fire makes the player faster and lets the laser close in a
//! little more. The ramp also slows its own clock each fire, so speed-ups
//! come further apart as the run goes on.

use serde::{Deserialize, Serialize};

use super::timer::RepeatingTimer;
use crate::tuning::RunConfig;

/// The hazard chasing the player from the left
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Laser {
    pub x: f32,
    pub speed: f32,
}

impl Laser {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            x: config.laser_start_x,
            speed: config.laser_initial_speed,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.x += self.speed * dt;
    }
}

/// Outcome of advancing the ramp for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RampStep {
    pub fires: u32,
    pub nominal_speed: f32,
    pub laser_speed: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyRamp {
    timer: RepeatingTimer,
}

impl DifficultyRamp {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            timer: RepeatingTimer::new(config.speed_ramp_interval_ms),
        }
    }

    /// The ramp's own time scale (starts at 1, drifts down)
    pub fn time_scale(&self) -> f32 {
        self.timer.time_scale
    }

    /// Time scale applied to entrance tweens
    pub fn tween_time_scale(&self) -> f32 {
        1.0 + (1.0 - self.timer.time_scale)
    }

    /// Advance the ramp clock and apply every fire to the speeds
    pub fn advance(
        &mut self,
        dt_ms: f32,
        nominal_speed: &mut f32,
        laser: &mut Laser,
        config: &RunConfig,
    ) -> RampStep {
        let fires = self.timer.advance(dt_ms);
        for _ in 0..fires {
            self.fire(nominal_speed, laser, config);
        }
        RampStep {
            fires,
            nominal_speed: *nominal_speed,
            laser_speed: laser.speed,
        }
    }

    /// A single ramp fire
    pub fn fire(&mut self, nominal_speed: &mut f32, laser: &mut Laser, config: &RunConfig) {
        if *nominal_speed < config.max_speed {
            *nominal_speed = (*nominal_speed + config.speed_step).min(config.max_speed);
            self.timer.time_scale *= 1.0 + config.speed_ramp_time_scale_decay;
        }

        let laser_cap = *nominal_speed - config.laser_speed_gap;
        if laser.speed < laser_cap {
            laser.speed = (laser.speed + 2.0 * config.speed_step).min(laser_cap);
        }

        log::debug!(
            "Ramp: player {:.1}, laser {:.1}, time scale {:.3}",
            nominal_speed,
            laser.speed,
            self.timer.time_scale
        );
    }
}
