//! Player controller
//!
//! The player always runs right at the current speed. Up jumps (holding it
//! extends the jump with diminishing returns), down dashes toward the floor.
//! The physics host owns collision and reports back which sides of the body
//! are blocked; the controller turns that plus input into velocity.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::timer::{Countdown, RepeatingTimer};
use crate::tuning::RunConfig;

/// Player state machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerMode {
    Running,
    Jumping,
    Falling,
    Dashing,
    Dead,
}

/// Which sprite animation the renderer should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationState {
    /// Laser right behind the player (or player about to fall out)
    LaserClose,
    /// Laser visible on screen
    LaserInFrame,
    Falling,
    Jumping,
    Running,
}

/// Held inputs and contact flags for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlInput {
    pub up: bool,
    pub down: bool,
    pub blocked_up: bool,
    pub blocked_down: bool,
}

/// What the controller did this tick (for sound cues)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlOutcome {
    pub jumped: bool,
    pub dashed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub mode: PlayerMode,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Speed set by the difficulty ramp
    pub nominal_speed: f32,
    /// Reduced speed while a spike slow is active or recovering
    pub slowed_speed: Option<f32>,
    jumping: bool,
    jump_window: Option<Countdown>,
    recovery: Option<RepeatingTimer>,
    death_reported: bool,
}

impl PlayerState {
    pub fn new(position: Vec2, speed: f32) -> Self {
        Self {
            mode: PlayerMode::Running,
            position,
            velocity: Vec2::new(speed, 0.0),
            nominal_speed: speed,
            slowed_speed: None,
            jumping: false,
            jump_window: None,
            recovery: None,
            death_reported: false,
        }
    }

    /// Speed actually applied along x
    pub fn horizontal_speed(&self) -> f32 {
        self.slowed_speed.unwrap_or(self.nominal_speed)
    }

    pub fn is_dead(&self) -> bool {
        self.mode == PlayerMode::Dead
    }

    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    /// Enter `Dead` if the player fell out or the laser caught up
    ///
    /// Returns true only on the tick the death happens.
    pub fn check_death(&mut self, laser_x: f32, config: &RunConfig) -> bool {
        let fell = self.position.y > config.death_y;
        let caught = self.position.x + crate::consts::PLAYER_HALF_SIZE <= laser_x;
        if !(fell || caught) {
            return false;
        }
        self.mode = PlayerMode::Dead;
        self.jumping = false;
        self.jump_window = None;
        if self.death_reported {
            return false;
        }
        self.death_reported = true;
        log::info!(
            "Player died at ({:.1}, {:.1}) - {}",
            self.position.x,
            self.position.y,
            if fell { "fell" } else { "caught by laser" }
        );
        true
    }

    /// Dash and jump handling; `dt_ms` closes the jump window
    pub fn apply_controls(
        &mut self,
        input: &ControlInput,
        dt_ms: f32,
        config: &RunConfig,
    ) -> ControlOutcome {
        let mut outcome = ControlOutcome::default();
        if self.is_dead() {
            return outcome;
        }

        if let Some(window) = self.jump_window.as_mut() {
            window.advance(dt_ms);
        }

        // Dash
        if self.mode == PlayerMode::Dashing && input.blocked_down {
            self.mode = PlayerMode::Running;
        }
        if input.down && !input.blocked_down && self.mode != PlayerMode::Dashing {
            self.velocity.y = config.dash_velocity;
            self.mode = PlayerMode::Dashing;
            self.end_jump();
            outcome.dashed = true;
            return outcome;
        }

        // Jump
        if input.up && !input.blocked_up {
            let rising = self.jump_window.as_ref().is_some_and(Countdown::is_open);
            if input.blocked_down {
                self.velocity.y = config.jump_impulse;
                self.jumping = true;
                self.jump_window = Some(Countdown::new(config.jump_hold_ms));
                outcome.jumped = true;
            } else if self.jumping && rising {
                let vy = self.velocity.y;
                self.velocity.y = vy - config.jump_boost * (200.0 + vy) / 200.0;
            } else {
                self.end_jump();
            }
        } else {
            self.end_jump();
        }

        outcome
    }

    fn end_jump(&mut self) {
        self.jumping = false;
        self.jump_window = None;
    }

    /// Apply horizontal speed and gravity, then move
    pub fn integrate(&mut self, dt: f32, blocked_down: bool, config: &RunConfig) {
        if self.is_dead() {
            return;
        }
        self.velocity.x = self.horizontal_speed();
        if blocked_down {
            if self.velocity.y > 0.0 {
                self.velocity.y = 0.0;
            }
        } else {
            self.velocity.y += config.gravity * dt;
        }
        self.position += self.velocity * dt;
        self.refresh_mode();
    }

    fn refresh_mode(&mut self) {
        if matches!(self.mode, PlayerMode::Dead | PlayerMode::Dashing) {
            return;
        }
        self.mode = if self.jumping || self.velocity.y < 0.0 {
            PlayerMode::Jumping
        } else if self.velocity.y > 0.0 {
            PlayerMode::Falling
        } else {
            PlayerMode::Running
        };
    }

    /// Start (or restart) a spike slow
    pub fn begin_slow(&mut self, config: &RunConfig) {
        let slowed = self.nominal_speed / config.hazard_slow_divisor;
        if self.slowed_speed.is_some() {
            log::debug!("Spike slow restarted at {:.2}", slowed);
        } else {
            log::debug!("Spike slow started at {:.2}", slowed);
        }
        self.slowed_speed = Some(slowed);
        self.recovery = Some(RepeatingTimer::new(config.hazard_recover_interval_ms));
    }

    /// Step the slow recovery timer; returns true when the slow ends
    pub fn advance_recovery(&mut self, dt_ms: f32, config: &RunConfig) -> bool {
        let Some(timer) = self.recovery.as_mut() else {
            return false;
        };
        for _ in 0..timer.advance(dt_ms) {
            if self.recover_step(config.speed_step) {
                return true;
            }
        }
        false
    }

    /// One recovery fire; clears the slow once it has caught up
    fn recover_step(&mut self, step: f32) -> bool {
        match self.slowed_speed {
            Some(slowed) if slowed >= self.nominal_speed => {
                self.slowed_speed = None;
                self.recovery = None;
                true
            }
            Some(slowed) => {
                self.slowed_speed = Some((slowed + step).min(self.nominal_speed));
                false
            }
            None => {
                self.recovery = None;
                false
            }
        }
    }

    /// Pick the animation for the renderer
    pub fn animation_state(&self, laser_x: f32, config: &RunConfig) -> AnimationState {
        let gap = self.position.x - laser_x;
        if gap < config.laser_close_px || self.position.y > config.laser_close_y {
            AnimationState::LaserClose
        } else if gap < config.laser_in_frame_px {
            AnimationState::LaserInFrame
        } else if self.velocity.y > 0.0 {
            AnimationState::Falling
        } else if self.velocity.y < 0.0 {
            AnimationState::Jumping
        } else {
            AnimationState::Running
        }
    }
}
