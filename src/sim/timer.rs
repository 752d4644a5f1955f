//! Tick-driven repeating timers
//!
//! Timers never run on their own: the owning system advances them with the
//! frame delta and acts on the number of fires returned, so everything stays
//! ordered inside a single tick.

use serde::{Deserialize, Serialize};

/// A repeating timer with its own time scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatingTimer {
    pub interval_ms: f32,
    pub elapsed_ms: f32,
    /// Multiplier on elapsed time; below 1 slows the cadence
    pub time_scale: f32,
}

impl RepeatingTimer {
    pub fn new(interval_ms: f32) -> Self {
        Self {
            interval_ms,
            elapsed_ms: 0.0,
            time_scale: 1.0,
        }
    }

    /// Advance by `dt_ms` of wall time, returning how many times it fired
    pub fn advance(&mut self, dt_ms: f32) -> u32 {
        if self.interval_ms <= 0.0 {
            return 0;
        }
        self.elapsed_ms += dt_ms * self.time_scale;
        let mut fires = 0;
        while self.elapsed_ms >= self.interval_ms {
            self.elapsed_ms -= self.interval_ms;
            fires += 1;
        }
        fires
    }
}

/// A one-shot window that closes after a fixed duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    pub remaining_ms: f32,
}

impl Countdown {
    pub fn new(duration_ms: f32) -> Self {
        Self {
            remaining_ms: duration_ms,
        }
    }

    pub fn advance(&mut self, dt_ms: f32) {
        self.remaining_ms = (self.remaining_ms - dt_ms).max(0.0);
    }

    pub fn is_open(&self) -> bool {
        self.remaining_ms > 0.0
    }
}
