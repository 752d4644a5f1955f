//! Laser Runner - An endless tile-segment runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (segment streaming, player, laser, ramp)
//! - `tuning`: Data-driven game balance
//! - `frame`: Per-frame snapshot handed to the rendering/physics host
//! - `session`: Scene layer (restart, best score, sound cues)
//! - `settings`: Player preferences (mute flags, high score)

pub mod audio;
pub mod frame;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use session::RunSession;
pub use settings::Settings;
pub use tuning::RunConfig;

/// Game configuration constants
pub mod consts {
    /// Tile dimensions in pixels
    pub const TILE_WIDTH: f32 = 16.0;
    pub const TILE_HEIGHT: f32 = 16.0;

    /// Tile index for "no tile" (no collision, nothing drawn)
    pub const EMPTY_TILE: i32 = -1;
    /// Tiled stores flip/rotate flags in the top three gid bits
    pub const TILED_GID_MASK: u32 = 0x1FFF_FFFF;

    /// Vertical offset a segment spawns at before dropping into place
    pub const ENTRANCE_OFFSET_Y: f32 = -280.0;
    /// Drop-in tween duration (ms, before time scaling)
    pub const DROP_TWEEN_MS: f32 = 500.0;
    /// Gradient hint fade, started alongside the drop
    pub const GRADIENT_FADE_MS: f32 = 600.0;
    pub const GRADIENT_FADE_DELAY_MS: f32 = 400.0;

    /// Player sprite half extent (sprite is 16x16, origin centered)
    pub const PLAYER_HALF_SIZE: f32 = 8.0;

    /// Score starts counting once the player passes this x
    pub const SCORE_ORIGIN_X: f32 = 480.0;
    /// Pixels per score point
    pub const SCORE_STEP_PX: f32 = 80.0;

    /// Reserved template key for the fixed opening run
    pub const OPENING_KEY: &str = "start";
}
