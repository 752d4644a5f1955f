//! Player preferences and the high score
//!
//! Persisted separately from the run as a small JSON file. The simulation
//! never reads these.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Player preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Silence the background track
    pub mute_music: bool,
    /// Silence sound effects
    pub mute_sfx: bool,
    /// Best score ever recorded
    pub highscore: Option<u64>,
}

impl Settings {
    pub fn toggle_music(&mut self) -> bool {
        self.mute_music = !self.mute_music;
        self.mute_music
    }

    pub fn toggle_sfx(&mut self) -> bool {
        self.mute_sfx = !self.mute_sfx;
        self.mute_sfx
    }

    pub fn music_enabled(&self) -> bool {
        !self.mute_music
    }

    /// Keep `score` if it beats the high score; returns true on a new best
    pub fn record_score(&mut self, score: u64) -> bool {
        if self.highscore.is_some_and(|best| best >= score) {
            return false;
        }
        self.highscore = Some(score);
        true
    }

    /// Load settings, falling back to defaults when missing or unreadable
    pub fn load(path: &Path) -> Self {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(_) => {
                log::info!("Using default settings");
                return Self::default();
            }
        };
        match serde_json::from_str(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring unreadable settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings; failures are logged, never fatal
    pub fn save(&self, path: &Path) {
        let json = match serde_json::to_string_pretty(self) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to encode settings: {}", e);
                return;
            }
        };
        match fs::write(path, json) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings to {}: {}", path.display(), e),
        }
    }
}
