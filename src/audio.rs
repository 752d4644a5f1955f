//! Sound cues
//!
//! The core never plays audio. The session turns simulation events into
//! named cues; the host maps each cue key onto whatever sample it loaded.

use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    /// A segment landed after its drop-in
    Platform,
    /// Player left the ground
    Jump,
    /// Player dashed toward the floor
    Dash,
    /// Player ran into a spike
    Spikes,
    /// Run ended
    Death,
}

impl SoundCue {
    /// Asset key the host loads the sample under
    pub fn key(&self) -> &'static str {
        match self {
            SoundCue::Platform => "platform",
            SoundCue::Jump => "jump",
            SoundCue::Dash => "dash",
            SoundCue::Spikes => "spikes",
            SoundCue::Death => "death",
        }
    }

    /// Cue for a simulation event, if it makes a sound
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::SegmentDropping(_) => Some(SoundCue::Platform),
            GameEvent::Jumped => Some(SoundCue::Jump),
            GameEvent::Dashed => Some(SoundCue::Dash),
            GameEvent::SpikeTriggered { .. } => Some(SoundCue::Spikes),
            GameEvent::Died { .. } => Some(SoundCue::Death),
            _ => None,
        }
    }
}

/// Cues to play for one tick's events (empty when effects are muted)
pub fn cues_for(events: &[GameEvent], settings: &Settings) -> Vec<SoundCue> {
    if settings.mute_sfx {
        return Vec::new();
    }
    events.iter().filter_map(SoundCue::for_event).collect()
}
