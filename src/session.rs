//! Run session (scene layer)
//!
//! Owns what outlives a single run: the loaded library, tuning and settings
//! (which carry the high score). Restarting throws the run away and builds a
//! new one with the next seed, either on the restart input or, with
//! auto-restart on, as soon as the core asks for it.

use std::sync::Arc;

use crate::audio::{self, SoundCue};
use crate::settings::Settings;
use crate::sim::{GameEvent, GamePhase, GameState, RunError, SegmentLibrary, TickInput, tick};
use crate::tuning::RunConfig;

pub struct RunSession {
    library: Arc<SegmentLibrary>,
    config: RunConfig,
    pub settings: Settings,
    state: GameState,
    base_seed: u64,
    runs: u64,
    restart_held: bool,
    auto_restart: bool,
}

impl RunSession {
    pub fn new(
        library: SegmentLibrary,
        config: RunConfig,
        settings: Settings,
        seed: u64,
    ) -> Result<Self, RunError> {
        let library = Arc::new(library);
        let state = GameState::new(Arc::clone(&library), config.clone(), seed)?;
        Ok(Self {
            library,
            config,
            settings,
            state,
            base_seed: seed,
            runs: 1,
            restart_held: false,
            auto_restart: false,
        })
    }

    /// Restart on the tick after a death instead of waiting for input
    pub fn set_auto_restart(&mut self, enabled: bool) {
        self.auto_restart = enabled;
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Mutable access for hosts that correct state directly (tests, tools)
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Best recorded score, including earlier sessions
    pub fn best_score(&self) -> u64 {
        self.settings.highscore.unwrap_or(0)
    }

    /// Number of runs started, including the current one
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// A dead run is waiting for the player to restart
    pub fn awaiting_restart(&self) -> bool {
        self.state.phase == GamePhase::GameOver
    }

    /// Throw the current run away and start the next one
    pub fn restart(&mut self) -> Result<(), RunError> {
        let seed = self.base_seed.wrapping_add(self.runs);
        self.state = GameState::new(Arc::clone(&self.library), self.config.clone(), seed)?;
        self.runs += 1;
        log::info!("Restarted (run {}, seed {})", self.runs, seed);
        Ok(())
    }

    /// Tick the current run and return the sounds it produced
    pub fn advance(&mut self, input: &TickInput, dt: f32) -> Result<Vec<SoundCue>, RunError> {
        let restart_pressed = input.restart && !self.restart_held;
        self.restart_held = input.restart;
        let restart_requested = self.auto_restart
            && self.state.events.contains(&GameEvent::RestartRequested);
        if restart_pressed || restart_requested {
            self.restart()?;
            return Ok(Vec::new());
        }

        tick(&mut self.state, input, dt)?;

        if let Some(score) = self.state.events.iter().find_map(|e| match e {
            GameEvent::Died { score } => Some(*score),
            _ => None,
        }) {
            if self.settings.record_score(score) {
                log::info!("New best score: {}", score);
            }
        }

        Ok(audio::cues_for(&self.state.events, &self.settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SegmentTemplate;
    use glam::Vec2;

    fn library() -> SegmentLibrary {
        let mut tiles = vec![vec![-1; 5]; 17];
        tiles[15] = vec![2; 5];
        tiles[16] = vec![2; 5];
        SegmentLibrary::from_templates([
            SegmentTemplate::new("start", tiles.clone(), vec!["a".to_string()]),
            SegmentTemplate::new("a", tiles, vec!["a".to_string(), "start".to_string()]),
        ])
        .unwrap()
    }

    fn session() -> RunSession {
        RunSession::new(library(), RunConfig::default(), Settings::default(), 10).unwrap()
    }

    fn kill(session: &mut RunSession, x: f32) -> Vec<SoundCue> {
        session.state_mut().player.position = Vec2::new(x, 281.0);
        session.advance(&TickInput::default(), 1.0 / 60.0).unwrap()
    }

    #[test]
    fn test_death_records_best_and_waits() {
        let mut session = session();
        let cues = kill(&mut session, 720.0);
        // Drop-ins scheduled on the same tick come first
        assert_eq!(cues.last(), Some(&SoundCue::Death));
        assert!(session.awaiting_restart());
        assert_eq!(session.best_score(), 3);

        // Nothing happens until restart
        let cues = session.advance(&TickInput::default(), 1.0 / 60.0).unwrap();
        assert!(cues.is_empty());
        assert!(session.awaiting_restart());
    }

    #[test]
    fn test_restart_starts_fresh_run_with_next_seed() {
        let mut session = session();
        kill(&mut session, 720.0);

        let restart = TickInput {
            restart: true,
            ..Default::default()
        };
        session.advance(&restart, 1.0 / 60.0).unwrap();
        assert_eq!(session.runs(), 2);
        assert_eq!(session.state().seed, 11);
        assert_eq!(session.state().phase, GamePhase::Playing);
        assert_eq!(session.state().score, 0);

        // Holding restart does not loop
        session.advance(&restart, 1.0 / 60.0).unwrap();
        assert_eq!(session.runs(), 2);
    }

    #[test]
    fn test_best_score_keeps_maximum() {
        let mut session = session();
        kill(&mut session, 720.0);
        session.restart().unwrap();
        kill(&mut session, 500.0);
        assert_eq!(session.best_score(), 3);
    }

    #[test]
    fn test_best_score_starts_from_settings() {
        let settings = Settings {
            highscore: Some(9),
            ..Settings::default()
        };
        let mut session = RunSession::new(library(), RunConfig::default(), settings, 10).unwrap();
        assert_eq!(session.best_score(), 9);
        kill(&mut session, 720.0);
        assert_eq!(session.best_score(), 9);
    }

    #[test]
    fn test_auto_restart_follows_death() {
        let mut session = session();
        session.set_auto_restart(true);
        kill(&mut session, 720.0);
        // The death frame is still visible to the host
        assert!(session.awaiting_restart());
        assert!(session.state().events.contains(&GameEvent::RestartRequested));

        session.advance(&TickInput::default(), 1.0 / 60.0).unwrap();
        assert_eq!(session.runs(), 2);
        assert_eq!(session.state().phase, GamePhase::Playing);
        assert_eq!(session.best_score(), 3);
    }

    #[test]
    fn test_muted_session_is_silent() {
        let mut session = session();
        session.settings.toggle_sfx();
        assert!(kill(&mut session, 720.0).is_empty());
    }
}
