//! Per-frame simulation tick
//!
//! Stages run in a fixed order and later stages read what earlier ones wrote:
//! window eviction, window append, drop scheduling, player kinematics,
//! spike triggers and eviction, score.

use glam::Vec2;

use super::hazard;
use super::player::ControlInput;
use super::score::score_for;
use super::sequencer::SequenceError;
use super::state::{GameEvent, GamePhase, GameState};

/// Input for a single tick: held keys plus what the physics host resolved
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    /// Pause key held (toggles on press)
    pub pause: bool,
    /// Restart key held (handled by the session)
    pub restart: bool,
    /// Body is touching something above
    pub blocked_up: bool,
    /// Body is standing on something
    pub blocked_down: bool,
    /// Position after the host's collision pass, if it corrected ours
    pub resolved_position: Option<Vec2>,
}

impl TickInput {
    fn controls(&self) -> ControlInput {
        ControlInput {
            up: self.up,
            down: self.down,
            blocked_up: self.blocked_up,
            blocked_down: self.blocked_down,
        }
    }
}

/// Advance the run by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> Result<(), SequenceError> {
    state.events.clear();

    // Handle pause toggle (on press, not while held)
    let pause_pressed = input.pause && !state.pause_held;
    state.pause_held = input.pause;
    if pause_pressed {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                state.events.push(GameEvent::Paused);
                return Ok(());
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                state.events.push(GameEvent::Resumed);
            }
            GamePhase::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    match state.phase {
        GamePhase::Paused | GamePhase::GameOver => return Ok(()),
        GamePhase::Playing => {}
    }

    state.time_ticks += 1;
    let dt_ms = dt * 1000.0;

    if let Some(position) = input.resolved_position {
        state.player.position = position;
    }
    let player_x = state.player.position.x;

    // 1 + 2: stream segments
    let camera_width = state.camera_width();
    let (evicted, appended) = state.window.tick(
        &state.library,
        &state.config,
        &mut state.rng,
        player_x,
        camera_width,
    )?;
    state
        .events
        .extend(evicted.into_iter().map(|segment| GameEvent::SegmentEvicted { segment }));
    for segment in appended {
        let key = state
            .window
            .segments()
            .find(|s| s.id == segment)
            .map(|s| s.source_key.clone())
            .unwrap_or_default();
        state.events.push(GameEvent::SegmentAppended { segment, key });
    }

    // 3: drop-ins
    let drops = state
        .window
        .schedule_drops(player_x, state.ramp.tween_time_scale(), &state.config);
    state.events.extend(drops.into_iter().map(GameEvent::SegmentDropping));

    // 4: timers, then the player
    let step = state.ramp.advance(
        dt_ms,
        &mut state.player.nominal_speed,
        &mut state.laser,
        &state.config,
    );
    if step.fires > 0 {
        state.events.push(GameEvent::SpeedUp {
            nominal_speed: step.nominal_speed,
            laser_speed: step.laser_speed,
        });
    }
    if state.player.advance_recovery(dt_ms, &state.config) {
        state.events.push(GameEvent::SlowRecovered);
    }

    if state.player.check_death(state.laser.x, &state.config) {
        state.phase = GamePhase::GameOver;
        state.score = score_for(state.player.position.x);
        state.events.push(GameEvent::Died { score: state.score });
        state.events.push(GameEvent::RestartRequested);
        return Ok(());
    }

    let outcome = state
        .player
        .apply_controls(&input.controls(), dt_ms, &state.config);
    if outcome.jumped {
        state.events.push(GameEvent::Jumped);
    }
    if outcome.dashed {
        state.events.push(GameEvent::Dashed);
    }
    state.player.integrate(dt, input.blocked_down, &state.config);
    state.laser.advance(dt);

    // 5: spikes
    let mut spiked = false;
    for segment in state.window.segments_mut() {
        let hits = hazard::check_trigger(
            segment.hazards.iter_mut(),
            &state.player,
            state.config.spike_min_speed,
        );
        for marker in hits {
            log::debug!(
                "Spike triggered in segment {} at ({}, {})",
                segment.id.0,
                marker.col,
                marker.row
            );
            state.events.push(GameEvent::SpikeTriggered {
                segment: segment.id,
                col: marker.col,
                row: marker.row,
            });
            spiked = true;
        }
        hazard::evict(
            &mut segment.hazards,
            state.player.position.x,
            state.config.hazard_evict_distance_px,
        );
    }
    if spiked {
        state.player.begin_slow(&state.config);
    }

    // 6: score
    state.score = score_for(state.player.position.x);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::library::{SegmentLibrary, SegmentTemplate};
    use crate::sim::player::{AnimationState, PlayerMode};
    use crate::tuning::RunConfig;
    use std::sync::Arc;

    const DT: f32 = 1.0 / 60.0;

    fn grid(spike: bool) -> Vec<Vec<i32>> {
        let mut rows = vec![vec![-1; 5]; 17];
        if spike {
            rows[14] = vec![-1, -1, 319, -1, -1];
        }
        rows[15] = vec![2; 5];
        rows[16] = vec![2; 5];
        rows
    }

    fn library() -> Arc<SegmentLibrary> {
        let next = |keys: &[&str]| keys.iter().map(|k| k.to_string()).collect::<Vec<_>>();
        Arc::new(
            SegmentLibrary::from_templates([
                SegmentTemplate::new("start", grid(true), next(&["flat", "spikes"])),
                SegmentTemplate::new("flat", grid(false), next(&["flat", "spikes"])),
                SegmentTemplate::new("spikes", grid(true), next(&["flat"])),
            ])
            .unwrap(),
        )
    }

    fn state_with(config: RunConfig, seed: u64) -> GameState {
        GameState::new(library(), config, seed).unwrap()
    }

    /// Player standing on the floor (top at y=240)
    fn on_floor() -> TickInput {
        TickInput {
            blocked_down: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_run_streams_opening() {
        let state = state_with(RunConfig::default(), 1);
        assert_eq!(state.window.len(), 12);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(!state.is_opening_phase());
        assert_eq!(state.window.segments().filter(|s| s.opening).count(), 6);
    }

    #[test]
    fn test_run_advances_and_scores() {
        let mut state = state_with(RunConfig::default(), 1);
        state.player.position = Vec2::new(8.0, 232.0);
        state.laser.x = -10_000.0;
        for _ in 0..600 {
            tick(&mut state, &on_floor(), DT).unwrap();
        }
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.player.position.x > 480.0);
        assert!(state.score > 0);
        assert!(state.player.nominal_speed > 80.0);
        assert!(state.window.len() >= 11 && state.window.len() <= 12);
    }

    #[test]
    fn test_fall_out_dies_once() {
        let mut state = state_with(RunConfig::default(), 2);
        state.player.position.y = 281.0;
        tick(&mut state, &TickInput::default(), DT).unwrap();
        assert_eq!(state.player.mode, PlayerMode::Dead);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.died());
        assert_eq!(state.events.last(), Some(&GameEvent::RestartRequested));

        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), DT).unwrap();
            assert!(!state.died());
        }
    }

    #[test]
    fn test_laser_catch_up_kills() {
        let mut state = state_with(RunConfig::default(), 3);
        state.player.position = Vec2::new(100.0, 232.0);
        state.laser.x = 108.0;
        tick(&mut state, &on_floor(), DT).unwrap();
        assert!(state.died());
    }

    #[test]
    fn test_spike_slows_player() {
        // Every segment spiked, no opening run
        let library = Arc::new(
            SegmentLibrary::from_templates([SegmentTemplate::new(
                "start",
                grid(true),
                vec!["start".to_string()],
            )])
            .unwrap(),
        );
        let config = RunConfig {
            spike_probability: 1.0,
            opening_segments: 0,
            ..RunConfig::default()
        };
        let mut state = GameState::new(library, config, 4).unwrap();
        let segment = state.window.segments().next().unwrap();
        assert_eq!(segment.hazards.len(), 1);
        let spike = segment.hazards[0].bounds;
        let segment_id = segment.id;

        state.laser.x = -10_000.0;
        // Feet line on the spike row, x just before its centre
        let position = Vec2::new(spike.left + 7.0, spike.top + 8.0);
        let input = TickInput {
            resolved_position: Some(position),
            blocked_down: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT).unwrap();

        assert!(state.events.contains(&GameEvent::SpikeTriggered {
            segment: segment_id,
            col: 2,
            row: 14,
        }));
        let slowed = state.player.slowed_speed.expect("slowed");
        assert!((slowed - 80.0 / 1.75).abs() < 1e-3);

        // Same spot again: the spike is spent
        tick(&mut state, &input, DT).unwrap();
        assert!(
            !state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::SpikeTriggered { .. }))
        );
    }

    #[test]
    fn test_jump_event() {
        let mut state = state_with(RunConfig::default(), 5);
        state.player.position = Vec2::new(8.0, 232.0);
        let input = TickInput {
            up: true,
            ..on_floor()
        };
        tick(&mut state, &input, DT).unwrap();
        assert!(state.events.contains(&GameEvent::Jumped));
        assert!(state.player.velocity.y < 0.0);
        assert_eq!(state.player.mode, PlayerMode::Jumping);
    }

    #[test]
    fn test_pause_toggles_on_press() {
        let mut state = state_with(RunConfig::default(), 6);
        let pause = TickInput {
            pause: true,
            ..on_floor()
        };
        tick(&mut state, &pause, DT).unwrap();
        assert_eq!(state.phase, GamePhase::Paused);
        let x = state.player.position.x;

        // Still held: stays paused and nothing moves
        tick(&mut state, &pause, DT).unwrap();
        tick(&mut state, &on_floor(), DT).unwrap();
        assert_eq!(state.phase, GamePhase::Paused);
        assert_eq!(state.player.position.x, x);

        tick(&mut state, &pause, DT).unwrap();
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.events.contains(&GameEvent::Resumed));
    }

    #[test]
    fn test_drop_scheduled_as_player_approaches() {
        let mut state = state_with(RunConfig::default(), 7);
        state.laser.x = -10_000.0;
        let input = TickInput {
            resolved_position: Some(Vec2::new(290.0, 232.0)),
            ..on_floor()
        };
        tick(&mut state, &input, DT).unwrap();
        let drop = state.events.iter().find_map(|e| match e {
            GameEvent::SegmentDropping(cue) => Some(cue.clone()),
            _ => None,
        });
        let drop = drop.expect("drop cue");
        assert_eq!(drop.world_x, 480.0);
        assert_eq!(drop.duration_ms, 500.0);
        assert_eq!(drop.time_scale, state.ramp.tween_time_scale());
    }

    #[test]
    fn test_laser_close_animation() {
        let mut state = state_with(RunConfig::default(), 8);
        state.player.position = Vec2::new(500.0, 100.0);
        state.laser.x = 441.0;
        assert_eq!(state.animation_state(), AnimationState::LaserClose);
    }

    #[test]
    fn test_determinism() {
        let inputs = [on_floor(), TickInput { up: true, ..on_floor() }, TickInput::default()];
        let run = |seed| {
            let mut state = state_with(RunConfig::default(), seed);
            for i in 0..300 {
                tick(&mut state, &inputs[i % inputs.len()], DT).unwrap();
            }
            let keys: Vec<String> = state.window.segments().map(|s| s.source_key.clone()).collect();
            (keys, state.player.position, state.time_ticks)
        };
        assert_eq!(run(99999), run(99999));
    }
}
