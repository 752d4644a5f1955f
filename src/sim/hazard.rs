//! Spike hazards
//!
//! Level authors paint hazard tiles where spikes *may* appear. When a segment
//! is streamed in, every such tile is rolled independently: it either becomes
//! a one-shot spike marker or disappears entirely.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::player::PlayerState;
use super::window::SegmentInstance;
use crate::consts::{EMPTY_TILE, PLAYER_HALF_SIZE};
use crate::tuning::RunConfig;

/// Axis-aligned world bounds of a single tile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileBounds {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// A spike placed over a hazard tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardMarker {
    pub col: usize,
    pub row: usize,
    pub bounds: TileBounds,
    enabled: bool,
    triggered: bool,
}

impl HazardMarker {
    pub fn new(col: usize, row: usize, bounds: TileBounds) -> Self {
        Self {
            col,
            row,
            bounds,
            enabled: true,
            triggered: false,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn triggered(&self) -> bool {
        self.triggered
    }

    /// Fire the spike; returns false if it was already spent
    pub fn trigger(&mut self) -> bool {
        if !self.enabled || self.triggered {
            return false;
        }
        self.enabled = false;
        self.triggered = true;
        true
    }

    /// Whether the player's feet line and x fall inside this spike
    pub fn touches(&self, player: &PlayerState) -> bool {
        let feet = (player.position.y - PLAYER_HALF_SIZE).round();
        let x = player.position.x.round();
        self.bounds.top == feet && self.bounds.left < x && x < self.bounds.right
    }
}

/// Roll every hazard tile of a freshly built segment
///
/// Live spikes leave the backdrop tile behind (drawn, no collision); failed
/// rolls clear the tile.
pub fn attach_hazards<R: Rng + ?Sized>(
    instance: &mut SegmentInstance,
    config: &RunConfig,
    rng: &mut R,
) {
    for row in 0..instance.tiles.len() {
        for col in 0..instance.tiles[row].len() {
            if !config.is_hazard_tile(instance.tiles[row][col]) {
                continue;
            }
            if rng.random_bool(config.spike_probability) {
                let bounds = instance.tile_bounds(col, row);
                instance.hazards.push(HazardMarker::new(col, row, bounds));
                instance.tiles[row][col] = config.hazard_backdrop_tile;
            } else {
                instance.tiles[row][col] = EMPTY_TILE;
            }
        }
    }
}

/// Clear all hazard tiles without creating markers (opening segments)
pub fn strip_hazards(instance: &mut SegmentInstance, config: &RunConfig) {
    for tile in instance.tiles.iter_mut().flatten() {
        if config.is_hazard_tile(*tile) {
            *tile = EMPTY_TILE;
        }
    }
}

/// Trigger every live marker the player is standing in
///
/// Spikes only bite while the nominal speed exceeds `min_speed`; the slowed
/// speed is deliberately not consulted.
pub fn check_trigger<'a>(
    markers: impl IntoIterator<Item = &'a mut HazardMarker>,
    player: &PlayerState,
    min_speed: f32,
) -> Vec<HazardMarker> {
    if player.nominal_speed <= min_speed {
        return Vec::new();
    }
    markers
        .into_iter()
        .filter(|marker| marker.enabled && !marker.triggered && marker.touches(player))
        .filter_map(|marker| marker.trigger().then(|| marker.clone()))
        .collect()
}

/// Drop markers that are far enough behind the player
pub fn evict(markers: &mut Vec<HazardMarker>, player_x: f32, distance: f32) {
    markers.retain(|marker| marker.bounds.right >= player_x - distance);
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn marker_at(left: f32, top: f32) -> HazardMarker {
        HazardMarker::new(
            0,
            0,
            TileBounds {
                left,
                top,
                right: left + 16.0,
                bottom: top + 16.0,
            },
        )
    }

    fn player_at(x: f32, y: f32, speed: f32) -> PlayerState {
        let mut player = PlayerState::new(Vec2::new(x, y), speed);
        player.nominal_speed = speed;
        player
    }

    #[test]
    fn test_trigger_predicate() {
        let mut markers = vec![marker_at(100.0, 224.0)];
        let player = player_at(108.0, 232.0, 80.0);
        let hits = check_trigger(markers.iter_mut(), &player, 20.0);
        assert_eq!(hits.len(), 1);
        assert!(markers[0].triggered());
        assert!(!markers[0].enabled());
    }

    #[test]
    fn test_no_trigger_on_edges_or_wrong_row() {
        let mut markers = vec![marker_at(100.0, 224.0)];
        // Exactly on the left edge does not count
        assert!(check_trigger(markers.iter_mut(), &player_at(100.0, 232.0, 80.0), 20.0).is_empty());
        // Feet one row up
        assert!(check_trigger(markers.iter_mut(), &player_at(108.0, 216.0, 80.0), 20.0).is_empty());
        assert!(markers[0].enabled());
    }

    #[test]
    fn test_no_trigger_when_slow() {
        let mut markers = vec![marker_at(100.0, 224.0)];
        let player = player_at(108.0, 232.0, 20.0);
        assert!(check_trigger(markers.iter_mut(), &player, 20.0).is_empty());
    }

    #[test]
    fn test_triggers_at_most_once() {
        let mut markers = vec![marker_at(100.0, 224.0)];
        let player = player_at(108.0, 232.0, 80.0);
        let mut total = 0;
        for _ in 0..10 {
            total += check_trigger(markers.iter_mut(), &player, 20.0).len();
        }
        assert_eq!(total, 1);
        assert!(markers[0].triggered());
    }

    #[test]
    fn test_evict_behind_player() {
        let mut markers = vec![marker_at(0.0, 224.0), marker_at(400.0, 224.0)];
        // 16 < 500 - 240 = 260, so the first marker goes
        evict(&mut markers, 500.0, 240.0);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].bounds.left, 400.0);

        let mut empty: Vec<HazardMarker> = Vec::new();
        evict(&mut empty, 500.0, 240.0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_attach_rolls_each_tile() {
        let config = RunConfig {
            spike_probability: 1.0,
            ..RunConfig::default()
        };
        let mut rng = Pcg32::seed_from_u64(5);
        let tiles = vec![vec![-1, 319, -1], vec![2, 2, 319]];
        let mut instance = SegmentInstance::for_test("spikes", tiles, 160.0);
        attach_hazards(&mut instance, &config, &mut rng);

        assert_eq!(instance.hazards.len(), 2);
        assert_eq!(instance.tiles[0][1], config.hazard_backdrop_tile);
        assert_eq!(instance.hazards[0].bounds.left, 176.0);
        assert_eq!(instance.hazards[1].bounds.top, 16.0);

        let config = RunConfig {
            spike_probability: 0.0,
            ..RunConfig::default()
        };
        let tiles = vec![vec![319, 2]];
        let mut instance = SegmentInstance::for_test("spikes", tiles, 0.0);
        attach_hazards(&mut instance, &config, &mut rng);
        assert!(instance.hazards.is_empty());
        assert_eq!(instance.tiles[0], vec![EMPTY_TILE, 2]);
    }

    #[test]
    fn test_strip_clears_without_markers() {
        let config = RunConfig::default();
        let mut instance = SegmentInstance::for_test("start", vec![vec![319, 1]], 0.0);
        strip_hazards(&mut instance, &config);
        assert_eq!(instance.tiles[0], vec![EMPTY_TILE, 1]);
        assert!(instance.hazards.is_empty());
    }

    proptest! {
        #[test]
        fn prop_marker_triggers_at_most_once(
            steps in proptest::collection::vec((90.0f32..130.0, 220.0f32..240.0), 1..200),
        ) {
            let mut markers = vec![marker_at(100.0, 224.0)];
            let mut total = 0;
            for (x, y) in steps {
                total += check_trigger(markers.iter_mut(), &player_at(x, y, 80.0), 20.0).len();
                prop_assert!(total <= 1);
                prop_assert_eq!(markers[0].triggered(), total == 1);
            }
        }
    }
}
