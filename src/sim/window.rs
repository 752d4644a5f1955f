//! Streaming window
//!
//! The world is an endless strip of segments, but only a fixed number of
//! them exist at any time. Each tick the window forgets what scrolled out
//! behind the camera and builds new segments ahead of the player.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::hazard::{HazardMarker, TileBounds, attach_hazards, strip_hazards};
use super::library::{SegmentLibrary, SegmentTemplate};
use super::sequencer::{SequenceError, next_key};
use crate::consts::*;
use crate::tuning::RunConfig;

/// Stable identity of a streamed segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

/// A positioned copy of a segment template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentInstance {
    pub id: SegmentId,
    pub source_key: String,
    /// Left edge in world space
    pub world_x: f32,
    /// Current vertical offset: `ENTRANCE_OFFSET_Y` until the drop is scheduled
    pub y: f32,
    pub width_px: f32,
    pub height_px: f32,
    /// Own copy of the tiles (hazard rolls edit it)
    pub tiles: Vec<Vec<i32>>,
    pub animation_started: bool,
    /// Part of the fixed opening run
    pub opening: bool,
    pub hazards: Vec<HazardMarker>,
}

impl SegmentInstance {
    fn from_template(id: SegmentId, template: &SegmentTemplate, world_x: f32, opening: bool) -> Self {
        let width_px = template.cols() as f32 * TILE_WIDTH;
        let height_px = template.rows() as f32 * TILE_HEIGHT;
        Self {
            id,
            source_key: template.key.clone(),
            world_x,
            y: if opening { 0.0 } else { ENTRANCE_OFFSET_Y },
            width_px,
            height_px,
            tiles: template.tiles.clone(),
            animation_started: opening,
            opening,
            hazards: Vec::new(),
        }
    }

    pub fn right_edge(&self) -> f32 {
        self.world_x + self.width_px
    }

    /// World bounds of a tile once the segment has landed
    pub fn tile_bounds(&self, col: usize, row: usize) -> TileBounds {
        let left = self.world_x + col as f32 * TILE_WIDTH;
        let top = row as f32 * TILE_HEIGHT;
        TileBounds {
            left,
            top,
            right: left + TILE_WIDTH,
            bottom: top + TILE_HEIGHT,
        }
    }

    /// Tile under a world point, if the point lies on this segment
    pub fn tile_at(&self, x: f32, y: f32) -> Option<i32> {
        let local_x = x - self.world_x;
        let local_y = y - self.y;
        if local_x < 0.0 || local_y < 0.0 {
            return None;
        }
        let col = (local_x / TILE_WIDTH) as usize;
        let row = (local_y / TILE_HEIGHT) as usize;
        self.tiles.get(row)?.get(col).copied()
    }

    #[cfg(test)]
    pub(crate) fn for_test(key: &str, tiles: Vec<Vec<i32>>, world_x: f32) -> Self {
        let template = SegmentTemplate::new(key, tiles, Vec::new());
        Self::from_template(SegmentId(0), &template, world_x, false)
    }
}

/// Decorative color hint shown where a segment will land
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientMarker {
    pub segment: SegmentId,
    pub x: f32,
    pub width: f32,
    pub tint: u32,
    pub fading: bool,
}

/// Drop-in animation the host should play for a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropCue {
    pub segment: SegmentId,
    pub world_x: f32,
    pub from_y: f32,
    pub duration_ms: f32,
    pub time_scale: f32,
    /// Whether a gradient hint should fade out alongside
    pub fade_gradient: bool,
}

/// Tint for a segment's gradient hint, keyed by color-named segments
pub fn gradient_tint(key: &str) -> u32 {
    match key {
        "red" => 0xff0000,
        "orange" => 0xff8000,
        "yellow" => 0xffff00,
        "purple" => 0xff0080,
        "pink" => 0xff00ff,
        "green" => 0x00ff00,
        "cyan" => 0x00ffff,
        "blue" => 0x0000ff,
        "lime" => 0x00ff80,
        _ => 0xffffff,
    }
}

/// Live segments around the player, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamingWindow {
    segments: VecDeque<SegmentInstance>,
    gradients: Vec<GradientMarker>,
    next_segment_position: f32,
    last_segment_key: Option<String>,
    appended: usize,
    next_id: u64,
}

impl StreamingWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> impl Iterator<Item = &SegmentInstance> {
        self.segments.iter()
    }

    pub fn segments_mut(&mut self) -> impl Iterator<Item = &mut SegmentInstance> {
        self.segments.iter_mut()
    }

    pub fn gradients(&self) -> &[GradientMarker] {
        &self.gradients
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Key of the most recently appended segment
    pub fn last_segment_key(&self) -> Option<&str> {
        self.last_segment_key.as_deref()
    }

    /// World x where the next segment will be placed
    pub fn next_segment_position(&self) -> f32 {
        self.next_segment_position
    }

    /// Total segments appended since the run started
    pub fn appended(&self) -> usize {
        self.appended
    }

    /// Evict, then refill
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        library: &SegmentLibrary,
        config: &RunConfig,
        rng: &mut R,
        player_x: f32,
        camera_width: f32,
    ) -> Result<(Vec<SegmentId>, Vec<SegmentId>), SequenceError> {
        let evicted = self.evict(player_x, camera_width);
        let appended = self.fill(library, config, rng, player_x)?;
        Ok((evicted, appended))
    }

    /// Remove segments (and their gradients) that ended behind the camera
    pub fn evict(&mut self, player_x: f32, camera_width: f32) -> Vec<SegmentId> {
        let camera_start = player_x - camera_width;
        let mut evicted = Vec::new();
        self.segments.retain(|segment| {
            let keep = segment.right_edge() >= camera_start;
            if !keep {
                evicted.push(segment.id);
            }
            keep
        });
        self.gradients
            .retain(|gradient| gradient.x + gradient.width >= camera_start);
        for id in &evicted {
            log::debug!("Evicted segment {}", id.0);
        }
        evicted
    }

    /// Append segments until the window is full
    pub fn fill<R: Rng + ?Sized>(
        &mut self,
        library: &SegmentLibrary,
        config: &RunConfig,
        rng: &mut R,
        player_x: f32,
    ) -> Result<Vec<SegmentId>, SequenceError> {
        let mut appended = Vec::new();
        while self.segments.len() < config.window_depth {
            appended.push(self.append(library, config, rng)?);
        }

        let lead = self.next_segment_position - player_x;
        if !appended.is_empty() && lead < config.lead_append_threshold_px {
            log::warn!(
                "Window lead {:.0}px is below {:.0}px; consider a deeper window",
                lead,
                config.lead_append_threshold_px
            );
        }
        Ok(appended)
    }

    fn append<R: Rng + ?Sized>(
        &mut self,
        library: &SegmentLibrary,
        config: &RunConfig,
        rng: &mut R,
    ) -> Result<SegmentId, SequenceError> {
        let opening = self.appended < config.opening_segments;
        let remaining = config.opening_segments.saturating_sub(self.appended);
        let key = next_key(library, self.last_segment_key.as_deref(), opening, remaining, rng)?;
        let template = library
            .get(&key)
            .ok_or_else(|| SequenceError::UnknownSegment(key.clone()))?;

        let id = SegmentId(self.next_id);
        self.next_id += 1;
        let mut instance =
            SegmentInstance::from_template(id, template, self.next_segment_position, opening);
        if opening {
            strip_hazards(&mut instance, config);
        } else {
            attach_hazards(&mut instance, config, rng);
            self.gradients.push(GradientMarker {
                segment: id,
                x: self.next_segment_position,
                width: config.segment_width_px(),
                tint: gradient_tint(&key),
                fading: false,
            });
        }

        log::debug!(
            "Appended segment {} `{}` at x={} ({} spikes)",
            id.0,
            key,
            self.next_segment_position,
            instance.hazards.len()
        );
        self.segments.push_back(instance);
        self.next_segment_position += config.segment_width_px();
        self.last_segment_key = Some(key);
        self.appended += 1;
        Ok(id)
    }

    /// Schedule drop-ins for segments the player is about to reach
    ///
    /// `tween_time_scale` comes from the difficulty ramp and is copied onto
    /// each cue.
    pub fn schedule_drops(
        &mut self,
        player_x: f32,
        tween_time_scale: f32,
        config: &RunConfig,
    ) -> Vec<DropCue> {
        let mut cues = Vec::new();
        for segment in self.segments.iter_mut() {
            if segment.animation_started || segment.world_x - player_x >= config.drop_trigger_distance_px {
                continue;
            }
            segment.animation_started = true;
            let from_y = segment.y;
            segment.y = 0.0;

            let gradient = self
                .gradients
                .iter_mut()
                .find(|g| g.segment == segment.id && !g.fading);
            let fade_gradient = gradient.is_some();
            if let Some(gradient) = gradient {
                gradient.fading = true;
            }

            log::debug!("Dropping segment {} at x={}", segment.id.0, segment.world_x);
            cues.push(DropCue {
                segment: segment.id,
                world_x: segment.world_x,
                from_y,
                duration_ms: DROP_TWEEN_MS,
                time_scale: tween_time_scale,
                fade_gradient,
            });
        }
        cues
    }

    /// Tile under a world point across the live window
    pub fn tile_at(&self, x: f32, y: f32) -> Option<i32> {
        self.segments
            .iter()
            .find(|s| s.world_x <= x && x < s.right_edge())
            .and_then(|s| s.tile_at(x, y))
    }

    /// Whether a world point is inside a colliding tile
    pub fn is_solid_at(&self, x: f32, y: f32, config: &RunConfig) -> bool {
        self.tile_at(x, y).is_some_and(|tile| config.is_solid_tile(tile))
    }
}
