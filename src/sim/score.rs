//! Distance-based scoring

use crate::consts::{SCORE_ORIGIN_X, SCORE_STEP_PX};

/// Score for a player at horizontal position `x`
#[inline]
pub fn score_for(x: f32) -> u64 {
    ((x - SCORE_ORIGIN_X).max(0.0) / SCORE_STEP_PX).ceil() as u64
}
