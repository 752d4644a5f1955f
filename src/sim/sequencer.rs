//! Segment sequencing
//!
//! Picks the key of the next segment to stream in: the fixed opening run
//! first, then a uniform random walk over each template's successor list.

use rand::Rng;
use thiserror::Error;

use super::library::SegmentLibrary;
use crate::consts::OPENING_KEY;

/// Errors raised while walking the segment graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("segment `{0}` has no successors to continue from")]
    EmptySuccessorSet(String),
    #[error("segment `{0}` is not in the library")]
    UnknownSegment(String),
}

/// Choose the key of the next segment
///
/// The opening check runs first so the opening run does not depend on the
/// RNG. A cold start (`previous == None`) past the opening picks among every
/// template.
pub fn next_key<R: Rng + ?Sized>(
    library: &SegmentLibrary,
    previous: Option<&str>,
    is_opening_phase: bool,
    opening_remaining: usize,
    rng: &mut R,
) -> Result<String, SequenceError> {
    if is_opening_phase && opening_remaining > 0 {
        return Ok(OPENING_KEY.to_string());
    }

    let Some(previous) = previous else {
        let keys: Vec<&str> = library.keys().collect();
        let index = rng.random_range(0..keys.len());
        return Ok(keys[index].to_string());
    };

    let template = library
        .get(previous)
        .ok_or_else(|| SequenceError::UnknownSegment(previous.to_string()))?;
    if template.successors.is_empty() {
        return Err(SequenceError::EmptySuccessorSet(previous.to_string()));
    }
    let index = rng.random_range(0..template.successors.len());
    Ok(template.successors[index].clone())
}
