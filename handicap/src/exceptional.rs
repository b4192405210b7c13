//! Exceptional score detection.
//!
//! A round whose differential beats the player's index by 7.0 or more strokes
//! reduces the index: 1.0 for 7.0 to 9.9 strokes, 2.0 for 10.0 or more.

use crate::rounding::round1;

const EXCEPTIONAL_THRESHOLD: f64 = 7.0;
const LARGE_EXCEPTIONAL_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExceptionalScore {
    /// How many strokes better than the index the differential was.
    pub margin: f64,
    pub reduction: f64,
}

/// Returns `Some` when `differential` is exceptional relative to `index`.
pub fn detect_exceptional_score(differential: f64, index: f64) -> Option<ExceptionalScore> {
    let margin = round1(index - differential);
    let reduction = if margin >= LARGE_EXCEPTIONAL_THRESHOLD {
        2.0
    } else if margin >= EXCEPTIONAL_THRESHOLD {
        1.0
    } else {
        return None;
    };
    Some(ExceptionalScore { margin, reduction })
}
