//! Input types for the engine: identifiers, hole scores and tee ratings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub i64);

/// Identifier of a played round. Used as the stable tie-breaker when two
/// rounds share a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub i64);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for RoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Longest card a round may have.
pub const MAX_HOLES: usize = 18;

/// Strokes taken on one hole. `strokes` is `None` until the hole is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoleScore {
    pub hole_number: u8,
    pub par: u8,
    pub strokes: Option<u8>,
}

impl HoleScore {
    pub fn new(hole_number: u8, par: u8, strokes: Option<u8>) -> Self {
        Self {
            hole_number,
            par,
            strokes,
        }
    }

    /// Build a full card from parallel `pars` / `strokes` slices, numbering
    /// holes from 1.
    pub fn card(pars: &[u8], strokes: &[u8]) -> Vec<HoleScore> {
        (1..=u8::MAX)
            .zip(pars.iter().zip(strokes))
            .map(|(n, (&par, &s))| HoleScore::new(n, par, Some(s)))
            .collect()
    }
}

/// The ratings of the tee set a round was played from. `course_rating` and
/// `par` are always the 18-hole values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeeRating {
    pub course_rating: f64,
    pub slope_rating: f64,
    pub par: i32,
}

impl TeeRating {
    pub fn new(course_rating: f64, slope_rating: f64, par: i32) -> Self {
        Self {
            course_rating,
            slope_rating,
            par,
        }
    }
}

/// A completed round as the replay consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundInput {
    pub round_id: RoundId,
    pub date_played: NaiveDate,
    pub holes: Vec<HoleScore>,
    pub tee: TeeRating,
}

impl RoundInput {
    /// Nine-hole rounds are scored against half the 18-hole course rating.
    pub fn is_nine_hole(&self) -> bool {
        self.holes.len() == 9
    }

    /// A round is scored once at least one hole has strokes recorded.
    /// Rounds with an empty card are skipped by the replay rather than
    /// treated as corrupt.
    pub fn is_scored(&self) -> bool {
        self.holes.iter().any(|h| h.strokes.is_some())
    }

    /// Ordering key used by the replay: date first, round id second.
    pub fn order_key(&self) -> (NaiveDate, RoundId) {
        (self.date_played, self.round_id)
    }
}
