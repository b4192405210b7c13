//! Equitable Stroke Control: per-hole stroke caps by course-handicap band.

use crate::config::UnknownHandicapPolicy;
use crate::error::HandicapError;
use crate::types::HoleScore;

/// The course handicap ESC adjusts against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseHandicap {
    Known(i32),
    /// The player has no prior index yet.
    Unknown,
}

impl CourseHandicap {
    /// Resolve to a concrete handicap using `policy`.
    pub fn resolve(self, policy: UnknownHandicapPolicy) -> Result<i32, HandicapError> {
        match self {
            Self::Known(ch) => Ok(ch),
            Self::Unknown => policy
                .assumed_course_handicap()
                .ok_or(HandicapError::AmbiguousCourseHandicap),
        }
    }
}

impl From<Option<i32>> for CourseHandicap {
    fn from(value: Option<i32>) -> Self {
        value.map_or(Self::Unknown, Self::Known)
    }
}

/// Maximum strokes that count on a hole of `par` for a given course handicap.
pub fn max_strokes_for_hole(par: u8, course_handicap: i32) -> i32 {
    match course_handicap {
        i32::MIN..=9 => par as i32 + 2,
        10..=19 => 7,
        20..=29 => 8,
        30..=39 => 9,
        _ => 10,
    }
}

fn validated_strokes(hole: &HoleScore) -> Result<i32, HandicapError> {
    let strokes = hole.strokes.ok_or(HandicapError::MissingStrokes {
        hole_number: hole.hole_number,
    })?;
    if strokes == 0 || hole.par == 0 {
        return Err(HandicapError::InvalidHoleScore {
            hole_number: hole.hole_number,
            par: hole.par,
            strokes,
        });
    }
    Ok(strokes as i32)
}

/// Raw gross score of a fully played card.
pub fn gross_score(holes: &[HoleScore]) -> Result<i32, HandicapError> {
    if holes.is_empty() {
        return Err(HandicapError::EmptyCard);
    }
    holes.iter().map(validated_strokes).sum()
}

/// Adjusted gross score: every hole capped at [`max_strokes_for_hole`].
///
/// An unknown handicap is resolved through `policy`, so the same input always
/// adjusts the same way regardless of which caller runs it.
pub fn apply_esc(
    holes: &[HoleScore],
    course_handicap: CourseHandicap,
    policy: UnknownHandicapPolicy,
) -> Result<i32, HandicapError> {
    if holes.is_empty() {
        return Err(HandicapError::EmptyCard);
    }
    let ch = course_handicap.resolve(policy)?;
    let mut adjusted = 0;
    for hole in holes {
        let strokes = validated_strokes(hole)?;
        adjusted += strokes.min(max_strokes_for_hole(hole.par, ch));
    }
    Ok(adjusted)
}
