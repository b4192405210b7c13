//! Course handicap, playing handicap and net score for a specific tee set.

use crate::differential::STANDARD_SLOPE;
use crate::rounding::round_half_away;
use crate::types::TeeRating;

/// `round(index * slope / 113)`.
pub fn course_handicap(index: f64, slope_rating: f64) -> i32 {
    round_half_away(index * slope_rating / STANDARD_SLOPE) as i32
}

/// Course handicap adjusted by the difference between course rating and par,
/// rounded to whole strokes.
pub fn playing_handicap(index: f64, slope_rating: f64, course_rating: f64, par: i32) -> i32 {
    let ch = course_handicap(index, slope_rating) as f64;
    round_half_away(ch + (course_rating - par as f64)) as i32
}

pub fn net_score(gross_score: i32, playing_handicap: i32) -> i32 {
    gross_score - playing_handicap
}

/// Both handicaps for one tee set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    pub course_handicap: i32,
    pub playing_handicap: i32,
}

impl Projection {
    pub fn for_tee(index: f64, tee: &TeeRating) -> Self {
        Self {
            course_handicap: course_handicap(index, tee.slope_rating),
            playing_handicap: playing_handicap(
                index,
                tee.slope_rating,
                tee.course_rating,
                tee.par,
            ),
        }
    }

    pub fn net_score(&self, gross_score: i32) -> i32 {
        net_score(gross_score, self.playing_handicap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golden_projection() {
        assert_eq!(course_handicap(12.5, 138.0), 15);
        assert_eq!(playing_handicap(12.5, 138.0, 72.3, 72), 15);
    }

    #[test]
    fn test_prior_index_course_handicap() {
        assert_eq!(course_handicap(20.0, 145.0), 26);
    }

    #[test]
    fn test_rating_below_par_reduces_playing_handicap() {
        // 18.0 * 125 / 113 = 19.91 -> 20, 20 + (70.1 - 72) = 18.1 -> 18
        assert_eq!(playing_handicap(18.0, 125.0, 70.1, 72), 18);
    }

    #[test]
    fn test_plus_index_projects_negative() {
        assert_eq!(course_handicap(-2.0, 130.0), -2);
        assert_eq!(playing_handicap(-2.0, 130.0, 73.0, 72), -1);
    }

    #[test]
    fn test_net_score_subtracts_playing_handicap() {
        let tee = TeeRating::new(72.3, 138.0, 72);
        let projection = Projection::for_tee(12.5, &tee);
        assert_eq!(projection.course_handicap, 15);
        assert_eq!(projection.net_score(90), 75);
        assert_eq!(net_score(70, -2), 72);
    }
}
