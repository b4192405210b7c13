//! Score differentials.

use crate::error::HandicapError;
use crate::rounding::round1;

/// Slope rating of a tee of average difficulty.
pub const STANDARD_SLOPE: f64 = 113.0;

fn check_ratings(course_rating: f64, slope_rating: f64) -> Result<(), HandicapError> {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if valid(course_rating) && valid(slope_rating) {
        Ok(())
    } else {
        Err(HandicapError::InvalidRating {
            course_rating,
            slope_rating,
        })
    }
}

fn raw_differential(adjusted_gross: f64, course_rating: f64, slope_rating: f64) -> f64 {
    (STANDARD_SLOPE / slope_rating) * (adjusted_gross - course_rating)
}

/// `round1((113 / slope) * (adjusted_gross - course_rating))`.
pub fn compute_differential(
    adjusted_gross: i32,
    course_rating: f64,
    slope_rating: f64,
) -> Result<f64, HandicapError> {
    check_ratings(course_rating, slope_rating)?;
    Ok(round1(raw_differential(
        adjusted_gross as f64,
        course_rating,
        slope_rating,
    )))
}

/// Nine-hole variant: scored against half the 18-hole `course_rating`, then
/// doubled to an 18-hole equivalent before rounding.
pub fn compute_nine_hole_differential(
    adjusted_gross: i32,
    course_rating: f64,
    slope_rating: f64,
) -> Result<f64, HandicapError> {
    check_ratings(course_rating, slope_rating)?;
    let nine = raw_differential(adjusted_gross as f64, course_rating / 2.0, slope_rating);
    Ok(round1(nine * 2.0))
}

/// Dispatch on round length.
pub fn differential_for(
    adjusted_gross: i32,
    course_rating: f64,
    slope_rating: f64,
    is_nine_hole: bool,
) -> Result<f64, HandicapError> {
    if is_nine_hole {
        compute_nine_hole_differential(adjusted_gross, course_rating, slope_rating)
    } else {
        compute_differential(adjusted_gross, course_rating, slope_rating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eighteen_hole_golden_value() {
        assert_eq!(compute_differential(85, 75.5, 145.0).unwrap(), 7.4);
    }

    #[test]
    fn test_standard_slope_is_score_minus_rating() {
        assert_eq!(compute_differential(80, 72.0, 113.0).unwrap(), 8.0);
        assert_eq!(compute_differential(70, 72.4, 113.0).unwrap(), -2.4);
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        // (113/113) * (80 - 71.55) = 8.45
        assert_eq!(compute_differential(80, 71.55, 113.0).unwrap(), 8.5);
        // (113/113) * (70 - 71.45) = -1.45
        assert_eq!(compute_differential(70, 71.45, 113.0).unwrap(), -1.5);
    }

    #[test]
    fn test_nine_hole_halves_rating_then_doubles() {
        // (113/113) * (40 - 36.0) * 2 = 8.0
        assert_eq!(compute_nine_hole_differential(40, 72.0, 113.0).unwrap(), 8.0);
        // (113/130) * (45 - 35.65) * 2 = 16.254 -> 16.3
        assert_eq!(compute_nine_hole_differential(45, 71.3, 130.0).unwrap(), 16.3);
        assert_eq!(differential_for(40, 72.0, 113.0, true).unwrap(), 8.0);
        assert_eq!(differential_for(80, 72.0, 113.0, false).unwrap(), 8.0);
    }

    #[test]
    fn test_zero_or_negative_ratings_fail() {
        for (cr, slope) in [(72.0, 0.0), (72.0, -113.0), (0.0, 113.0), (72.0, f64::NAN)] {
            assert!(matches!(
                compute_differential(80, cr, slope),
                Err(HandicapError::InvalidRating { .. })
            ));
            assert!(matches!(
                compute_nine_hole_differential(40, cr, slope),
                Err(HandicapError::InvalidRating { .. })
            ));
        }
    }
}
