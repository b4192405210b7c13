/// Errors from the pure calculation functions.
///
/// Fewer than three differentials is deliberately *not* an error: the
/// selector returns `None` and callers treat that as "not yet ratable".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HandicapError {
    #[error("invalid rating: course rating {course_rating}, slope {slope_rating}")]
    InvalidRating { course_rating: f64, slope_rating: f64 },
    #[error("course handicap is unknown and the configured policy rejects guessing it")]
    AmbiguousCourseHandicap,
    #[error("hole {hole_number} has no strokes recorded")]
    MissingStrokes { hole_number: u8 },
    #[error("hole {hole_number} has an invalid score (par {par}, strokes {strokes})")]
    InvalidHoleScore { hole_number: u8, par: u8, strokes: u8 },
    #[error("round has no holes")]
    EmptyCard,
}
