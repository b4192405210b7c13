//! Rounding and display helpers shared by every calculation.

/// Values within this distance of a `.5` boundary (after scaling) are treated
/// as sitting exactly on it, so that `7.45` rounds like the decimal it was
/// written as rather than the binary float it became.
const TIE_EPSILON: f64 = 1e-9;

/// Round to the nearest integer, ties away from zero.
pub fn round_half_away(value: f64) -> f64 {
    (value + value.signum() * TIE_EPSILON).round()
}

/// Round to one decimal place, ties away from zero.
pub fn round1(value: f64) -> f64 {
    round_half_away(value * 10.0) / 10.0
}

/// Format a handicap index for display.
///
/// `None` renders as `N/A`. Plus handicaps (negative values) carry an
/// explicit `+` sign: an index of `-1.4` is shown as `+1.4`.
pub fn format_index(index: Option<f64>) -> String {
    match index {
        None => "N/A".to_string(),
        Some(v) if v < 0.0 => format!("+{:.1}", v.abs()),
        Some(v) => format!("{:.1}", v),
    }
}
