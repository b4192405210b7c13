use serde::{Deserialize, Serialize};

/// How ESC resolves a course handicap when the player has no prior index.
///
/// The two historical behaviours disagree: one treats an unknown handicap as
/// the strictest band (par + 2 per hole), the other as the most lenient band
/// (10 per hole). Pick one explicitly; it is applied everywhere ESC runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnknownHandicapPolicy {
    /// Treat as course handicap 0 (the `<= 9` band, double bogey cap).
    Strictest,
    /// Treat as course handicap 40 (the `>= 40` band, 10 strokes per hole).
    #[default]
    Lenient,
    /// Refuse to adjust; surfaces [`crate::HandicapError::AmbiguousCourseHandicap`].
    Reject,
}

impl UnknownHandicapPolicy {
    /// The course handicap this policy substitutes, or `None` for `Reject`.
    pub fn assumed_course_handicap(self) -> Option<i32> {
        match self {
            Self::Strictest => Some(0),
            Self::Lenient => Some(40),
            Self::Reject => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strictest => "strictest",
            Self::Lenient => "lenient",
            Self::Reject => "reject",
        }
    }
}

impl std::str::FromStr for UnknownHandicapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strictest" | "strict" => Ok(Self::Strictest),
            "lenient" => Ok(Self::Lenient),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown handicap policy '{other}'")),
        }
    }
}

impl std::fmt::Display for UnknownHandicapPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunables for the timeline replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Prior index used for the first round when no manual entry precedes it.
    pub default_starting_index: Option<f64>,
    /// ESC fallback when the prior index is unknown.
    pub unknown_handicap: UnknownHandicapPolicy,
    /// Apply the exceptional-score reduction while replaying.
    pub exceptional_scores: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_starting_index: None,
            unknown_handicap: UnknownHandicapPolicy::default(),
            exceptional_scores: false,
        }
    }
}

impl EngineConfig {
    /// The settings that change how an individual round is scored.
    pub fn replay_settings(&self) -> ReplaySettings {
        ReplaySettings {
            unknown_handicap: self.unknown_handicap,
            exceptional_scores: self.exceptional_scores,
        }
    }
}

/// Scoring settings recorded with every round snapshot.
///
/// A stored snapshot can only be reused as replay state when it was scored
/// under the settings now in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReplaySettings {
    pub unknown_handicap: UnknownHandicapPolicy,
    pub exceptional_scores: bool,
}
