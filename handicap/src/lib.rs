//! Handicap derivation engine.
//!
//! Pure, synchronous calculations for a WHS-style handicap system:
//!
//! - [`esc`] caps per-hole strokes (Equitable Stroke Control).
//! - [`differential`] normalises an adjusted gross score against a tee's ratings.
//! - [`selector`] turns the rolling window of differentials into a Handicap Index.
//! - [`projector`] converts an index into course/playing handicaps and net scores.
//! - [`exceptional`] detects outlier low rounds.
//! - [`timeline`] replays a player's rounds in date order, carrying the prior
//!   index from one round to the next, and emits the snapshot sequence.
//!
//! Nothing in this crate performs I/O; persistence and orchestration live in
//! the server crate.

pub mod config;
pub mod differential;
pub mod error;
pub mod esc;
pub mod exceptional;
pub mod projector;
pub mod rounding;
pub mod selector;
pub mod snapshot;
pub mod timeline;
pub mod types;

pub use config::{EngineConfig, ReplaySettings, UnknownHandicapPolicy};
pub use differential::{compute_differential, compute_nine_hole_differential, differential_for};
pub use error::HandicapError;
pub use esc::{apply_esc, gross_score, max_strokes_for_hole, CourseHandicap};
pub use exceptional::{detect_exceptional_score, ExceptionalScore};
pub use projector::{course_handicap, net_score, playing_handicap, Projection};
pub use rounding::{format_index, round1, round_half_away};
pub use selector::{
    compute_handicap_index, selection_rule, RollingWindow, SelectionRule, MAX_HANDICAP_INDEX,
    MIN_DIFFERENTIALS, WINDOW_SIZE,
};
pub use snapshot::{HandicapSnapshot, RoundCalculation, ScoreDifferentialRecord, SnapshotSource};
pub use timeline::{order_rounds, replay, replay_from, select_seed, ReplayState, Timeline, TimelineError};
pub use types::{HoleScore, PlayerId, RoundId, RoundInput, TeeRating, MAX_HOLES};
