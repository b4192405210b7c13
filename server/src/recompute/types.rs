use chrono::NaiveDate;
use handicap::{HandicapSnapshot, PlayerId, RoundId, TimelineError};
use serde::Serialize;

use crate::persistence::PersistenceError;

#[derive(Debug, thiserror::Error)]
pub enum RecomputeError {
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Which part of a player's timeline to rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeScope {
    Full,
    /// Keep round snapshots dated before this day and replay the rest.
    From(NaiveDate),
}

/// A round that stopped a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecomputeDiagnostic {
    pub round_id: RoundId,
    pub date: NaiveDate,
    pub message: String,
}

impl From<&TimelineError> for RecomputeDiagnostic {
    fn from(e: &TimelineError) -> Self {
        match e {
            TimelineError::Corruption {
                round_id, date, ..
            } => Self {
                round_id: *round_id,
                date: *date,
                message: e.to_string(),
            },
        }
    }
}

/// Outcome of recomputing one player.
///
/// When `errors` is non-empty nothing was written and `snapshots` is the
/// history as it was before the attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineResult {
    pub player_id: PlayerId,
    /// The player's full history after the recompute, manual entries included.
    pub snapshots: Vec<HandicapSnapshot>,
    pub errors: Vec<RecomputeDiagnostic>,
    /// Round snapshots written by this recompute.
    pub rounds_replayed: usize,
}

impl TimelineResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Latest carried index in the history: a rated round or a manual entry.
    pub fn current_index(&self) -> Option<f64> {
        self.snapshots.iter().rev().find_map(HandicapSnapshot::carried_index)
    }
}

/// A player whose rebuild failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerFailure {
    pub player_id: PlayerId,
    pub reason: String,
}

/// Summary of a batch rebuild.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RebuildReport {
    pub succeeded: Vec<PlayerId>,
    pub failed: Vec<PlayerFailure>,
}

impl RebuildReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}
