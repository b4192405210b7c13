pub mod sqlite;
pub mod traits;

pub use traits::{HistoryRepository, PlayerRepository, RoundRepository, TeeSetRepository};

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use handicap::{HoleScore, PlayerId, RoundId, TeeRating};
use serde::{Deserialize, Serialize};

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Corrupt row: {0}")]
    Corrupt(String),
    /// A completed round whose stored holes cannot be decoded.
    #[error("round {round_id} ({date}) cannot be read: {reason}")]
    CorruptRound {
        round_id: RoundId,
        date: NaiveDate,
        reason: String,
    },
}

/// Identifier of a rated tee set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeeSetId(pub i64);

impl std::fmt::Display for TeeSetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player_id: PlayerId,
    pub name: String,
    pub created_at: u64,
}

/// A course's tee set with its 18-hole ratings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeeSetRecord {
    pub tee_id: TeeSetId,
    pub course_name: String,
    pub tee_name: String,
    pub course_rating: f64,
    pub slope_rating: f64,
    pub par: i32,
}

impl TeeSetRecord {
    pub fn rating(&self) -> TeeRating {
        TeeRating::new(self.course_rating, self.slope_rating, self.par)
    }
}

/// Tee set fields before an id is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTeeSet {
    pub course_name: String,
    pub tee_name: String,
    pub course_rating: f64,
    pub slope_rating: f64,
    pub par: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    InProgress,
    Completed,
}

/// A round as stored, with its hole-by-hole card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round_id: RoundId,
    pub player_id: PlayerId,
    pub tee_id: TeeSetId,
    pub date_played: NaiveDate,
    pub status: RoundStatus,
    pub holes: Vec<HoleScore>,
    pub created_at: u64,
}

impl RoundRecord {
    /// Hole numbers with no strokes recorded yet.
    pub fn missing_holes(&self) -> Vec<u8> {
        self.holes
            .iter()
            .filter(|h| h.strokes.is_none())
            .map(|h| h.hole_number)
            .collect()
    }
}

/// Round fields before an id is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRound {
    pub player_id: PlayerId,
    pub tee_id: TeeSetId,
    pub date_played: NaiveDate,
    pub status: RoundStatus,
    pub holes: Vec<HoleScore>,
}

/// Bundles the repository implementations of one storage backend.
///
/// Services are generic over `D: Persistence` so the backend is chosen by
/// static dispatch.
pub trait Persistence: Send + Sync + 'static {
    type Players: PlayerRepository + 'static;
    type Tees: TeeSetRepository + 'static;
    type Rounds: RoundRepository + 'static;
    type History: HistoryRepository + 'static;
}

/// Shared handles to every repository of a backend.
pub struct Repositories<D: Persistence> {
    pub players: Arc<D::Players>,
    pub tees: Arc<D::Tees>,
    pub rounds: Arc<D::Rounds>,
    pub history: Arc<D::History>,
}

impl<D: Persistence> Clone for Repositories<D> {
    fn clone(&self) -> Self {
        Self {
            players: self.players.clone(),
            tees: self.tees.clone(),
            rounds: self.rounds.clone(),
            history: self.history.clone(),
        }
    }
}

/// Get the current unix timestamp in seconds.
pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_holes_lists_unplayed() {
        let round = RoundRecord {
            round_id: RoundId(1),
            player_id: PlayerId(1),
            tee_id: TeeSetId(1),
            date_played: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            status: RoundStatus::InProgress,
            holes: vec![
                HoleScore::new(1, 4, Some(5)),
                HoleScore::new(2, 3, None),
                HoleScore::new(3, 5, None),
            ],
            created_at: 0,
        };
        assert_eq!(round.missing_holes(), vec![2, 3]);
    }

    #[test]
    fn test_tee_rating_uses_eighteen_hole_values() {
        let tee = TeeSetRecord {
            tee_id: TeeSetId(3),
            course_name: "Pine Valley".into(),
            tee_name: "Blue".into(),
            course_rating: 74.1,
            slope_rating: 144.0,
            par: 70,
        };
        assert_eq!(tee.rating(), TeeRating::new(74.1, 144.0, 70));
    }
}
