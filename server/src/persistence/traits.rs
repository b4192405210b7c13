//! Async repository trait definitions for the persistence layer.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so that
//! the futures are guaranteed `Send`, which `tokio::spawn` needs for the
//! rebuild workers.

use super::{
    NewRound, NewTeeSet, PersistenceError, PlayerRecord, RoundRecord, RoundStatus, TeeSetId,
    TeeSetRecord,
};
use chrono::NaiveDate;
use handicap::{HandicapSnapshot, HoleScore, PlayerId, RoundId, RoundInput};
use std::future::Future;

/// Repository for players.
pub trait PlayerRepository: Send + Sync {
    fn create_player(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<PlayerRecord, PersistenceError>> + Send;
    fn load_player(
        &self,
        id: PlayerId,
    ) -> impl Future<Output = Result<Option<PlayerRecord>, PersistenceError>> + Send;
    fn list_players(
        &self,
    ) -> impl Future<Output = Result<Vec<PlayerRecord>, PersistenceError>> + Send;
}

/// Repository for rated tee sets.
pub trait TeeSetRepository: Send + Sync {
    fn create_tee_set(
        &self,
        data: &NewTeeSet,
    ) -> impl Future<Output = Result<TeeSetRecord, PersistenceError>> + Send;
    fn load_tee_set(
        &self,
        id: TeeSetId,
    ) -> impl Future<Output = Result<Option<TeeSetRecord>, PersistenceError>> + Send;
}

/// Repository for rounds and their hole scores.
///
/// Hole scores are stored atomically with the round record.
pub trait RoundRepository: Send + Sync {
    fn insert_round(
        &self,
        data: &NewRound,
    ) -> impl Future<Output = Result<RoundRecord, PersistenceError>> + Send;
    fn load_round(
        &self,
        id: RoundId,
    ) -> impl Future<Output = Result<Option<RoundRecord>, PersistenceError>> + Send;
    /// Replace the strokes of the given holes. Holes not present on the card
    /// are added.
    fn update_holes(
        &self,
        id: RoundId,
        holes: &[HoleScore],
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    fn set_status(
        &self,
        id: RoundId,
        status: RoundStatus,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    /// Completed rounds of a player joined with their tee ratings, ordered by
    /// date then round id. A round whose stored holes cannot be decoded fails
    /// with [`PersistenceError::CorruptRound`].
    fn completed_rounds(
        &self,
        player: PlayerId,
    ) -> impl Future<Output = Result<Vec<RoundInput>, PersistenceError>> + Send;
}

/// Repository for the handicap snapshot history.
pub trait HistoryRepository: Send + Sync {
    /// All snapshots of a player ordered by effective date. On the same date
    /// manual entries come first, then rounds by id.
    fn load_history(
        &self,
        player: PlayerId,
    ) -> impl Future<Output = Result<Vec<HandicapSnapshot>, PersistenceError>> + Send;
    fn save_manual_entry(
        &self,
        snapshot: &HandicapSnapshot,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    /// Delete the player's round-sourced snapshots dated on or after `from`
    /// (all of them when `from` is `None`) and insert `snapshots`, in one
    /// transaction.
    fn replace_round_history(
        &self,
        player: PlayerId,
        from: Option<NaiveDate>,
        snapshots: &[HandicapSnapshot],
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
}
