//! Timeline recomputation for one player at a time.
//!
//! A recompute loads the player's completed rounds and manual entries,
//! replays them through the engine and swaps the round-sourced history in one
//! transaction. If any round cannot be scored nothing is written; the result
//! carries a diagnostic naming the round instead.
//!
//! Incremental recomputes resume from the persisted snapshots dated before a
//! given day. When those snapshots no longer line up with the stored rounds,
//! or were scored under other settings, the recompute widens to a full
//! rebuild.

mod types;
mod worker;

pub use types::{
    PlayerFailure, RebuildReport, RecomputeDiagnostic, RecomputeError, RecomputeScope,
    TimelineResult,
};
pub use worker::rebuild_all;

use chrono::NaiveDate;
use handicap::{
    course_handicap, order_rounds, replay, replay_from, select_seed, EngineConfig,
    HandicapSnapshot, PlayerId, ReplayState, RoundInput,
};

use crate::locks::PlayerLocks;
use crate::persistence::{
    HistoryRepository, Persistence, PersistenceError, PlayerRepository, Repositories,
    RoundRepository,
};

/// Rebuilds players' handicap histories.
pub struct RecomputeService<D: Persistence> {
    repos: Repositories<D>,
    locks: PlayerLocks,
    config: EngineConfig,
}

impl<D: Persistence> RecomputeService<D> {
    pub fn new(repos: Repositories<D>, config: EngineConfig) -> Self {
        Self {
            repos,
            locks: PlayerLocks::new(),
            config,
        }
    }

    pub fn repositories(&self) -> &Repositories<D> {
        &self.repos
    }

    pub fn locks(&self) -> &PlayerLocks {
        &self.locks
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replay every round of `player` and replace the whole round history.
    pub async fn recompute_player_timeline(
        &self,
        player: PlayerId,
    ) -> Result<TimelineResult, RecomputeError> {
        let _guard = self.locks.acquire(player).await;
        self.recompute_locked(player, RecomputeScope::Full).await
    }

    /// Replay only the rounds dated on or after `from`.
    pub async fn recompute_from(
        &self,
        player: PlayerId,
        from: NaiveDate,
    ) -> Result<TimelineResult, RecomputeError> {
        let _guard = self.locks.acquire(player).await;
        self.recompute_locked(player, RecomputeScope::From(from)).await
    }

    /// Recompute while the caller already holds the player's lock.
    pub(crate) async fn recompute_locked(
        &self,
        player: PlayerId,
        scope: RecomputeScope,
    ) -> Result<TimelineResult, RecomputeError> {
        if self.repos.players.load_player(player).await?.is_none() {
            return Err(RecomputeError::PlayerNotFound(player));
        }

        let history = self.repos.history.load_history(player).await?;
        let rounds = match self.repos.rounds.completed_rounds(player).await {
            Ok(rounds) => rounds,
            Err(PersistenceError::CorruptRound {
                round_id,
                date,
                reason,
            }) => {
                let diagnostic = RecomputeDiagnostic {
                    round_id,
                    date,
                    message: format!("timeline corrupt at round {round_id} ({date}): {reason}"),
                };
                tracing::warn!(
                    player_id = %player,
                    round_id = %round_id,
                    "Recompute aborted, history left unchanged: {}",
                    diagnostic.message
                );
                return Ok(TimelineResult {
                    player_id: player,
                    snapshots: history,
                    errors: vec![diagnostic],
                    rounds_replayed: 0,
                });
            }
            Err(e) => return Err(e.into()),
        };
        let manual: Vec<HandicapSnapshot> =
            history.iter().filter(|s| s.is_manual()).cloned().collect();

        let first_round = rounds
            .iter()
            .filter(|r| r.is_scored())
            .map(|r| r.date_played)
            .min();
        let seed = select_seed(&manual, first_round, self.config.default_starting_index);

        let resume = match scope {
            RecomputeScope::Full => None,
            RecomputeScope::From(date) => {
                resumable_prefix(&history, &rounds, date, seed, &self.config)
                    .map(|prefix| (date, prefix))
            }
        };
        if resume.is_none() && scope != RecomputeScope::Full {
            tracing::debug!(
                player_id = %player,
                "Stored history does not match rounds, rebuilding in full"
            );
        }

        let (from, replayed) = match resume {
            Some((date, prefix)) => {
                let state = ReplayState::resume(seed, &prefix);
                let tail: Vec<RoundInput> = rounds
                    .iter()
                    .filter(|r| r.date_played >= date)
                    .cloned()
                    .collect();
                (Some(date), replay_from(player, state, &tail, &self.config))
            }
            None => (None, replay(player, &rounds, &manual, &self.config)),
        };

        let timeline = match replayed {
            Ok(timeline) => timeline,
            Err(e) => {
                tracing::warn!(
                    player_id = %player,
                    round_id = %e.round_id(),
                    "Recompute aborted, history left unchanged: {}",
                    e
                );
                return Ok(TimelineResult {
                    player_id: player,
                    snapshots: history,
                    errors: vec![(&e).into()],
                    rounds_replayed: 0,
                });
            }
        };

        self.repos
            .history
            .replace_round_history(player, from, &timeline.snapshots)
            .await?;
        let snapshots = self.repos.history.load_history(player).await?;

        tracing::info!(
            player_id = %player,
            from = ?from,
            rounds = timeline.snapshots.len(),
            index = ?timeline.current_index(),
            "Recomputed handicap timeline"
        );

        Ok(TimelineResult {
            player_id: player,
            snapshots,
            errors: Vec::new(),
            rounds_replayed: timeline.snapshots.len(),
        })
    }
}

/// The stored round snapshots dated before `date`, if they are exactly the
/// snapshots a full replay would produce for the rounds before `date`.
///
/// Checked: the round sequence, the scoring settings each snapshot was
/// produced under, and the course handicap each round was adjusted against
/// given the seed and the indexes carried before it. Stroke edits are not
/// detected here; a change to an earlier round's strokes must be recomputed
/// from that round's date.
fn resumable_prefix(
    history: &[HandicapSnapshot],
    rounds: &[RoundInput],
    date: NaiveDate,
    seed: Option<f64>,
    config: &EngineConfig,
) -> Option<Vec<HandicapSnapshot>> {
    let prefix: Vec<HandicapSnapshot> = history
        .iter()
        .filter(|s| !s.is_manual() && s.effective_date < date)
        .cloned()
        .collect();

    let before: Vec<RoundInput> = rounds
        .iter()
        .filter(|r| r.date_played < date)
        .cloned()
        .collect();
    let expected = order_rounds(&before);

    if prefix.is_empty() || prefix.len() != expected.len() {
        return None;
    }
    let ids_match = prefix
        .iter()
        .zip(&expected)
        .all(|(s, r)| s.round_id() == Some(r.round_id));
    if !ids_match {
        return None;
    }

    let settings = config.replay_settings();
    let mut prior = seed;
    for snapshot in &prefix {
        let calc = snapshot.calculation()?;
        if calc.settings != settings {
            return None;
        }
        let expected_ch = prior.map(|index| course_handicap(index, calc.slope_rating));
        if calc.course_handicap != expected_ch {
            return None;
        }
        if let Some(index) = snapshot.carried_index() {
            prior = Some(index);
        }
    }
    Some(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use handicap::{HoleScore, RoundId, SnapshotSource, TeeRating, UnknownHandicapPolicy};

    const PARS: [u8; 18] = [4, 4, 3, 5, 4, 4, 3, 4, 5, 4, 4, 3, 5, 4, 4, 3, 4, 5];
    const PLAYER: PlayerId = PlayerId(1);

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, d).unwrap()
    }

    fn round(id: i64, d: u32) -> RoundInput {
        RoundInput {
            round_id: RoundId(id),
            date_played: day(d),
            holes: HoleScore::card(&PARS, &[5; 18]),
            tee: TeeRating::new(72.0, 113.0, 72),
        }
    }

    fn config(seed: Option<f64>) -> EngineConfig {
        EngineConfig {
            default_starting_index: seed,
            ..EngineConfig::default()
        }
    }

    fn full(rounds: &[RoundInput], seed: Option<f64>) -> Vec<HandicapSnapshot> {
        replay(PLAYER, rounds, &[], &config(seed)).unwrap().snapshots
    }

    fn prefix_for(
        history: &[HandicapSnapshot],
        rounds: &[RoundInput],
        date: NaiveDate,
        seed: Option<f64>,
    ) -> Option<Vec<HandicapSnapshot>> {
        resumable_prefix(history, rounds, date, seed, &config(seed))
    }

    #[test]
    fn test_prefix_found_when_history_matches() {
        let rounds = [round(1, 1), round(2, 2), round(3, 3)];
        let history = full(&rounds, Some(10.0));
        let prefix = prefix_for(&history, &rounds, day(3), Some(10.0)).unwrap();
        assert_eq!(prefix, history[..2].to_vec());
    }

    #[test]
    fn test_missing_round_in_history_forces_full() {
        let rounds = [round(1, 1), round(2, 2), round(3, 3)];
        let history = full(&rounds[1..], None);
        assert!(prefix_for(&history, &rounds, day(3), None).is_none());
    }

    #[test]
    fn test_changed_seed_forces_full() {
        let rounds = [round(1, 1), round(2, 2)];
        let history = full(&rounds, Some(10.0));
        assert!(prefix_for(&history, &rounds, day(2), Some(25.0)).is_none());
        assert!(prefix_for(&history, &rounds, day(2), None).is_none());
    }

    #[test]
    fn test_changed_scoring_settings_force_full() {
        let rounds = [round(1, 1), round(2, 2), round(3, 3)];
        let history = full(&rounds, None);

        let strictest = EngineConfig {
            unknown_handicap: UnknownHandicapPolicy::Strictest,
            ..EngineConfig::default()
        };
        assert!(resumable_prefix(&history, &rounds, day(3), None, &strictest).is_none());

        let exceptional = EngineConfig {
            exceptional_scores: true,
            ..EngineConfig::default()
        };
        assert!(resumable_prefix(&history, &rounds, day(3), None, &exceptional).is_none());

        let unchanged = EngineConfig::default();
        assert!(resumable_prefix(&history, &rounds, day(3), None, &unchanged).is_some());
    }

    #[test]
    fn test_inconsistent_course_handicap_after_seed_forces_full() {
        let rounds = [round(1, 1), round(2, 2), round(3, 3), round(4, 4), round(5, 5)];
        let mut history = full(&rounds, Some(10.0));
        assert!(prefix_for(&history, &rounds, day(5), Some(10.0)).is_some());

        if let SnapshotSource::FromRound(calc) = &mut history[3].source {
            calc.course_handicap = Some(30);
        }
        assert!(prefix_for(&history, &rounds, day(5), Some(10.0)).is_none());
    }

    #[test]
    fn test_empty_prefix_forces_full() {
        let rounds = [round(1, 5)];
        let history = full(&rounds, None);
        assert!(prefix_for(&history, &rounds, day(1), None).is_none());
    }

    #[test]
    fn test_manual_entries_are_not_part_of_the_prefix() {
        let rounds = [round(1, 2), round(2, 4)];
        let mut history = vec![HandicapSnapshot::manual(PLAYER, day(1), 12.0)];
        history.extend(full(&rounds, Some(12.0)));
        let prefix = prefix_for(&history, &rounds, day(3), Some(12.0)).unwrap();
        assert_eq!(prefix.len(), 1);
        assert!(!prefix[0].is_manual());
    }
}
