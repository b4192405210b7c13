//! Timeline replay: a left-to-right fold over a player's rounds.
//!
//! Each round is adjusted against the course handicap implied by the index
//! *before* it, so the timeline is a causal chain. The only state carried from
//! one round to the next is a [`ReplayState`]: the prior index and the
//! differential history. Replaying from scratch and resuming a saved state
//! over the remaining rounds produce identical snapshots.

use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::differential::differential_for;
use crate::error::HandicapError;
use crate::esc::{apply_esc, gross_score, CourseHandicap};
use crate::exceptional::detect_exceptional_score;
use crate::projector::course_handicap;
use crate::rounding::round1;
use crate::selector::{selection_rule, RollingWindow};
use crate::snapshot::{HandicapSnapshot, RoundCalculation, ScoreDifferentialRecord, SnapshotSource};
use crate::types::{PlayerId, RoundId, RoundInput};

/// A round in the sequence could not be scored. The whole replay is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimelineError {
    #[error("timeline corrupt at round {round_id} ({date}): {source}")]
    Corruption {
        round_id: RoundId,
        date: NaiveDate,
        source: HandicapError,
    },
}

impl TimelineError {
    pub fn round_id(&self) -> RoundId {
        match self {
            Self::Corruption { round_id, .. } => *round_id,
        }
    }
}

/// Scan state carried between rounds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplayState {
    prior_index: Option<f64>,
    history: Vec<ScoreDifferentialRecord>,
}

impl ReplayState {
    /// Fresh state before a player's first round.
    pub fn seeded(seed: Option<f64>) -> Self {
        Self {
            prior_index: seed,
            history: Vec::new(),
        }
    }

    /// Rebuild the state reached after `prefix`, a chronological run of
    /// previously emitted round snapshots. Manual snapshots are ignored; the
    /// seed applies only until the first rated round.
    pub fn resume(seed: Option<f64>, prefix: &[HandicapSnapshot]) -> Self {
        let mut state = Self::seeded(seed);
        for snapshot in prefix {
            let Some(record) = snapshot.differential_record() else {
                continue;
            };
            state.history.push(record);
            if let Some(index) = snapshot.carried_index() {
                state.prior_index = Some(index);
            }
        }
        state
    }

    pub fn prior_index(&self) -> Option<f64> {
        self.prior_index
    }

    /// Differential records so far, oldest first.
    pub fn history(&self) -> &[ScoreDifferentialRecord] {
        &self.history
    }

    pub fn window(&self) -> RollingWindow {
        RollingWindow::from_chronological(&self.history)
    }

    /// Score one round and advance the state.
    ///
    /// On error the state is left untouched.
    pub fn step(
        &mut self,
        player_id: PlayerId,
        round: &RoundInput,
        config: &EngineConfig,
    ) -> Result<HandicapSnapshot, HandicapError> {
        let tee = &round.tee;
        let ch = self
            .prior_index
            .map(|index| course_handicap(index, tee.slope_rating));

        let gross = gross_score(&round.holes)?;
        let adjusted = apply_esc(
            &round.holes,
            CourseHandicap::from(ch),
            config.unknown_handicap,
        )?;
        let is_nine_hole = round.is_nine_hole();
        let differential =
            differential_for(adjusted, tee.course_rating, tee.slope_rating, is_nine_hole)?;

        self.history.push(ScoreDifferentialRecord {
            date: round.date_played,
            round_id: round.round_id,
            gross_score: gross,
            adjusted_gross_score: adjusted,
            course_rating: tee.course_rating,
            slope_rating: tee.slope_rating,
            differential,
            is_nine_hole,
        });

        let window = self.window();
        let differentials_counted = selection_rule(window.len()).map_or(0, |r| r.count_used);
        let mut rated_index = window.handicap_index();

        let mut exceptional_reduction = None;
        if config.exceptional_scores {
            if let (Some(prior), Some(index)) = (self.prior_index, rated_index) {
                if let Some(hit) = detect_exceptional_score(differential, prior) {
                    exceptional_reduction = Some(hit.reduction);
                    rated_index = Some(round1(index - hit.reduction));
                }
            }
        }

        if rated_index.is_some() {
            self.prior_index = rated_index;
        }

        Ok(HandicapSnapshot {
            player_id,
            effective_date: round.date_played,
            handicap_index: rated_index.unwrap_or(differential),
            source: SnapshotSource::FromRound(RoundCalculation {
                round_id: round.round_id,
                differential,
                gross_score: gross,
                adjusted_gross_score: adjusted,
                course_rating: tee.course_rating,
                slope_rating: tee.slope_rating,
                is_nine_hole,
                course_handicap: ch,
                rated_index,
                differentials_counted: differentials_counted as u8,
                exceptional_reduction,
                settings: config.replay_settings(),
            }),
        })
    }
}

/// Result of a replay.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    /// Snapshots emitted by this replay, in date order.
    pub snapshots: Vec<HandicapSnapshot>,
    /// State after the last round.
    pub state: ReplayState,
}

impl Timeline {
    pub fn current_index(&self) -> Option<f64> {
        self.state.prior_index()
    }
}

/// Scored rounds in replay order: by date, then by round id.
pub fn order_rounds(rounds: &[RoundInput]) -> Vec<RoundInput> {
    let mut ordered: Vec<RoundInput> = rounds.iter().filter(|r| r.is_scored()).cloned().collect();
    ordered.sort_by_key(RoundInput::order_key);
    ordered
}

/// The prior index for a player's first round.
///
/// Uses the latest manual snapshot effective on or before `first_round`
/// (any manual snapshot when there are no rounds), else `default`.
pub fn select_seed(
    manual: &[HandicapSnapshot],
    first_round: Option<NaiveDate>,
    default: Option<f64>,
) -> Option<f64> {
    manual
        .iter()
        .filter(|s| s.is_manual())
        .filter(|s| first_round.map_or(true, |d| s.effective_date <= d))
        .max_by_key(|s| s.effective_date)
        .map(|s| s.handicap_index)
        .or(default)
}

/// Continue a replay from `state` over `rounds`.
///
/// `rounds` must all be dated on or after the last round folded into
/// `state`; they are ordered and filtered here. No snapshot is returned unless
/// every round scores.
pub fn replay_from(
    player_id: PlayerId,
    mut state: ReplayState,
    rounds: &[RoundInput],
    config: &EngineConfig,
) -> Result<Timeline, TimelineError> {
    let ordered = order_rounds(rounds);
    let mut snapshots = Vec::with_capacity(ordered.len());
    for round in &ordered {
        let snapshot =
            state
                .step(player_id, round, config)
                .map_err(|source| TimelineError::Corruption {
                    round_id: round.round_id,
                    date: round.date_played,
                    source,
                })?;
        snapshots.push(snapshot);
    }
    Ok(Timeline { snapshots, state })
}

/// Replay every round of a player from scratch.
pub fn replay(
    player_id: PlayerId,
    rounds: &[RoundInput],
    manual: &[HandicapSnapshot],
    config: &EngineConfig,
) -> Result<Timeline, TimelineError> {
    let first_round = rounds
        .iter()
        .filter(|r| r.is_scored())
        .map(|r| r.date_played)
        .min();
    let seed = select_seed(manual, first_round, config.default_starting_index);
    replay_from(player_id, ReplayState::seeded(seed), rounds, config)
}
