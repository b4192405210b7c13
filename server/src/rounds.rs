//! Round lifecycle: scoring, completion, edits and back-dated posts.
//!
//! Every mutation of a completed round recomputes the player's timeline
//! while still holding the player's lock, so a concurrent edit cannot slip in
//! between the write and the replay.

use std::sync::Arc;

use chrono::NaiveDate;
use handicap::{HandicapSnapshot, HoleScore, PlayerId, RoundId, MAX_HANDICAP_INDEX, MAX_HOLES};

use crate::persistence::{
    HistoryRepository, NewRound, Persistence, PersistenceError, PlayerRepository, RoundRecord,
    RoundRepository, RoundStatus, TeeSetId, TeeSetRepository,
};
use crate::recompute::{RecomputeError, RecomputeScope, RecomputeService, TimelineResult};

#[derive(Debug, thiserror::Error)]
pub enum RoundError {
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),
    #[error("tee set {0} not found")]
    TeeSetNotFound(TeeSetId),
    #[error("round {0} not found")]
    RoundNotFound(RoundId),
    #[error("round {0} is already completed")]
    RoundCompleted(RoundId),
    #[error("round {0} is not completed")]
    RoundNotCompleted(RoundId),
    #[error("round {round_id} has no hole {hole_number}")]
    HoleNotOnCard { round_id: RoundId, hole_number: u8 },
    #[error("round {round_id} is missing scores for holes {missing:?}")]
    IncompleteCard { round_id: RoundId, missing: Vec<u8> },
    #[error("invalid card: {0}")]
    InvalidCard(String),
    #[error("invalid handicap index {0}")]
    InvalidIndex(f64),
    #[error(transparent)]
    Recompute(#[from] RecomputeError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Mutations of a player's rounds and manual entries.
pub struct RoundService<D: Persistence> {
    recompute: Arc<RecomputeService<D>>,
}

impl<D: Persistence> Clone for RoundService<D> {
    fn clone(&self) -> Self {
        Self {
            recompute: self.recompute.clone(),
        }
    }
}

impl<D: Persistence> RoundService<D> {
    pub fn new(recompute: Arc<RecomputeService<D>>) -> Self {
        Self { recompute }
    }

    /// Open a new in-progress round with an empty card.
    pub async fn start_round(
        &self,
        player: PlayerId,
        tee: TeeSetId,
        date_played: NaiveDate,
        pars: &[u8],
    ) -> Result<RoundRecord, RoundError> {
        if pars.len() > MAX_HOLES {
            return Err(RoundError::InvalidCard(format!(
                "{} holes, at most {MAX_HOLES} allowed",
                pars.len()
            )));
        }
        self.check_player_and_tee(player, tee).await?;
        let holes: Vec<HoleScore> = (1..=u8::MAX)
            .zip(pars)
            .map(|(n, &par)| HoleScore::new(n, par, None))
            .collect();
        validate_card(&holes, false)?;

        let round = self
            .repos()
            .rounds
            .insert_round(&NewRound {
                player_id: player,
                tee_id: tee,
                date_played,
                status: RoundStatus::InProgress,
                holes,
            })
            .await?;
        tracing::info!(player_id = %player, round_id = %round.round_id, "Round started");
        Ok(round)
    }

    /// Record strokes for one hole of an in-progress round.
    pub async fn record_hole_score(
        &self,
        round_id: RoundId,
        hole_number: u8,
        strokes: u8,
    ) -> Result<RoundRecord, RoundError> {
        let round = self.load_round(round_id).await?;
        if round.status == RoundStatus::Completed {
            return Err(RoundError::RoundCompleted(round_id));
        }
        let hole = card_hole(&round, hole_number)?;
        if strokes == 0 {
            return Err(RoundError::InvalidCard(format!(
                "hole {hole_number} needs at least one stroke"
            )));
        }

        self.repos()
            .rounds
            .update_holes(round_id, &[HoleScore::new(hole_number, hole.par, Some(strokes))])
            .await?;
        tracing::debug!(round_id = %round_id, hole_number, strokes, "Hole score recorded");
        self.load_round(round_id).await
    }

    /// Mark a fully scored round completed and fold it into the timeline.
    pub async fn complete_round(&self, round_id: RoundId) -> Result<TimelineResult, RoundError> {
        let player = self.load_round(round_id).await?.player_id;
        let _guard = self.recompute.locks().acquire(player).await;

        let round = self.load_round(round_id).await?;
        if round.status == RoundStatus::Completed {
            return Err(RoundError::RoundCompleted(round_id));
        }
        let missing = round.missing_holes();
        if !missing.is_empty() {
            return Err(RoundError::IncompleteCard { round_id, missing });
        }

        self.repos()
            .rounds
            .set_status(round_id, RoundStatus::Completed)
            .await?;
        tracing::info!(player_id = %player, round_id = %round_id, "Round completed");
        Ok(self
            .recompute
            .recompute_locked(player, RecomputeScope::From(round.date_played))
            .await?)
    }

    /// Change posted strokes on a completed round and replay from its date.
    pub async fn edit_completed_round(
        &self,
        round_id: RoundId,
        holes: &[HoleScore],
    ) -> Result<TimelineResult, RoundError> {
        let player = self.load_round(round_id).await?.player_id;
        let _guard = self.recompute.locks().acquire(player).await;

        let round = self.load_round(round_id).await?;
        if round.status != RoundStatus::Completed {
            return Err(RoundError::RoundNotCompleted(round_id));
        }
        for edit in holes {
            let hole = card_hole(&round, edit.hole_number)?;
            if edit.par != hole.par {
                return Err(RoundError::InvalidCard(format!(
                    "hole {} is a par {}, not {}",
                    edit.hole_number, hole.par, edit.par
                )));
            }
        }
        validate_card(holes, true)?;

        self.repos().rounds.update_holes(round_id, holes).await?;
        tracing::info!(
            player_id = %player,
            round_id = %round_id,
            holes = holes.len(),
            "Completed round edited"
        );
        Ok(self
            .recompute
            .recompute_locked(player, RecomputeScope::From(round.date_played))
            .await?)
    }

    /// Post a finished round, possibly dated before rounds already posted.
    pub async fn post_completed_round(
        &self,
        player: PlayerId,
        tee: TeeSetId,
        date_played: NaiveDate,
        holes: Vec<HoleScore>,
    ) -> Result<(RoundRecord, TimelineResult), RoundError> {
        self.check_player_and_tee(player, tee).await?;
        validate_card(&holes, true)?;
        let _guard = self.recompute.locks().acquire(player).await;

        let round = self
            .repos()
            .rounds
            .insert_round(&NewRound {
                player_id: player,
                tee_id: tee,
                date_played,
                status: RoundStatus::Completed,
                holes,
            })
            .await?;
        tracing::info!(
            player_id = %player,
            round_id = %round.round_id,
            date = %date_played,
            "Completed round posted"
        );
        let result = self
            .recompute
            .recompute_locked(player, RecomputeScope::From(date_played))
            .await?;
        Ok((round, result))
    }

    /// Record a manually assigned index. The whole timeline is replayed since
    /// the entry may change the seed of the first round.
    pub async fn add_manual_entry(
        &self,
        player: PlayerId,
        effective_date: NaiveDate,
        index: f64,
    ) -> Result<TimelineResult, RoundError> {
        if !index.is_finite() || index > MAX_HANDICAP_INDEX {
            return Err(RoundError::InvalidIndex(index));
        }
        if self.repos().players.load_player(player).await?.is_none() {
            return Err(RoundError::PlayerNotFound(player));
        }
        let _guard = self.recompute.locks().acquire(player).await;

        self.repos()
            .history
            .save_manual_entry(&HandicapSnapshot::manual(player, effective_date, index))
            .await?;
        tracing::info!(player_id = %player, index, date = %effective_date, "Manual index recorded");
        Ok(self
            .recompute
            .recompute_locked(player, RecomputeScope::Full)
            .await?)
    }

    fn repos(&self) -> &crate::persistence::Repositories<D> {
        self.recompute.repositories()
    }

    async fn load_round(&self, round_id: RoundId) -> Result<RoundRecord, RoundError> {
        self.repos()
            .rounds
            .load_round(round_id)
            .await?
            .ok_or(RoundError::RoundNotFound(round_id))
    }

    async fn check_player_and_tee(&self, player: PlayerId, tee: TeeSetId) -> Result<(), RoundError> {
        if self.repos().players.load_player(player).await?.is_none() {
            return Err(RoundError::PlayerNotFound(player));
        }
        if self.repos().tees.load_tee_set(tee).await?.is_none() {
            return Err(RoundError::TeeSetNotFound(tee));
        }
        Ok(())
    }
}

fn card_hole(round: &RoundRecord, hole_number: u8) -> Result<HoleScore, RoundError> {
    round
        .holes
        .iter()
        .find(|h| h.hole_number == hole_number)
        .copied()
        .ok_or(RoundError::HoleNotOnCard {
            round_id: round.round_id,
            hole_number,
        })
}

/// Pars must be positive and hole numbers unique. With `scored`, every hole
/// needs a positive stroke count.
fn validate_card(holes: &[HoleScore], scored: bool) -> Result<(), RoundError> {
    if holes.is_empty() {
        return Err(RoundError::InvalidCard("no holes".into()));
    }
    if holes.len() > MAX_HOLES {
        return Err(RoundError::InvalidCard(format!(
            "{} holes, at most {MAX_HOLES} allowed",
            holes.len()
        )));
    }
    let mut seen = std::collections::HashSet::new();
    for hole in holes {
        if hole.hole_number == 0 || !seen.insert(hole.hole_number) {
            return Err(RoundError::InvalidCard(format!(
                "bad or repeated hole number {}",
                hole.hole_number
            )));
        }
        if hole.par == 0 {
            return Err(RoundError::InvalidCard(format!(
                "hole {} has par 0",
                hole.hole_number
            )));
        }
        if scored && !matches!(hole.strokes, Some(s) if s > 0) {
            return Err(RoundError::InvalidCard(format!(
                "hole {} has no score",
                hole.hole_number
            )));
        }
    }
    Ok(())
}
