//! Read-only handicap queries over the persisted history.

use std::fmt;

use chrono::NaiveDate;
use handicap::{
    format_index, HandicapSnapshot, PlayerId, Projection, RollingWindow,
    ScoreDifferentialRecord, MIN_DIFFERENTIALS,
};
use serde::Serialize;

use crate::persistence::{
    HistoryRepository, Persistence, PersistenceError, PlayerRepository, Repositories, TeeSetId,
    TeeSetRecord, TeeSetRepository,
};

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),
    #[error("tee set {0} not found")]
    TeeSetNotFound(TeeSetId),
    #[error(
        "no handicap index yet: {posted} round(s) posted, at least {required} are needed"
    )]
    InsufficientRounds { posted: usize, required: usize },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Where the current index comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IndexSource {
    Rated,
    Manual,
    /// Not enough rounds and no manual entry.
    Insufficient,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentHandicap {
    pub player_id: PlayerId,
    pub index: Option<f64>,
    pub as_of: Option<NaiveDate>,
    pub rounds_posted: usize,
    pub source: IndexSource,
}

impl CurrentHandicap {
    fn from_history(player_id: PlayerId, history: &[HandicapSnapshot]) -> Self {
        let rounds_posted = history.iter().filter(|s| !s.is_manual()).count();
        let latest = history
            .iter()
            .rev()
            .find_map(|s| s.carried_index().map(|index| (s, index)));
        match latest {
            Some((snapshot, index)) => Self {
                player_id,
                index: Some(index),
                as_of: Some(snapshot.effective_date),
                rounds_posted,
                source: if snapshot.is_manual() {
                    IndexSource::Manual
                } else {
                    IndexSource::Rated
                },
            },
            None => Self {
                player_id,
                index: None,
                as_of: None,
                rounds_posted,
                source: IndexSource::Insufficient,
            },
        }
    }

    /// `12.4`, `+1.2` or `N/A`.
    pub fn display_index(&self) -> String {
        format_index(self.index)
    }
}

impl fmt::Display for CurrentHandicap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.source, self.as_of) {
            (IndexSource::Insufficient, _) | (_, None) => write!(
                f,
                "N/A (insufficient rounds: {} of {})",
                self.rounds_posted, MIN_DIFFERENTIALS
            ),
            (IndexSource::Manual, Some(date)) => {
                write!(f, "{} (manual, as of {date})", self.display_index())
            }
            (IndexSource::Rated, Some(date)) => write!(f, "{} (as of {date})", self.display_index()),
        }
    }
}

/// One posted differential and whether it is among those averaged into the
/// current index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifferentialDetail {
    pub record: ScoreDifferentialRecord,
    pub counts_toward_index: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeeProjection {
    pub tee: TeeSetRecord,
    pub index: f64,
    pub course_handicap: i32,
    pub playing_handicap: i32,
}

pub struct HandicapQueries<D: Persistence> {
    repos: Repositories<D>,
}

impl<D: Persistence> HandicapQueries<D> {
    pub fn new(repos: Repositories<D>) -> Self {
        Self { repos }
    }

    pub async fn current_index(&self, player: PlayerId) -> Result<CurrentHandicap, QueryError> {
        let history = self.history(player).await?;
        Ok(CurrentHandicap::from_history(player, &history))
    }

    /// The `n` most recent differentials, newest first.
    pub async fn recent_differentials(
        &self,
        player: PlayerId,
        n: usize,
    ) -> Result<Vec<DifferentialDetail>, QueryError> {
        let history = self.history(player).await?;
        let records: Vec<ScoreDifferentialRecord> = history
            .iter()
            .filter_map(HandicapSnapshot::differential_record)
            .collect();
        let counting = RollingWindow::from_chronological(&records).counting_positions();

        Ok(records
            .into_iter()
            .rev()
            .take(n)
            .enumerate()
            .map(|(position, record)| DifferentialDetail {
                record,
                counts_toward_index: counting.contains(&position),
            })
            .collect())
    }

    /// Course and playing handicap for `tee` from the current index.
    pub async fn projected_handicap(
        &self,
        player: PlayerId,
        tee: TeeSetId,
    ) -> Result<TeeProjection, QueryError> {
        let current = self.current_index(player).await?;
        let tee = self
            .repos
            .tees
            .load_tee_set(tee)
            .await?
            .ok_or(QueryError::TeeSetNotFound(tee))?;
        let index = current.index.ok_or(QueryError::InsufficientRounds {
            posted: current.rounds_posted,
            required: MIN_DIFFERENTIALS,
        })?;

        let projection = Projection::for_tee(index, &tee.rating());
        Ok(TeeProjection {
            tee,
            index,
            course_handicap: projection.course_handicap,
            playing_handicap: projection.playing_handicap,
        })
    }

    async fn history(&self, player: PlayerId) -> Result<Vec<HandicapSnapshot>, QueryError> {
        if self.repos.players.load_player(player).await?.is_none() {
            return Err(QueryError::PlayerNotFound(player));
        }
        Ok(self.repos.history.load_history(player).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sqlite::{Database, SqliteBackend};
    use crate::persistence::NewTeeSet;
    use crate::recompute::RecomputeService;
    use crate::rounds::RoundService;
    use handicap::{EngineConfig, HoleScore};
    use std::sync::Arc;

    const PARS: [u8; 18] = [4, 4, 3, 5, 4, 4, 3, 4, 5, 4, 4, 3, 5, 4, 4, 3, 4, 5];

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, d).unwrap()
    }

    fn scored(over: usize) -> Vec<HoleScore> {
        let strokes: Vec<u8> = PARS
            .iter()
            .enumerate()
            .map(|(i, &p)| p + u8::from(i < over))
            .collect();
        HoleScore::card(&PARS, &strokes)
    }

    struct Setup {
        _db: Database,
        rounds: RoundService<SqliteBackend>,
        queries: HandicapQueries<SqliteBackend>,
        player: PlayerId,
        home: TeeSetId,
        away: TeeSetId,
    }

    async fn setup() -> Setup {
        let db = Database::new_in_memory().await.unwrap();
        let repos = db.repositories();
        let player = repos.players.create_player("Ada").await.unwrap().player_id;
        let home = repos
            .tees
            .create_tee_set(&NewTeeSet {
                course_name: "Muni".into(),
                tee_name: "White".into(),
                course_rating: 72.0,
                slope_rating: 113.0,
                par: 72,
            })
            .await
            .unwrap()
            .tee_id;
        let away = repos
            .tees
            .create_tee_set(&NewTeeSet {
                course_name: "Oak Hill".into(),
                tee_name: "Blue".into(),
                course_rating: 72.3,
                slope_rating: 138.0,
                par: 72,
            })
            .await
            .unwrap()
            .tee_id;
        let recompute = Arc::new(RecomputeService::new(repos.clone(), EngineConfig::default()));
        Setup {
            _db: db,
            rounds: RoundService::new(recompute),
            queries: HandicapQueries::new(repos),
            player,
            home,
            away,
        }
    }

    async fn post(s: &Setup, d: u32, over: usize) {
        s.rounds
            .post_completed_round(s.player, s.home, day(d), scored(over))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insufficient_rounds_is_na() {
        let s = setup().await;
        post(&s, 1, 10).await;
        post(&s, 2, 11).await;

        let current = s.queries.current_index(s.player).await.unwrap();
        assert_eq!(current.index, None);
        assert_eq!(current.source, IndexSource::Insufficient);
        assert_eq!(current.rounds_posted, 2);
        assert_eq!(current.display_index(), "N/A");
        assert_eq!(current.to_string(), "N/A (insufficient rounds: 2 of 3)");

        let err = s.queries.projected_handicap(s.player, s.away).await.unwrap_err();
        assert!(matches!(
            err,
            QueryError::InsufficientRounds {
                posted: 2,
                required: 3
            }
        ));
        assert!(err.to_string().contains("at least 3"));
    }

    #[tokio::test]
    async fn test_rated_index_and_projection() {
        let s = setup().await;
        // Seven differentials: the two lowest (12.0 and 13.0) average 12.5.
        for (d, over) in [(1, 14), (2, 12), (3, 16), (4, 13), (5, 15), (6, 17), (7, 18)] {
            post(&s, d, over).await;
        }

        let current = s.queries.current_index(s.player).await.unwrap();
        assert_eq!(current.index, Some(12.5));
        assert_eq!(current.source, IndexSource::Rated);
        assert_eq!(current.as_of, Some(day(7)));
        assert_eq!(current.to_string(), "12.5 (as of 2024-10-07)");

        let projection = s.queries.projected_handicap(s.player, s.away).await.unwrap();
        assert_eq!(projection.course_handicap, 15);
        assert_eq!(projection.playing_handicap, 15);
        assert_eq!(projection.tee.course_name, "Oak Hill");
    }

    #[tokio::test]
    async fn test_recent_differentials_mark_counting_rounds() {
        let s = setup().await;
        for (d, over) in [(1, 12), (2, 8), (3, 15), (4, 8), (5, 18), (6, 11)] {
            post(&s, d, over).await;
        }

        let recent = s.queries.recent_differentials(s.player, 4).await.unwrap();
        let values: Vec<(f64, bool)> = recent
            .iter()
            .map(|d| (d.record.differential, d.counts_toward_index))
            .collect();
        // Newest first; the two lowest of the window are the 8.0s.
        assert_eq!(
            values,
            vec![(11.0, false), (18.0, false), (8.0, true), (15.0, false)]
        );

        let all = s.queries.recent_differentials(s.player, 50).await.unwrap();
        assert_eq!(all.len(), 6);
        assert_eq!(all.iter().filter(|d| d.counts_toward_index).count(), 2);
    }

    #[tokio::test]
    async fn test_manual_index_is_current_until_rated() {
        let s = setup().await;
        s.rounds.add_manual_entry(s.player, day(1), -1.4).await.unwrap();
        post(&s, 2, 6).await;

        let current = s.queries.current_index(s.player).await.unwrap();
        assert_eq!(current.source, IndexSource::Manual);
        assert_eq!(current.display_index(), "+1.4");
        assert_eq!(current.rounds_posted, 1);

        let projection = s.queries.projected_handicap(s.player, s.home).await.unwrap();
        assert_eq!(projection.course_handicap, -1);
    }

    #[tokio::test]
    async fn test_unknown_player_and_tee() {
        let s = setup().await;
        assert!(matches!(
            s.queries.current_index(PlayerId(500)).await.unwrap_err(),
            QueryError::PlayerNotFound(_)
        ));
        assert!(matches!(
            s.queries
                .projected_handicap(s.player, TeeSetId(500))
                .await
                .unwrap_err(),
            QueryError::TeeSetNotFound(_)
        ));
    }
}
