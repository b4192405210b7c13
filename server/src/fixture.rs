//! JSON fixture import: tee sets, players, their rounds and manual entries.
//!
//! ```json
//! {
//!   "tee_sets": [
//!     { "key": "oak-blue", "course_name": "Oak Hill", "tee_name": "Blue",
//!       "course_rating": 72.3, "slope_rating": 138.0, "par": 72 }
//!   ],
//!   "players": [
//!     { "name": "Ada",
//!       "manual_entries": [ { "date": "2024-03-01", "index": 18.2 } ],
//!       "rounds": [ { "tee": "oak-blue", "date": "2024-03-09",
//!                     "pars": [4, 4, 3], "strokes": [5, null, 3],
//!                     "completed": false } ] }
//!   ]
//! }
//! ```
//!
//! Every imported player is recomputed once after all their data is written.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use handicap::{HandicapSnapshot, HoleScore, PlayerId, MAX_HOLES};
use serde::{Deserialize, Serialize};

use crate::persistence::{
    HistoryRepository, NewRound, NewTeeSet, Persistence, PersistenceError, PlayerRepository,
    RoundRepository, RoundStatus, TeeSetId, TeeSetRepository,
};
use crate::recompute::{RecomputeError, RecomputeService, TimelineResult};

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read fixture: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid fixture: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("round of {player} on {date} references unknown tee set '{tee}'")]
    UnknownTee {
        player: String,
        date: NaiveDate,
        tee: String,
    },
    #[error("round of {player} on {date} has {pars} pars but {strokes} scores")]
    CardMismatch {
        player: String,
        date: NaiveDate,
        pars: usize,
        strokes: usize,
    },
    #[error("round of {player} on {date} has {holes} holes, at most {max} allowed")]
    TooManyHoles {
        player: String,
        date: NaiveDate,
        holes: usize,
        max: usize,
    },
    #[error("duplicate tee set key '{0}'")]
    DuplicateTee(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Recompute(#[from] RecomputeError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub tee_sets: Vec<FixtureTeeSet>,
    #[serde(default)]
    pub players: Vec<FixturePlayer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureTeeSet {
    /// Name rounds use to refer to this tee set.
    pub key: String,
    pub course_name: String,
    pub tee_name: String,
    pub course_rating: f64,
    pub slope_rating: f64,
    pub par: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixturePlayer {
    pub name: String,
    #[serde(default)]
    pub manual_entries: Vec<FixtureManualEntry>,
    #[serde(default)]
    pub rounds: Vec<FixtureRound>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureManualEntry {
    pub date: NaiveDate,
    pub index: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureRound {
    pub tee: String,
    pub date: NaiveDate,
    pub pars: Vec<u8>,
    pub strokes: Vec<Option<u8>>,
    #[serde(default = "completed_by_default")]
    pub completed: bool,
}

fn completed_by_default() -> bool {
    true
}

impl Fixture {
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, FixtureError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check tee references and card lengths before anything is written.
    fn validate(&self) -> Result<(), FixtureError> {
        let mut keys = std::collections::HashSet::new();
        for tee in &self.tee_sets {
            if !keys.insert(tee.key.as_str()) {
                return Err(FixtureError::DuplicateTee(tee.key.clone()));
            }
        }
        for player in &self.players {
            for round in &player.rounds {
                if !keys.contains(round.tee.as_str()) {
                    return Err(FixtureError::UnknownTee {
                        player: player.name.clone(),
                        date: round.date,
                        tee: round.tee.clone(),
                    });
                }
                if round.pars.len() > MAX_HOLES {
                    return Err(FixtureError::TooManyHoles {
                        player: player.name.clone(),
                        date: round.date,
                        holes: round.pars.len(),
                        max: MAX_HOLES,
                    });
                }
                if round.pars.len() != round.strokes.len() {
                    return Err(FixtureError::CardMismatch {
                        player: player.name.clone(),
                        date: round.date,
                        pars: round.pars.len(),
                        strokes: round.strokes.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl FixtureRound {
    fn holes(&self) -> Vec<HoleScore> {
        (1..=u8::MAX)
            .zip(self.pars.iter().zip(&self.strokes))
            .map(|(n, (&par, &strokes))| HoleScore::new(n, par, strokes))
            .collect()
    }
}

/// What an import wrote.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub tee_sets: HashMap<String, TeeSetId>,
    pub players: Vec<(PlayerId, String)>,
    pub rounds: usize,
    pub manual_entries: usize,
    pub timelines: Vec<TimelineResult>,
}

impl ImportReport {
    /// Players whose timeline could not be replayed after import.
    pub fn failed_players(&self) -> impl Iterator<Item = &TimelineResult> {
        self.timelines.iter().filter(|t| !t.is_ok())
    }
}

/// Write `fixture` and recompute every imported player.
pub async fn import_fixture<D: Persistence>(
    service: &RecomputeService<D>,
    fixture: &Fixture,
) -> Result<ImportReport, FixtureError> {
    fixture.validate()?;
    let repos = service.repositories();
    let mut report = ImportReport::default();

    for tee in &fixture.tee_sets {
        let record = repos
            .tees
            .create_tee_set(&NewTeeSet {
                course_name: tee.course_name.clone(),
                tee_name: tee.tee_name.clone(),
                course_rating: tee.course_rating,
                slope_rating: tee.slope_rating,
                par: tee.par,
            })
            .await?;
        report.tee_sets.insert(tee.key.clone(), record.tee_id);
    }

    for player in &fixture.players {
        let record = repos.players.create_player(&player.name).await?;
        let player_id = record.player_id;

        for entry in &player.manual_entries {
            repos
                .history
                .save_manual_entry(&HandicapSnapshot::manual(player_id, entry.date, entry.index))
                .await?;
            report.manual_entries += 1;
        }

        for round in &player.rounds {
            let tee_id = report.tee_sets.get(&round.tee).copied().ok_or_else(|| {
                FixtureError::UnknownTee {
                    player: player.name.clone(),
                    date: round.date,
                    tee: round.tee.clone(),
                }
            })?;
            let status = if round.completed {
                RoundStatus::Completed
            } else {
                RoundStatus::InProgress
            };
            repos
                .rounds
                .insert_round(&NewRound {
                    player_id,
                    tee_id,
                    date_played: round.date,
                    status,
                    holes: round.holes(),
                })
                .await?;
            report.rounds += 1;
        }

        tracing::info!(
            player_id = %player_id,
            rounds = player.rounds.len(),
            "Imported player {}",
            player.name
        );
        report.players.push((player_id, player.name.clone()));
    }

    for &(player_id, _) in &report.players {
        let timeline = service.recompute_player_timeline(player_id).await?;
        report.timelines.push(timeline);
    }

    Ok(report)
}
