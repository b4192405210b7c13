//! Derived output of the replay: differential records and handicap snapshots.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ReplaySettings;
use crate::types::{PlayerId, RoundId};

/// One scored round, reduced to what the index selection needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDifferentialRecord {
    pub date: NaiveDate,
    pub round_id: RoundId,
    pub gross_score: i32,
    pub adjusted_gross_score: i32,
    pub course_rating: f64,
    pub slope_rating: f64,
    pub differential: f64,
    pub is_nine_hole: bool,
}

/// How a round-sourced snapshot was derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundCalculation {
    pub round_id: RoundId,
    pub differential: f64,
    pub gross_score: i32,
    pub adjusted_gross_score: i32,
    pub course_rating: f64,
    pub slope_rating: f64,
    pub is_nine_hole: bool,
    /// Course handicap ESC adjusted against; `None` when the prior index was
    /// unknown and the configured policy supplied the band.
    pub course_handicap: Option<i32>,
    /// The index produced after this round, or `None` while fewer than three
    /// differentials exist.
    pub rated_index: Option<f64>,
    /// Differentials in the window that contributed to `rated_index`.
    pub differentials_counted: u8,
    /// Reduction applied for an exceptional score, if any.
    #[serde(default)]
    pub exceptional_reduction: Option<f64>,
    /// Settings the round was scored under.
    #[serde(default)]
    pub settings: ReplaySettings,
}

/// Where a snapshot came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SnapshotSource {
    /// Entered by hand; survives recomputation and can seed the replay.
    Manual,
    FromRound(RoundCalculation),
}

/// A point on a player's handicap timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandicapSnapshot {
    pub player_id: PlayerId,
    pub effective_date: NaiveDate,
    /// The displayed value. For round snapshots taken before the player is
    /// ratable this is the round's differential, used as a placeholder.
    pub handicap_index: f64,
    pub source: SnapshotSource,
}

impl HandicapSnapshot {
    pub fn manual(player_id: PlayerId, effective_date: NaiveDate, handicap_index: f64) -> Self {
        Self {
            player_id,
            effective_date,
            handicap_index,
            source: SnapshotSource::Manual,
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self.source, SnapshotSource::Manual)
    }

    pub fn round_id(&self) -> Option<RoundId> {
        self.calculation().map(|c| c.round_id)
    }

    pub fn calculation(&self) -> Option<&RoundCalculation> {
        match &self.source {
            SnapshotSource::FromRound(calc) => Some(calc),
            SnapshotSource::Manual => None,
        }
    }

    /// The index this snapshot carries forward into the next round: the
    /// manual value, or the rated index of a round snapshot. Placeholder
    /// values never carry forward.
    pub fn carried_index(&self) -> Option<f64> {
        match &self.source {
            SnapshotSource::Manual => Some(self.handicap_index),
            SnapshotSource::FromRound(calc) => calc.rated_index,
        }
    }

    /// Rebuild the differential record a round snapshot was derived from.
    pub fn differential_record(&self) -> Option<ScoreDifferentialRecord> {
        self.calculation().map(|c| ScoreDifferentialRecord {
            date: self.effective_date,
            round_id: c.round_id,
            gross_score: c.gross_score,
            adjusted_gross_score: c.adjusted_gross_score,
            course_rating: c.course_rating,
            slope_rating: c.slope_rating,
            differential: c.differential,
            is_nine_hole: c.is_nine_hole,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn placeholder_snapshot() -> HandicapSnapshot {
        HandicapSnapshot {
            player_id: PlayerId(1),
            effective_date: date(),
            handicap_index: 7.4,
            source: SnapshotSource::FromRound(RoundCalculation {
                round_id: RoundId(9),
                differential: 7.4,
                gross_score: 85,
                adjusted_gross_score: 85,
                course_rating: 75.5,
                slope_rating: 145.0,
                is_nine_hole: false,
                course_handicap: Some(26),
                rated_index: None,
                differentials_counted: 0,
                exceptional_reduction: None,
                settings: ReplaySettings::default(),
            }),
        }
    }

    #[test]
    fn test_placeholder_does_not_carry_forward() {
        let snap = placeholder_snapshot();
        assert_eq!(snap.carried_index(), None);
        assert_eq!(snap.round_id(), Some(RoundId(9)));
        assert!(!snap.is_manual());
    }

    #[test]
    fn test_manual_carries_its_value() {
        let snap = HandicapSnapshot::manual(PlayerId(1), date(), 18.2);
        assert_eq!(snap.carried_index(), Some(18.2));
        assert!(snap.differential_record().is_none());
    }

    #[test]
    fn test_differential_record_roundtrips_calculation() {
        let record = placeholder_snapshot().differential_record().unwrap();
        assert_eq!(record.date, date());
        assert_eq!(record.round_id, RoundId(9));
        assert_eq!(record.differential, 7.4);
        assert_eq!(record.adjusted_gross_score, 85);
    }

    #[test]
    fn test_source_serializes_as_tagged_variant() {
        let json = serde_json::to_value(&placeholder_snapshot().source).unwrap();
        assert!(json.get("FromRound").is_some());
        let manual = serde_json::to_value(SnapshotSource::Manual).unwrap();
        assert_eq!(manual, serde_json::json!("Manual"));
    }
}
