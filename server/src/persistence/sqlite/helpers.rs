//! Shared encode/decode helpers for SQLite ↔ domain type conversions.
//!
//! These functions bridge the gap between domain enums and the string
//! columns used in the SQLite schema's CHECK constraints.

use handicap::{RoundCalculation, RoundId, SnapshotSource};

use crate::persistence::{PersistenceError, RoundStatus};

// ── RoundStatus ────────────────────────────────────────────────────────

pub fn encode_status(status: RoundStatus) -> &'static str {
    match status {
        RoundStatus::InProgress => "InProgress",
        RoundStatus::Completed => "Completed",
    }
}

pub fn decode_status(s: &str) -> Result<RoundStatus, PersistenceError> {
    match s {
        "InProgress" => Ok(RoundStatus::InProgress),
        "Completed" => Ok(RoundStatus::Completed),
        other => Err(PersistenceError::Corrupt(format!(
            "unknown round status '{other}'"
        ))),
    }
}

// ── SnapshotSource ─────────────────────────────────────────────────────

/// Columns of a `handicap_history` row derived from its source:
/// `(source, round_id, calculation_details)`.
pub struct EncodedSource {
    pub tag: &'static str,
    pub round_id: Option<i64>,
    pub details: Option<String>,
}

pub fn encode_source(source: &SnapshotSource) -> Result<EncodedSource, PersistenceError> {
    Ok(match source {
        SnapshotSource::Manual => EncodedSource {
            tag: "Manual",
            round_id: None,
            details: None,
        },
        SnapshotSource::FromRound(calc) => EncodedSource {
            tag: "Round",
            round_id: Some(calc.round_id.0),
            details: Some(serde_json::to_string(calc)?),
        },
    })
}

pub fn decode_source(
    tag: &str,
    round_id: Option<i64>,
    details: Option<&str>,
) -> Result<SnapshotSource, PersistenceError> {
    match tag {
        "Manual" => Ok(SnapshotSource::Manual),
        "Round" => {
            let details = details.ok_or_else(|| {
                PersistenceError::Corrupt("round snapshot without calculation details".into())
            })?;
            let calc: RoundCalculation = serde_json::from_str(details)?;
            if round_id != Some(calc.round_id.0) {
                return Err(PersistenceError::Corrupt(format!(
                    "calculation details name round {} but row references {:?}",
                    calc.round_id,
                    round_id.map(RoundId)
                )));
            }
            Ok(SnapshotSource::FromRound(calc))
        }
        other => Err(PersistenceError::Corrupt(format!(
            "unknown snapshot source '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(round_id: i64) -> RoundCalculation {
        RoundCalculation {
            round_id: RoundId(round_id),
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
            settings: handicap::ReplaySettings::default(),
        }
    }

    #[test]
    fn test_status_round_trips() {
        for status in [RoundStatus::InProgress, RoundStatus::Completed] {
            assert_eq!(decode_status(encode_status(status)).unwrap(), status);
        }
        assert!(decode_status("Abandoned").is_err());
    }

    #[test]
    fn test_manual_source_has_no_round() {
        let encoded = encode_source(&SnapshotSource::Manual).unwrap();
        assert_eq!(encoded.tag, "Manual");
        assert_eq!(encoded.round_id, None);
        assert_eq!(encoded.details, None);
    }

    #[test]
    fn test_round_source_keeps_calculation() {
        let source = SnapshotSource::FromRound(calc(12));
        let encoded = encode_source(&source).unwrap();
        assert_eq!(encoded.tag, "Round");
        assert_eq!(encoded.round_id, Some(12));
        let decoded =
            decode_source(encoded.tag, encoded.round_id, encoded.details.as_deref()).unwrap();
        assert_eq!(decoded, source);
    }

    #[test]
    fn test_details_without_exceptional_field_still_decode() {
        let json = r#"{"round_id":3,"differential":12.1,"gross_score":90,
            "adjusted_gross_score":88,"course_rating":71.0,"slope_rating":120.0,
            "is_nine_hole":false,"course_handicap":null,"rated_index":null,
            "differentials_counted":0}"#;
        let decoded = decode_source("Round", Some(3), Some(json)).unwrap();
        let SnapshotSource::FromRound(calc) = decoded else {
            panic!("expected a round source");
        };
        assert_eq!(calc.exceptional_reduction, None);
        assert_eq!(calc.adjusted_gross_score, 88);
        assert_eq!(calc.settings, handicap::ReplaySettings::default());
    }

    #[test]
    fn test_mismatched_round_is_corrupt() {
        let details = serde_json::to_string(&calc(4)).unwrap();
        let err = decode_source("Round", Some(5), Some(&details)).unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupt(_)));
        assert!(decode_source("Round", Some(4), None).is_err());
        assert!(decode_source("Imported", None, None).is_err());
    }
}
