//! Handicap Index selection: the lowest differentials of the most recent 20.
//!
//! Selection is two separate orderings that must never be mixed up:
//! 1. the window is the 20 most recent differentials **by date**;
//! 2. inside that window the values are sorted ascending and the lowest `K`
//!    are averaged, where `K` and an adjustment depend on the window size.

use crate::rounding::round1;
use crate::snapshot::ScoreDifferentialRecord;

/// Number of most recent differentials considered.
pub const WINDOW_SIZE: usize = 20;

/// Fewer differentials than this produce no index.
pub const MIN_DIFFERENTIALS: usize = 3;

/// Upper bound of a Handicap Index. There is no lower bound.
pub const MAX_HANDICAP_INDEX: f64 = 54.0;

/// How many differentials count for a given window size, and the adjustment
/// added to their mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRule {
    pub count_used: usize,
    pub adjustment: f64,
}

/// Rule for `available` differentials, or `None` below [`MIN_DIFFERENTIALS`].
pub fn selection_rule(available: usize) -> Option<SelectionRule> {
    let (count_used, adjustment) = match available {
        0..=2 => return None,
        3 => (1, -2.0),
        4 => (1, -1.0),
        5 => (1, 0.0),
        6 => (2, -1.0),
        7..=8 => (2, 0.0),
        9..=11 => (3, 0.0),
        12..=14 => (4, 0.0),
        15..=16 => (5, 0.0),
        17..=18 => (6, 0.0),
        19 => (7, 0.0),
        _ => (8, 0.0),
    };
    Some(SelectionRule {
        count_used,
        adjustment,
    })
}

/// Compute a Handicap Index.
///
/// `most_recent_first` is ordered by round date, newest first; only the first
/// [`WINDOW_SIZE`] entries are considered regardless of their values.
pub fn compute_handicap_index(most_recent_first: &[f64]) -> Option<f64> {
    let window = &most_recent_first[..most_recent_first.len().min(WINDOW_SIZE)];
    let rule = selection_rule(window.len())?;

    let mut sorted = window.to_vec();
    sorted.sort_by(f64::total_cmp);
    let lowest = &sorted[..rule.count_used];
    let mean = lowest.iter().sum::<f64>() / lowest.len() as f64;

    Some(round1(mean + rule.adjustment).min(MAX_HANDICAP_INDEX))
}

/// The most recent differential records of a player, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingWindow {
    records: Vec<ScoreDifferentialRecord>,
}

impl RollingWindow {
    /// Build the window from a chronological (oldest first) history.
    pub fn from_chronological(history: &[ScoreDifferentialRecord]) -> Self {
        let records = history.iter().rev().take(WINDOW_SIZE).cloned().collect();
        Self { records }
    }

    /// Records in the window, newest first.
    pub fn records(&self) -> &[ScoreDifferentialRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn differentials(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.differential).collect()
    }

    pub fn handicap_index(&self) -> Option<f64> {
        compute_handicap_index(&self.differentials())
    }

    /// Positions (into [`Self::records`]) of the differentials that count
    /// toward the index. Equal values are broken by recency.
    pub fn counting_positions(&self) -> Vec<usize> {
        let Some(rule) = selection_rule(self.records.len()) else {
            return Vec::new();
        };
        let mut positions: Vec<usize> = (0..self.records.len()).collect();
        positions.sort_by(|&a, &b| {
            self.records[a]
                .differential
                .total_cmp(&self.records[b].differential)
                .then(a.cmp(&b))
        });
        positions.truncate(rule.count_used);
        positions.sort_unstable();
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fewer_than_three_is_not_ratable() {
        assert_eq!(compute_handicap_index(&[]), None);
        assert_eq!(compute_handicap_index(&[10.0]), None);
        assert_eq!(compute_handicap_index(&[10.0, 12.0]), None);
    }

    #[test]
    fn test_small_counts_use_adjustments() {
        // 3: lowest 1, -2.0
        assert_eq!(compute_handicap_index(&[15.0, 12.0, 18.0]), Some(10.0));
        // 4: lowest 1, -1.0
        assert_eq!(compute_handicap_index(&[15.0, 12.0, 18.0, 14.0]), Some(11.0));
        // 5: lowest 1
        assert_eq!(
            compute_handicap_index(&[15.0, 12.0, 18.0, 14.0, 20.0]),
            Some(12.0)
        );
        // 6: lowest 2 averaged, -1.0 -> (12 + 13) / 2 - 1 = 11.5
        assert_eq!(
            compute_handicap_index(&[15.0, 12.0, 18.0, 14.0, 20.0, 13.0]),
            Some(11.5)
        );
        // 7: lowest 2 -> 12.5
        assert_eq!(
            compute_handicap_index(&[15.0, 12.0, 18.0, 14.0, 20.0, 13.0, 16.0]),
            Some(12.5)
        );
    }

    #[test]
    fn test_nineteen_uses_seven() {
        let diffs: Vec<f64> = (1..=19).map(|v| v as f64).collect();
        // mean(1..=7) = 4.0
        assert_eq!(compute_handicap_index(&diffs), Some(4.0));
    }

    #[test]
    fn test_twenty_uses_eight() {
        let diffs: Vec<f64> = (1..=20).rev().map(|v| v as f64).collect();
        // mean(1..=8) = 4.5
        assert_eq!(compute_handicap_index(&diffs), Some(4.5));
    }

    #[test]
    fn test_only_the_most_recent_twenty_count() {
        // 20 recent rounds of 15.0 and five older, much better rounds.
        let mut diffs = vec![15.0; 20];
        diffs.extend([1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(diffs.len(), 25);
        assert_eq!(compute_handicap_index(&diffs), Some(15.0));
    }

    #[test]
    fn test_mean_is_rounded_to_one_decimal() {
        // 9 differentials: lowest 3 = 10.1, 10.2, 10.4 -> 10.2333 -> 10.2
        let diffs = [10.4, 20.0, 10.1, 20.0, 20.0, 10.2, 20.0, 20.0, 20.0];
        assert_eq!(compute_handicap_index(&diffs), Some(10.2));
    }

    #[test]
    fn test_capped_at_fifty_four() {
        assert_eq!(
            compute_handicap_index(&[60.0, 61.0, 62.0, 63.0, 64.0]),
            Some(MAX_HANDICAP_INDEX)
        );
    }

    #[test]
    fn test_plus_handicaps_pass_through() {
        assert_eq!(compute_handicap_index(&[-1.0, 0.5, 2.0, 3.0, 4.0]), Some(-1.0));
        assert_eq!(compute_handicap_index(&[-1.0, 0.5, 2.0]), Some(-3.0));
    }

    #[test]
    fn test_table_covers_every_count() {
        let expected = [
            (3, 1),
            (4, 1),
            (5, 1),
            (6, 2),
            (7, 2),
            (8, 2),
            (9, 3),
            (11, 3),
            (12, 4),
            (14, 4),
            (15, 5),
            (16, 5),
            (17, 6),
            (18, 6),
            (19, 7),
            (20, 8),
            (25, 8),
        ];
        for (count, used) in expected {
            assert_eq!(selection_rule(count).unwrap().count_used, used, "count {count}");
        }
    }

    proptest! {
        #[test]
        fn test_never_above_the_cap(diffs in proptest::collection::vec(-10.0f64..120.0, 0..40)) {
            if let Some(index) = compute_handicap_index(&diffs) {
                prop_assert!(index <= MAX_HANDICAP_INDEX);
            } else {
                prop_assert!(diffs.len() < MIN_DIFFERENTIALS);
            }
        }
    }
}
