#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Append-only ledger of eliminations with trailing-window aggregation.

use std::time::Duration;

use pacing_director_core::KillRecord;

/// Append-only log of kill records in arrival order.
///
/// Records are expected to arrive with non-decreasing timestamps. Window
/// queries rely on that order to stop scanning early; a record appended out
/// of order can hide older in-window records behind it, producing an
/// under-count rather than an error.
#[derive(Debug, Default)]
pub struct KillLedger {
    records: Vec<KillRecord>,
}

impl KillLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record to the end of the ledger.
    pub fn append(&mut self, record: KillRecord) {
        self.records.push(record);
    }

    /// Sums the challenge ratings of records stamped at or after `now - window`.
    ///
    /// The scan walks backward from the newest record and stops at the first
    /// one outside the window, so the cost is proportional to the number of
    /// in-window records rather than the ledger length.
    #[must_use]
    pub fn aggregate_window(&self, now: Duration, window: Duration) -> f32 {
        let threshold = now.saturating_sub(window);
        let mut total = 0.0;
        for record in self.records.iter().rev() {
            if record.timestamp() < threshold {
                break;
            }
            total += record.challenge_rating();
        }
        total
    }

    /// Sum of the challenge ratings of every record ever appended.
    #[must_use]
    pub fn total_weight(&self) -> f32 {
        self.records
            .iter()
            .map(KillRecord::challenge_rating)
            .sum()
    }

    /// Records in arrival order.
    #[must_use]
    pub fn records(&self) -> &[KillRecord] {
        &self.records
    }

    /// Number of records appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Reports whether no eliminations have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
