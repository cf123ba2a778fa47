#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rolling estimate of the target's location built from reported sightings.

use std::{collections::VecDeque, time::Duration};

use glam::Vec3;
use pacing_director_core::LocationReport;

/// Maximum number of approximate sightings folded into the estimate.
pub const APPROXIMATE_HISTORY: usize = 3;

/// Bounded history of target sightings averaged into a single estimate.
#[derive(Debug)]
pub struct LocationEstimator {
    history: VecDeque<Vec3>,
    last_report_at: Duration,
}

impl Default for LocationEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationEstimator {
    /// Creates an estimator with an empty history and the report clock at session start.
    #[must_use]
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(APPROXIMATE_HISTORY),
            last_report_at: Duration::ZERO,
        }
    }

    /// Folds a sighting into the history.
    ///
    /// An exact sighting discards everything held so far. Approximate
    /// sightings queue behind each other, evicting the oldest once
    /// [`APPROXIMATE_HISTORY`] are held.
    pub fn report(&mut self, report: &LocationReport) {
        self.last_report_at = report.timestamp();

        if report.precision().is_exact() {
            self.history.clear();
        } else if self.history.len() >= APPROXIMATE_HISTORY {
            let _ = self.history.pop_front();
        }
        self.history.push_back(report.position());
    }

    /// Arithmetic mean of the held sightings, or the origin when none are held.
    #[must_use]
    pub fn estimate(&self) -> Vec3 {
        if self.history.is_empty() {
            return Vec3::ZERO;
        }

        let sum: Vec3 = self.history.iter().copied().sum();
        sum / self.history.len() as f32
    }

    /// Session time of the most recent sighting of any precision.
    #[must_use]
    pub const fn last_report_at(&self) -> Duration {
        self.last_report_at
    }

    /// Number of sightings currently contributing to the estimate.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacing_director_core::Precision;

    fn approximate(position: Vec3, seconds: u64) -> LocationReport {
        LocationReport::new(
            position,
            Precision::Approximate { radius: 5.0 },
            Duration::from_secs(seconds),
        )
    }

    fn exact(position: Vec3, seconds: u64) -> LocationReport {
        LocationReport::new(position, Precision::Exact, Duration::from_secs(seconds))
    }

    #[test]
    fn empty_history_estimates_origin() {
        let estimator = LocationEstimator::new();
        assert_eq!(estimator.estimate(), Vec3::ZERO);
        assert_eq!(estimator.last_report_at(), Duration::ZERO);
        assert_eq!(estimator.history_len(), 0);
    }

    #[test]
    fn averages_up_to_three_approximate_reports() {
        let mut estimator = LocationEstimator::new();
        estimator.report(&approximate(Vec3::new(3.0, 0.0, 0.0), 1));
        assert_eq!(estimator.estimate(), Vec3::new(3.0, 0.0, 0.0));

        estimator.report(&approximate(Vec3::new(0.0, 3.0, 0.0), 2));
        estimator.report(&approximate(Vec3::new(0.0, 0.0, 3.0), 3));
        assert_eq!(estimator.estimate(), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(estimator.history_len(), 3);
    }

    #[test]
    fn fourth_approximate_report_evicts_oldest() {
        let mut estimator = LocationEstimator::new();
        estimator.report(&approximate(Vec3::new(90.0, 0.0, 0.0), 1));
        estimator.report(&approximate(Vec3::new(3.0, 0.0, 0.0), 2));
        estimator.report(&approximate(Vec3::new(6.0, 0.0, 0.0), 3));
        estimator.report(&approximate(Vec3::new(9.0, 0.0, 0.0), 4));

        assert_eq!(estimator.history_len(), 3);
        assert_eq!(estimator.estimate(), Vec3::new(6.0, 0.0, 0.0));
    }

    #[test]
    fn exact_report_replaces_history() {
        let mut estimator = LocationEstimator::new();
        estimator.report(&approximate(Vec3::new(50.0, 0.0, 0.0), 1));
        estimator.report(&approximate(Vec3::new(-20.0, 4.0, 0.0), 2));
        estimator.report(&exact(Vec3::new(7.0, 1.0, -2.0), 3));

        assert_eq!(estimator.history_len(), 1);
        assert_eq!(estimator.estimate(), Vec3::new(7.0, 1.0, -2.0));
        assert_eq!(estimator.last_report_at(), Duration::from_secs(3));
    }

    #[test]
    fn approximate_reports_after_exact_are_averaged_with_it() {
        let mut estimator = LocationEstimator::new();
        estimator.report(&exact(Vec3::new(2.0, 0.0, 0.0), 1));
        estimator.report(&approximate(Vec3::new(4.0, 0.0, 0.0), 2));

        assert_eq!(estimator.estimate(), Vec3::new(3.0, 0.0, 0.0));
    }
}
