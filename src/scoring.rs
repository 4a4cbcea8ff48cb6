//! Scoring: converts a candidate/reference throughput ratio into grading points.

use serde::{Deserialize, Serialize};

/// Thresholds and point scale for one benchmark run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Points awarded at or above the upper threshold.
    pub points_per_run: u32,
    /// Ratio at or below which no points are awarded.
    pub lower_threshold: f64,
    /// Ratio at or above which full points are awarded.
    pub upper_threshold: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            points_per_run: 15,
            lower_threshold: 0.5,
            upper_threshold: 0.9,
        }
    }
}

impl ScoringPolicy {
    /// Points for a candidate measured at `candidate_npm` against a reference at `reference_npm`.
    ///
    /// Both values are nanoseconds per move, so a smaller candidate value is better.
    /// Between the thresholds points are interpolated linearly and always rounded up.
    pub fn score(&self, candidate_npm: f64, reference_npm: f64) -> u32 {
        if candidate_npm == 0.0 {
            return 0;
        }
        let ratio = reference_npm / candidate_npm;
        let fraction = if ratio >= self.upper_threshold {
            1.0
        } else if ratio <= self.lower_threshold {
            0.0
        } else {
            (ratio - self.lower_threshold) / (self.upper_threshold - self.lower_threshold)
        };
        (fraction * f64::from(self.points_per_run)).ceil() as u32
    }
}

/// `reference / candidate`, or 0 when the candidate value is not positive.
pub fn throughput_ratio(candidate_npm: f64, reference_npm: f64) -> f64 {
    if candidate_npm > 0.0 {
        reference_npm / candidate_npm
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn full_credit_at_upper_threshold() {
        let p = ScoringPolicy::default();
        assert_eq!(p.score(1.0, 0.9), 15);
        assert_eq!(p.score(1.0, 2.5), 15);
    }

    #[test]
    fn no_credit_at_lower_threshold() {
        let p = ScoringPolicy::default();
        assert_eq!(p.score(1.0, 0.5), 0);
        assert_eq!(p.score(10.0, 1.0), 0);
    }

    #[test]
    fn interpolation_rounds_up() {
        let p = ScoringPolicy::default();
        assert_eq!(p.score(1.0, 0.7), 8);
        assert_eq!(p.score(1.0, 0.501), 1);
    }

    #[test]
    fn zero_candidate_never_scores() {
        let p = ScoringPolicy::default();
        assert_eq!(p.score(0.0, 100.0), 0);
        assert_eq!(p.score(0.0, 0.0), 0);
    }

    #[test]
    fn ratio_guards_zero_candidate() {
        assert_eq!(throughput_ratio(0.0, 3.0), 0.0);
        assert!((throughput_ratio(2.0, 3.0) - 1.5).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_score_non_increasing_in_candidate(
            reference in 0.01f64..100.0,
            a in 0.01f64..100.0,
            b in 0.01f64..100.0,
        ) {
            let p = ScoringPolicy::default();
            let (better, worse) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(p.score(worse, reference) <= p.score(better, reference));
        }

        #[test]
        fn prop_score_within_bounds(candidate in 0.0f64..1000.0, reference in 0.0f64..1000.0) {
            let p = ScoringPolicy::default();
            prop_assert!(p.score(candidate, reference) <= p.points_per_run);
        }
    }
}
