//! Per-configuration benchmark records and sweep totals.

use serde::Serialize;

use crate::config::TestConfiguration;

/// Nanoseconds of elapsed time per simulated rat move.
pub fn nanoseconds_per_move(secs: f64, config: &TestConfiguration) -> f64 {
    let moves = config.moves();
    if moves == 0 {
        return 0.0;
    }
    1e9 * secs / moves as f64
}

/// Outcome of one configuration in a sweep. Built once, then only read.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BenchmarkRecord {
    pub name: String,
    pub config: TestConfiguration,
    pub process_count: u32,
    /// Best candidate time; `None` when the candidate failed.
    pub candidate_secs: Option<f64>,
    pub candidate_npm: Option<f64>,
    pub reference_secs: Option<f64>,
    pub reference_npm: Option<f64>,
    /// `None` when no comparison took place.
    pub verified: Option<bool>,
    pub mismatch_count: usize,
    pub points: Option<u32>,
    /// Why the configuration failed, if it did.
    pub failure: Option<String>,
}

impl BenchmarkRecord {
    pub fn new(name: impl Into<String>, config: TestConfiguration, process_count: u32) -> Self {
        Self {
            name: name.into(),
            config,
            process_count,
            candidate_secs: None,
            candidate_npm: None,
            reference_secs: None,
            reference_npm: None,
            verified: None,
            mismatch_count: 0,
            points: None,
            failure: None,
        }
    }

    pub fn with_candidate(mut self, secs: f64) -> Self {
        self.candidate_npm = Some(nanoseconds_per_move(secs, &self.config));
        self.candidate_secs = Some(secs);
        self
    }

    pub fn with_reference(mut self, secs: f64) -> Self {
        self.reference_npm = Some(nanoseconds_per_move(secs, &self.config));
        self.reference_secs = Some(secs);
        self
    }

    pub fn with_verification(mut self, passed: bool, mismatch_count: usize) -> Self {
        self.verified = Some(passed);
        self.mismatch_count = mismatch_count;
        self
    }

    pub fn with_points(mut self, points: u32) -> Self {
        self.points = Some(points);
        self
    }

    pub fn failed(mut self, cause: impl Into<String>) -> Self {
        self.failure = Some(cause.into());
        self
    }

    /// Pass/fail verdict: nothing failed and verification found no mismatch.
    pub fn passed(&self) -> bool {
        self.failure.is_none() && self.verified == Some(true)
    }
}

/// Aggregates printed under the report table.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SweepTotals {
    pub completed: usize,
    pub npm_sum: f64,
    pub referenced: usize,
    pub reference_npm_sum: f64,
    pub total_points: u32,
}

impl SweepTotals {
    pub fn from_records(records: &[BenchmarkRecord]) -> Self {
        let mut totals = Self::default();
        for r in records {
            let Some(npm) = r.candidate_npm else {
                continue;
            };
            totals.completed += 1;
            totals.npm_sum += npm;
            if let Some(rnpm) = r.reference_npm {
                totals.referenced += 1;
                totals.reference_npm_sum += rnpm;
            }
            totals.total_points += r.points.unwrap_or(0);
        }
        totals
    }

    pub fn average_npm(&self) -> Option<f64> {
        (self.completed > 0).then(|| self.npm_sum / self.completed as f64)
    }

    pub fn average_reference_npm(&self) -> Option<f64> {
        (self.referenced > 0 && self.reference_npm_sum > 0.0)
            .then(|| self.reference_npm_sum / self.referenced as f64)
    }
}
