//! Harness settings: one explicit object built at startup and handed to every component.

use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};
use crate::launcher::{Machine, Programs};
use crate::scoring::ScoringPolicy;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessSettings {
    /// Repeats per benchmark run; the best time is kept.
    pub run_count: u32,
    /// Suffix distinguishing check files of concurrent users.
    pub unique_id: Option<String>,
    pub process_count: u32,
    /// Upper bound for `process_count`, which must also divide it.
    pub max_process_count: u32,
    pub machine: Machine,
    /// Compare candidate output against the reference and score it.
    pub check: bool,
    /// Mismatches reported individually before only counting.
    pub mismatch_limit: usize,
    pub scoring: ScoringPolicy,
    pub data_dir: PathBuf,
    pub check_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub programs: Programs,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            run_count: 3,
            unique_id: None,
            process_count: 12,
            max_process_count: 12,
            machine: Machine::Other,
            check: false,
            mismatch_limit: 5,
            scoring: ScoringPolicy::default(),
            data_dir: PathBuf::from("./data"),
            check_dir: PathBuf::from("./check"),
            cache_dir: PathBuf::from("./regression-cache"),
            programs: Programs::default(),
        }
    }
}

impl HarnessSettings {
    /// Reads settings from a JSON file; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| {
            HarnessError::Configuration(format!("settings file '{}': {e}", path.display()))
        })
    }

    /// Settings for a host: checking is on wherever a reference solution exists.
    pub fn for_machine(machine: Machine) -> Self {
        Self {
            machine,
            check: machine.has_reference(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let p = self.process_count;
        let max = self.max_process_count;
        if p == 0 || p > max {
            return Err(HarnessError::Configuration(format!(
                "invalid process count {p}, must be between 1 and {max}"
            )));
        }
        if max % p != 0 {
            return Err(HarnessError::Configuration(format!(
                "invalid process count {p}, {max} must be divisible by the process count"
            )));
        }
        if self.run_count == 0 {
            return Err(HarnessError::Configuration(
                "run count must be at least 1".into(),
            ));
        }
        if self.check && !self.machine.has_reference() {
            return Err(HarnessError::Configuration(
                "checking requires a host with a reference simulator".into(),
            ));
        }
        Ok(())
    }

    pub fn run_id(&self) -> Option<&str> {
        self.unique_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Replaces every `X` in `template` with a random decimal digit.
pub fn expand_template<R: Rng>(template: &str, rng: &mut R) -> String {
    template
        .chars()
        .map(|c| {
            if c == 'X' {
                char::from(b'0' + rng.gen_range(0..10u8))
            } else {
                c
            }
        })
        .collect()
}
