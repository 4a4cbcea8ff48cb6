//! Orchestration core shared by the benchmark sweep and the regression run.
//!
//! Configurations run strictly one after another in list order. A failure in one
//! configuration is recorded and reported; it never stops the rest of the list.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::cache::RegressionCache;
use crate::config::{artifact_key, Role, TestConfiguration};
use crate::error::{HarnessError, Result};
use crate::launcher::{select_launcher, Launcher};
use crate::metrics::{BenchmarkRecord, SweepTotals};
use crate::report::{
    format_regression_summary, format_table, format_verdict, Reporter, SweepSummary,
};
use crate::runner::{Executor, SimulationRunner};
use crate::settings::HarnessSettings;
use crate::suite::{regression_list, NamedConfiguration};
use crate::verify::verify_files;

/// How each configuration is run and judged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Best-of-N timing. With `check`, the reference also runs, outputs are compared, and the run is scored.
    Benchmark { check: bool },
    /// Cached reference output, one candidate run, pass iff outputs are identical.
    Regression,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Benchmark { .. } => "benchmark",
            Mode::Regression => "regression",
        }
    }
}

/// Ordered results of one sweep.
#[derive(Debug, Default)]
pub struct SweepOutcome {
    pub records: Vec<BenchmarkRecord>,
    /// Entries refused before running, with the reason.
    pub rejected: Vec<String>,
}

impl SweepOutcome {
    pub fn passed(&self) -> usize {
        self.records.iter().filter(|r| r.passed()).count()
    }

    pub fn attempted(&self) -> usize {
        self.records.len() + self.rejected.len()
    }

    pub fn totals(&self) -> SweepTotals {
        SweepTotals::from_records(&self.records)
    }

    pub fn summary(&self, mode: Mode) -> SweepSummary<'_> {
        SweepSummary {
            mode: mode.name(),
            records: &self.records,
            rejected: &self.rejected,
            totals: self.totals(),
            passed: self.passed(),
        }
    }
}

pub struct Orchestrator<'a, E> {
    settings: &'a HarnessSettings,
    runner: SimulationRunner<E>,
    cache: RegressionCache,
}

impl<'a, E: Executor> Orchestrator<'a, E> {
    pub fn new(settings: &'a HarnessSettings, executor: E) -> Self {
        Self {
            settings,
            runner: SimulationRunner::new(executor),
            cache: RegressionCache::new(settings.cache_dir.clone()),
        }
    }

    pub fn cache(&self) -> &RegressionCache {
        &self.cache
    }

    /// Runs every entry in order and returns the records in the same order.
    pub fn run<I>(&mut self, entries: I, mode: Mode, reporter: &mut Reporter) -> SweepOutcome
    where
        I: IntoIterator<Item = (String, Result<NamedConfiguration>)>,
    {
        let mut outcome = SweepOutcome::default();
        for (name, entry) in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(test = %name, error = %e, "skipping configuration");
                    reporter.emit(format!("Test {name}.  {e}"));
                    outcome.rejected.push(format!("{name}: {e}"));
                    continue;
                }
            };
            let record = match mode {
                Mode::Benchmark { check } => self.run_benchmark(&entry, check, reporter),
                Mode::Regression => {
                    let record = self.run_regression(&entry, reporter);
                    let key = artifact_key(&entry.config, Role::Candidate, None);
                    reporter.emit(format_verdict(&key, record.passed()));
                    record
                }
            };
            outcome.records.push(record);
        }
        outcome
    }

    fn input_args(&self, config: &TestConfiguration) -> Vec<String> {
        let data = &self.settings.data_dir;
        vec![
            "-g".into(),
            config.graph_file(data).display().to_string(),
            "-r".into(),
            config.rat_file(data).display().to_string(),
            "-n".into(),
            config.step_count.to_string(),
        ]
    }

    fn benchmark_args(&self, config: &TestConfiguration, check: bool) -> Vec<String> {
        let mut args = self.input_args(config);
        if check {
            args.extend(["-i".to_string(), config.step_count.to_string()]);
        } else {
            args.push("-q".into());
        }
        args
    }

    fn regression_args(&self, config: &TestConfiguration, role: Role) -> Vec<String> {
        let mut args = self.input_args(config);
        args.extend(["-s".to_string(), config.seed.to_string()]);
        if role == Role::Reference {
            args.extend(["-m".to_string(), "d".to_string()]);
        }
        args
    }

    fn launcher(&self, role: Role) -> Option<Launcher> {
        let s = self.settings;
        select_launcher(s.process_count, role, s.machine, &s.programs)
    }

    fn check_file(&self, config: &TestConfiguration, role: Role) -> PathBuf {
        self.settings
            .check_dir
            .join(artifact_key(config, role, self.settings.run_id()))
    }

    fn run_benchmark(
        &mut self,
        entry: &NamedConfiguration,
        check: bool,
        reporter: &mut Reporter,
    ) -> BenchmarkRecord {
        let settings = self.settings;
        let config = &entry.config;
        let mut record =
            BenchmarkRecord::new(entry.name.clone(), config.clone(), settings.process_count);
        info!(test = %config.test_name(), "benchmark");

        if check {
            if let Err(e) = fs::create_dir_all(&settings.check_dir) {
                let e = HarnessError::io(&settings.check_dir, e);
                reporter.emit(format!("Couldn't create directory: {e}"));
                return record.failed(e.to_string());
            }
        }
        let Some(launcher) = self.launcher(Role::Candidate) else {
            return record.failed("no candidate program");
        };
        let args = self.benchmark_args(config, check);
        let sink = check.then(|| self.check_file(config, Role::Candidate));
        let invocation = launcher.invocation(args.clone());
        let secs = match self
            .runner
            .best_of(&invocation, sink.as_deref(), settings.run_count)
        {
            Ok(secs) => secs,
            Err(e) => return record.failed(e.to_string()),
        };
        record = record.with_candidate(secs);
        if !check {
            return record;
        }

        let Some(reference) = self.launcher(Role::Reference) else {
            warn!(machine = ?settings.machine, "no reference simulator for this host");
            return record;
        };
        let ref_sink = self.check_file(config, Role::Reference);
        let invocation = reference.invocation(args);
        let rsecs = match self
            .runner
            .best_of(&invocation, Some(&ref_sink), settings.run_count)
        {
            Ok(rsecs) => rsecs,
            Err(e) => return record.failed(format!("reference run: {e}")),
        };
        record = record.with_reference(rsecs);

        if let Some(sink) = sink.as_deref() {
            record = self.compare(record, &ref_sink, sink, &entry.name, reporter);
        }
        if let (Some(npm), Some(rnpm)) = (record.candidate_npm, record.reference_npm) {
            let points = settings.scoring.score(npm, rnpm);
            record = record.with_points(points);
        }
        record
    }

    fn run_regression(
        &mut self,
        entry: &NamedConfiguration,
        reporter: &mut Reporter,
    ) -> BenchmarkRecord {
        let settings = self.settings;
        let config = &entry.config;
        let mut record =
            BenchmarkRecord::new(entry.name.clone(), config.clone(), settings.process_count);
        info!(test = %entry.name, "regression");

        // The gold-standard simulator is always run sequentially.
        let reference = Launcher::sequential(settings.programs.regression_reference.clone());
        let invocation = reference.invocation(self.regression_args(config, Role::Reference));
        let lookup = match self
            .cache
            .ensure_reference(config, &invocation, &mut self.runner)
        {
            Ok(lookup) => lookup,
            Err(e) => {
                warn!(error = %e, "failed to run simulation with reference simulator");
                return record.failed(format!("reference run: {e}"));
            }
        };

        let Some(launcher) = self.launcher(Role::Candidate) else {
            return record.failed("no candidate program");
        };
        let sink = self.cache.path_for(config, Role::Candidate);
        let invocation = launcher.invocation(self.regression_args(config, Role::Candidate));
        match self.runner.run_once(&invocation, Some(&sink)) {
            Ok(secs) => record = record.with_candidate(secs),
            Err(e) => {
                warn!(error = %e, "failed to run simulation with test simulator");
                return record.failed(e.to_string());
            }
        }
        self.compare(record, lookup.path(), &sink, &entry.name, reporter)
    }

    fn compare(
        &self,
        record: BenchmarkRecord,
        reference: &Path,
        candidate: &Path,
        label: &str,
        reporter: &mut Reporter,
    ) -> BenchmarkRecord {
        match verify_files(reference, candidate, label, self.settings.mismatch_limit) {
            Ok(v) => {
                reporter.emit_all(v.messages());
                record.with_verification(v.passed(), v.mismatch_count)
            }
            Err(e) => {
                reporter.emit(format!("Test {label}.  Couldn't compare outputs: {e}"));
                record.with_verification(false, 0).failed(e.to_string())
            }
        }
    }
}

/// Benchmark entry point: runs `entries`, then prints the table and totals.
pub fn benchmark<E, I>(
    settings: &HarnessSettings,
    executor: E,
    entries: I,
    reporter: &mut Reporter,
) -> SweepOutcome
where
    E: Executor,
    I: IntoIterator<Item = (String, Result<NamedConfiguration>)>,
{
    let mode = Mode::Benchmark {
        check: settings.check,
    };
    let mut orchestrator = Orchestrator::new(settings, executor);
    let outcome = orchestrator.run(entries, mode, reporter);
    reporter.emit_all(format_table(&outcome.records, settings.check));
    outcome
}

/// Regression entry point: optionally flushes the cache, runs the fixed list, prints the summary.
///
/// Fails only when the cache directory cannot be created.
pub fn regress<E: Executor>(
    settings: &HarnessSettings,
    executor: E,
    flush: bool,
    include_extra: bool,
    reporter: &mut Reporter,
) -> Result<SweepOutcome> {
    let mut orchestrator = Orchestrator::new(settings, executor);
    if flush {
        if let Err(e) = orchestrator.cache().flush() {
            warn!(error = %e, "could not flush old result cache");
        }
    }
    orchestrator.cache().prepare()?;

    let entries = regression_list(include_extra)
        .into_iter()
        .map(|entry| (entry.name.clone(), Ok(entry)));
    let outcome = orchestrator.run(entries, Mode::Regression, reporter);
    let total = outcome.attempted();
    reporter.emit(format_regression_summary(outcome.passed(), total, total));
    Ok(outcome)
}
