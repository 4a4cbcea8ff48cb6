//! External simulation runner: launches simulator processes, times them, keeps the best of N.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{HarnessError, Result};
use crate::launcher::Invocation;

/// Executes one external run and reports its elapsed wall-clock seconds.
pub trait Executor {
    /// Primary output goes to `sink` when given, otherwise it is discarded.
    fn execute(&mut self, invocation: &Invocation, sink: Option<&Path>) -> Result<f64>;
}

impl<F> Executor for F
where
    F: FnMut(&Invocation, Option<&Path>) -> Result<f64>,
{
    fn execute(&mut self, invocation: &Invocation, sink: Option<&Path>) -> Result<f64> {
        self(invocation, sink)
    }
}

/// Runs real child processes.
///
/// Stderr of the child is relayed verbatim to our stderr once it exits. The child is
/// always waited for and the sink file is closed on every path.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn execute(&mut self, invocation: &Invocation, sink: Option<&Path>) -> Result<f64> {
        let command = invocation.to_string();
        let program = invocation.program().ok_or_else(|| HarnessError::Launch {
            command: command.clone(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "empty command line"),
        })?;
        let stdout = match sink {
            Some(path) => {
                let file = File::create(path).map_err(|e| HarnessError::io(path, e))?;
                Stdio::from(file)
            }
            None => Stdio::null(),
        };

        info!(%command, "running");
        let start = Instant::now();
        let child = Command::new(program)
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HarnessError::Launch {
                command: command.clone(),
                source,
            })?;
        let output = child.wait_with_output().map_err(|source| HarnessError::Launch {
            command: command.clone(),
            source,
        })?;
        let secs = start.elapsed().as_secs_f64();

        if !output.stderr.is_empty() {
            if let Err(e) = io::stderr().write_all(&output.stderr) {
                warn!(error = %e, "could not relay simulator diagnostics");
            }
        }
        if output.status.success() {
            Ok(secs)
        } else {
            // Killed by a signal: no exit code.
            let code = output.status.code().unwrap_or(-1);
            Err(HarnessError::Exit { command, code })
        }
    }
}

/// Repeats external runs and selects the fastest.
pub struct SimulationRunner<E> {
    executor: E,
}

impl<E: Executor> SimulationRunner<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn run_once(&mut self, invocation: &Invocation, sink: Option<&Path>) -> Result<f64> {
        self.executor.execute(invocation, sink)
    }

    /// Minimum elapsed time over `repeats` sequential runs.
    ///
    /// The first failing attempt aborts the remaining repeats and fails the whole call.
    pub fn best_of(
        &mut self,
        invocation: &Invocation,
        sink: Option<&Path>,
        repeats: u32,
    ) -> Result<f64> {
        let repeats = repeats.max(1);
        let mut best = f64::INFINITY;
        for attempt in 1..=repeats {
            if repeats > 1 {
                debug!(attempt, repeats, "run");
            }
            match self.executor.execute(invocation, sink) {
                Ok(secs) => best = best.min(secs),
                Err(e) => {
                    warn!(attempt, error = %e, "run failed, abandoning remaining repeats");
                    return Err(e);
                }
            }
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn scripted(
        times: Vec<Result<f64>>,
    ) -> impl FnMut(&Invocation, Option<&Path>) -> Result<f64> {
        let mut queue: VecDeque<Result<f64>> = times.into();
        move |_inv: &Invocation, _sink: Option<&Path>| {
            queue.pop_front().expect("executor called more often than scripted")
        }
    }

    fn exit_failure() -> HarnessError {
        HarnessError::Exit {
            command: "sim".into(),
            code: 1,
        }
    }

    #[test]
    fn best_of_n_keeps_minimum() {
        let mut runner = SimulationRunner::new(scripted(vec![Ok(5.0), Ok(3.2), Ok(4.1)]));
        let inv = Invocation::new(["sim"]);
        assert_eq!(runner.best_of(&inv, None, 3).unwrap(), 3.2);
    }

    #[test]
    fn best_of_n_fails_fast() {
        let calls = std::cell::Cell::new(0);
        let mut outcomes: VecDeque<Result<f64>> =
            vec![Ok(1.0), Err(exit_failure()), Ok(0.5)].into();
        let exec = |_: &Invocation, _: Option<&Path>| {
            calls.set(calls.get() + 1);
            outcomes.pop_front().unwrap()
        };
        let mut runner = SimulationRunner::new(exec);
        let inv = Invocation::new(["sim"]);
        assert!(matches!(
            runner.best_of(&inv, None, 3),
            Err(HarnessError::Exit { code: 1, .. })
        ));
        drop(runner);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn zero_repeats_still_runs_once() {
        let mut runner = SimulationRunner::new(scripted(vec![Ok(2.0)]));
        assert_eq!(runner.best_of(&Invocation::new(["sim"]), None, 0).unwrap(), 2.0);
    }

    #[cfg(unix)]
    #[test]
    fn process_output_goes_to_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sink = dir.path().join("out.txt");
        let inv = Invocation::new(["/bin/sh", "-c", "echo line1; echo line2; echo diag >&2"]);
        let secs = ProcessExecutor.execute(&inv, Some(&sink)).unwrap();
        assert!(secs >= 0.0);
        assert_eq!(std::fs::read_to_string(&sink).unwrap(), "line1\nline2\n");
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_exit_failure() {
        let inv = Invocation::new(["/bin/sh", "-c", "exit 3"]);
        match ProcessExecutor.execute(&inv, None) {
            Err(HarnessError::Exit { code, .. }) => assert_eq!(code, 3),
            other => panic!("expected exit failure, got {other:?}"),
        }
    }

    #[test]
    fn missing_program_is_launch_failure() {
        let inv = Invocation::new(["./definitely-not-a-simulator-binary", "-q"]);
        assert!(matches!(
            ProcessExecutor.execute(&inv, None),
            Err(HarnessError::Launch { .. })
        ));
    }

    #[test]
    fn unopenable_sink_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let sink = dir.path().join("no-such-dir").join("out.txt");
        let inv = Invocation::new(["./definitely-not-a-simulator-binary"]);
        assert!(matches!(
            ProcessExecutor.execute(&inv, Some(&sink)),
            Err(HarnessError::Io { .. })
        ));
    }
}
