//! Output verification: line-by-line comparison of reference and candidate output.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use serde::Serialize;

use crate::error::{HarnessError, Result};

/// Which stream ran out first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Reference,
    Candidate,
}

impl Side {
    pub fn name(self) -> &'static str {
        match self {
            Side::Reference => "reference",
            Side::Candidate => "candidate",
        }
    }
}

/// One reported difference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    Differs {
        line: usize,
        expected: String,
        actual: String,
    },
    EndedPrematurely {
        line: usize,
        side: Side,
    },
}

/// Result of comparing two streams. `reported` holds at most the mismatch limit of
/// differing lines, plus an early end if one occurred.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub label: String,
    pub mismatch_count: usize,
    pub reported: Vec<Mismatch>,
}

impl Verification {
    pub fn passed(&self) -> bool {
        self.mismatch_count == 0
    }

    /// Report lines: one per reported mismatch, then the tally when nonzero.
    pub fn messages(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .reported
            .iter()
            .map(|m| format!("Test {}.  {}", self.label, m))
            .collect();
        if self.mismatch_count > 0 {
            lines.push(format!("{} total mismatches.", self.mismatch_count));
        }
        lines
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Differs {
                line,
                expected,
                actual,
            } => write!(
                f,
                "Mismatch at line {line}.  Expected result:'{expected}'.  Simulation result:'{actual}'"
            ),
            Mismatch::EndedPrematurely { line, side } => {
                let who = match side {
                    Side::Reference => "Reference simulation",
                    Side::Candidate => "Simulation",
                };
                write!(f, "Mismatch at line {line}.  {who} ended prematurely")
            }
        }
    }
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|&b| b != b'\r' && b != b'\n')
        .map_or(0, |i| i + 1);
    &line[..end]
}

/// Reads one raw line into `buf`; `false` at end of stream.
fn next_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>, side: Side) -> ReadResult<bool> {
    buf.clear();
    reader
        .read_until(b'\n', buf)
        .map(|n| n > 0)
        .map_err(|e| (side, e))
}

type ReadResult<T> = std::result::Result<T, (Side, io::Error)>;

fn compare<R: BufRead, C: BufRead>(
    mut reference: R,
    mut candidate: C,
    label: &str,
    limit: usize,
) -> ReadResult<Verification> {
    let mut outcome = Verification {
        label: label.to_string(),
        ..Verification::default()
    };

    let mut rbuf = Vec::new();
    let mut tbuf = Vec::new();
    let mut line = 0usize;
    loop {
        line += 1;
        let more_ref = next_line(&mut reference, &mut rbuf, Side::Reference)?;
        let more_tst = next_line(&mut candidate, &mut tbuf, Side::Candidate)?;
        match (more_ref, more_tst) {
            (false, false) => break,
            (false, true) | (true, false) => {
                let side = if more_ref {
                    Side::Candidate
                } else {
                    Side::Reference
                };
                // Always the last event, so it is reported past the limit.
                outcome.mismatch_count += 1;
                outcome
                    .reported
                    .push(Mismatch::EndedPrematurely { line, side });
                break;
            }
            (true, true) => {
                let expected = trim_line_end(&rbuf);
                let actual = trim_line_end(&tbuf);
                if expected != actual {
                    outcome.mismatch_count += 1;
                    if outcome.mismatch_count <= limit {
                        outcome.reported.push(Mismatch::Differs {
                            line,
                            expected: String::from_utf8_lossy(expected).into_owned(),
                            actual: String::from_utf8_lossy(actual).into_owned(),
                        });
                    }
                }
            }
        }
    }
    Ok(outcome)
}

/// Compares `reference` and `candidate` line by line after trimming line terminators.
///
/// Lines are compared as raw bytes. If one stream ends before the other that
/// counts as exactly one mismatch, comparison stops, and the early end is always
/// reported. Only the first `limit` differing lines are kept in `reported`; the
/// rest are counted. Both readers are consumed and dropped.
pub fn verify_streams<R, C>(
    reference: R,
    candidate: C,
    label: &str,
    limit: usize,
) -> Result<Verification>
where
    R: BufRead,
    C: BufRead,
{
    compare(reference, candidate, label, limit).map_err(|(side, source)| HarnessError::Read {
        stream: format!("{} output of test {label}", side.name()),
        source,
    })
}

/// Opens both files and compares them with [`verify_streams`].
pub fn verify_files(
    reference: &Path,
    candidate: &Path,
    label: &str,
    limit: usize,
) -> Result<Verification> {
    let rfile = File::open(reference).map_err(|e| HarnessError::io(reference, e))?;
    let tfile = File::open(candidate).map_err(|e| HarnessError::io(candidate, e))?;
    compare(BufReader::new(rfile), BufReader::new(tfile), label, limit).map_err(|(side, e)| {
        match side {
            Side::Reference => HarnessError::io(reference, e),
            Side::Candidate => HarnessError::io(candidate, e),
        }
    })
}
