//! Reporting: tab-separated benchmark table, regression verdicts, and JSON export.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::warn;

use crate::error::{HarnessError, Result};
use crate::metrics::{BenchmarkRecord, SweepTotals};
use crate::scoring::throughput_ratio;

/// Columns before the numeric block; the average and total rows pad past them.
const AVG_PAD: usize = 9;
const TOTAL_PAD: usize = 12;

pub fn format_title(check: bool) -> String {
    let mut cols = vec![
        "Name", "Dim", "gtype", "lf", "rtype", "steps", "update", "procs", "secs", "NPM",
    ];
    if check {
        cols.extend(["BNPM", "Ratio", "Pts"]);
    }
    cols.join("\t")
}

/// One table row. A failed candidate keeps only its configuration columns.
pub fn format_row(record: &BenchmarkRecord) -> String {
    let c = &record.config;
    let mut cols = vec![
        record.name.clone(),
        format!("{:5}", c.dimension),
        c.graph_type.tag().to_string(),
        format!("{:4}", c.load_factor),
        c.rat_type.tag().to_string(),
        c.step_count.to_string(),
        c.update_mode.tag().to_string(),
        record.process_count.to_string(),
    ];
    if let (Some(secs), Some(npm)) = (record.candidate_secs, record.candidate_npm) {
        cols.push(format!("{secs:.2}"));
        cols.push(format!("{npm:.2}"));
        if let Some(rnpm) = record.reference_npm {
            cols.push(format!("{rnpm:.2}"));
            cols.push(format!("{:.3}", throughput_ratio(npm, rnpm)));
            cols.push(record.points.unwrap_or(0).to_string());
        }
    }
    cols.join("\t")
}

pub fn format_average(totals: &SweepTotals) -> Option<String> {
    let avg = totals.average_npm()?;
    let mut line = format!("AVG:{}{avg:.2}", "\t".repeat(AVG_PAD));
    if let Some(ravg) = totals.average_reference_npm() {
        line.push_str(&format!("\t{ravg:.2}"));
    }
    Some(line)
}

pub fn format_total(totals: &SweepTotals) -> String {
    format!("TOTAL:{}{}", "\t".repeat(TOTAL_PAD), totals.total_points)
}

/// Table title, one row per record in order, then the average and, when checking, the total.
pub fn format_table(records: &[BenchmarkRecord], check: bool) -> Vec<String> {
    let mut lines = vec![format_title(check)];
    lines.extend(records.iter().map(format_row));
    let totals = SweepTotals::from_records(records);
    if let Some(avg) = format_average(&totals) {
        lines.push(avg);
        if check {
            lines.push(format_total(&totals));
        }
    }
    lines
}

pub fn format_verdict(key: &str, passed: bool) -> String {
    format!(
        "Regression {key} {}",
        if passed { "Passed" } else { "Failed" }
    )
}

pub fn format_regression_summary(passed: usize, attempted: usize, total: usize) -> String {
    let status = if passed == total { "SUCCESS" } else { "FAILED" };
    format!("Regression set size {total}.  {passed}/{attempted} tests successful. {status}")
}

/// Machine-readable sweep result.
#[derive(Debug, Serialize)]
pub struct SweepSummary<'a> {
    pub mode: &'a str,
    pub records: &'a [BenchmarkRecord],
    pub rejected: &'a [String],
    pub totals: SweepTotals,
    pub passed: usize,
}

pub fn write_json(path: &Path, summary: &SweepSummary<'_>) -> Result<()> {
    let file = File::create(path).map_err(|e| HarnessError::io(path, e))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, summary)
        .map_err(|e| HarnessError::io(path, io::Error::from(e)))?;
    w.write_all(b"\n")
        .and_then(|()| w.flush())
        .map_err(|e| HarnessError::io(path, e))
}

/// Writes report lines to stdout and, optionally, a results file. Keeps a transcript.
pub struct Reporter {
    echo: bool,
    file: Option<BufWriter<File>>,
    transcript: Vec<String>,
}

impl Reporter {
    pub fn stdout() -> Self {
        Self {
            echo: true,
            file: None,
            transcript: Vec::new(),
        }
    }

    /// Transcript only; nothing is printed.
    pub fn quiet() -> Self {
        Self {
            echo: false,
            file: None,
            transcript: Vec::new(),
        }
    }

    pub fn with_file(mut self, path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| HarnessError::io(path, e))?;
        self.file = Some(BufWriter::new(file));
        Ok(self)
    }

    pub fn emit(&mut self, line: impl Into<String>) {
        let line = line.into();
        if self.echo {
            let mut out = io::stdout().lock();
            if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
                warn!(error = %e, "could not write report line to stdout");
            }
        }
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = writeln!(file, "{line}") {
                warn!(error = %e, "could not write report line to results file");
            }
        }
        self.transcript.push(line);
    }

    pub fn emit_all<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            self.emit(line);
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.transcript
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.flush() {
                warn!(error = %e, "could not flush results file");
            }
        }
    }
}
