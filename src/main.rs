//! Command-line entry points: `benchmark` sweeps and scores, `regress` checks against cached reference output.

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use graphrats_harness::driver::{self, Mode};
use graphrats_harness::launcher::Machine;
use graphrats_harness::report::{write_json, Reporter};
use graphrats_harness::runner::ProcessExecutor;
use graphrats_harness::settings::{expand_template, HarnessSettings};
use graphrats_harness::suite::{
    benchmark_list, DEFAULT_BENCHMARKS, DEFAULT_DIMENSION, DEFAULT_STEPS, DEFAULT_UPDATE,
};

#[derive(Parser)]
#[command(
    name = "graphrats-harness",
    about = "Benchmark and regression harness for graph/rat simulators"
)]
struct Cli {
    /// JSON settings file. Without one, settings are derived from $HOSTNAME.
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Write the records as JSON.
    #[arg(long, global = true, value_name = "FILE")]
    json: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Time each benchmark, and on hosts with a reference solution, check and score it.
    Benchmark(BenchmarkArgs),
    /// Compare the simulator against cached gold-standard output.
    Regress(RegressArgs),
}

#[derive(Args)]
struct BenchmarkArgs {
    /// Graph dimension
    #[arg(short = 'k', default_value_t = DEFAULT_DIMENSION)]
    dimension: u32,

    /// Benchmarks to run, as a substring of 'ABCDEF'
    #[arg(short = 'b', default_value = DEFAULT_BENCHMARKS)]
    benchmarks: String,

    /// Simulation steps
    #[arg(short = 'n', default_value_t = DEFAULT_STEPS)]
    steps: u32,

    /// MPI processes; more than 1 runs the distributed simulator
    #[arg(short = 'p')]
    processes: Option<u32>,

    /// Times each benchmark is run
    #[arg(short = 'r')]
    runs: Option<u32>,

    /// Unique ID distinguishing check files
    #[arg(short = 'i')]
    id: Option<String>,

    /// Record the report in this file. Each 'X' becomes a random digit.
    #[arg(short = 'f', value_name = "OUTFILE")]
    outfile: Option<String>,

    /// Only time the candidate, even where a reference is available
    #[arg(long)]
    no_check: bool,
}

#[derive(Args)]
struct RegressArgs {
    /// Clear the expected-result cache first
    #[arg(short = 'c')]
    clear: bool,

    /// MPI processes; more than 1 runs the distributed simulator
    #[arg(short = 'p')]
    processes: Option<u32>,

    /// Include the large-scale configurations
    #[arg(long)]
    all: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<HarnessSettings> {
    if let Some(path) = path {
        return Ok(HarnessSettings::from_json_file(path)?);
    }
    let host = env::var("HOSTNAME").unwrap_or_default();
    let machine = Machine::from_hostname(&host);
    if !machine.has_reference() {
        warn!(
            %host,
            "can only get comparison results on GHC or Latedays machines"
        );
    }
    Ok(HarnessSettings::for_machine(machine))
}

fn run_benchmark(cli: &Cli, args: &BenchmarkArgs) -> Result<()> {
    let mut settings = load_settings(cli.settings.as_deref())?;
    if let Some(p) = args.processes {
        settings.process_count = p;
    }
    if let Some(r) = args.runs {
        settings.run_count = r;
    }
    if args.id.is_some() {
        settings.unique_id = args.id.clone();
    }
    if args.no_check {
        settings.check = false;
    }

    let mut reporter = Reporter::stdout();
    if let Some(template) = &args.outfile {
        let name = expand_template(template, &mut rand::thread_rng());
        if settings.run_id().is_none() {
            settings.unique_id = Some(name.clone());
        }
        reporter = reporter
            .with_file(Path::new(&name))
            .with_context(|| format!("couldn't open output file '{name}'"))?;
    }
    settings.validate()?;

    let start = Instant::now();
    let entries = benchmark_list(&args.benchmarks, args.dimension, args.steps, DEFAULT_UPDATE);
    let outcome = driver::benchmark(&settings, ProcessExecutor, entries, &mut reporter);
    if let Some(path) = &cli.json {
        let mode = Mode::Benchmark {
            check: settings.check,
        };
        write_json(path, &outcome.summary(mode))?;
    }
    println!(
        "Total test time = {:.2} secs.",
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn run_regress(cli: &Cli, args: &RegressArgs) -> Result<()> {
    let mut settings = load_settings(cli.settings.as_deref())?;
    if let Some(p) = args.processes {
        settings.process_count = p;
    }
    // Regression compares outputs only; no benchmark reference is involved.
    settings.check = false;
    settings.validate()?;

    let mut reporter = Reporter::stdout();
    let outcome = driver::regress(&settings, ProcessExecutor, args.clear, args.all, &mut reporter)
        .with_context(|| {
            format!(
                "couldn't create cache directory '{}'",
                settings.cache_dir.display()
            )
        })?;
    if let Some(path) = &cli.json {
        write_json(path, &outcome.summary(Mode::Regression))?;
    }
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Benchmark(args) => run_benchmark(&cli, args),
        Commands::Regress(args) => run_regress(&cli, args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
