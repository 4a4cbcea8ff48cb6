//! Configuration lists: the named benchmark matrix and the fixed regression sets.

use crate::config::{GraphType, RatType, TestConfiguration, UpdateMode};
use crate::error::{HarnessError, Result};

use crate::config::GraphType::{Horizontal, Parquet, Tiled, Vertical};
use crate::config::RatType::{Diagonal, Random, Uniform};

pub const DEFAULT_DIMENSION: u32 = 180;
pub const DEFAULT_STEPS: u32 = 100;
pub const DEFAULT_UPDATE: UpdateMode = UpdateMode::Batch;
pub const DEFAULT_BENCHMARKS: &str = "ABCDEF";

/// Benchmark name to (graph, rat distribution).
const BENCHMARKS: [(char, GraphType, RatType); 6] = [
    ('A', Tiled, Uniform),
    ('B', Horizontal, Uniform),
    ('C', Vertical, Uniform),
    ('D', Parquet, Uniform),
    ('E', Vertical, Random),
    ('F', Parquet, Diagonal),
];

/// (k, graph, rats, load factor, steps, seed); all batch updates.
type RegressionRow = (u32, GraphType, RatType, u32, u32, u32);

const REGRESSION: [RegressionRow; 12] = [
    (6, Tiled, Uniform, 2, 11, 16),
    (12, Tiled, Random, 4, 10, 18),
    (12, Tiled, Diagonal, 4, 11, 19),
    (12, Tiled, Uniform, 4, 12, 20),
    (12, Horizontal, Uniform, 4, 10, 21),
    (12, Vertical, Diagonal, 4, 11, 22),
    (12, Parquet, Random, 4, 12, 23),
    (36, Tiled, Uniform, 10, 3, 24),
    (36, Tiled, Random, 10, 6, 25),
    (36, Horizontal, Diagonal, 10, 4, 26),
    (36, Vertical, Diagonal, 10, 4, 27),
    (36, Parquet, Uniform, 10, 6, 28),
];

/// Too large for the gold-standard simulator to finish quickly.
const EXTRA_REGRESSION: [RegressionRow; 2] = [
    (180, Tiled, Uniform, 32, 2, 29),
    (180, Tiled, Diagonal, 32, 2, 30),
];

/// A configuration plus the label shown in reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedConfiguration {
    pub name: String,
    pub config: TestConfiguration,
}

pub fn benchmark_pair(name: char) -> Result<(GraphType, RatType)> {
    BENCHMARKS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, g, r)| (*g, *r))
        .ok_or_else(|| HarnessError::Configuration(format!("unknown benchmark '{name}'")))
}

/// One entry per character of `names`, in order. Invalid entries stay in place as errors.
pub fn benchmark_list(
    names: &str,
    dimension: u32,
    step_count: u32,
    update_mode: UpdateMode,
) -> Vec<(String, Result<NamedConfiguration>)> {
    names
        .chars()
        .map(|name| {
            let entry = benchmark_pair(name).and_then(|(g, r)| {
                let config = TestConfiguration::new(dimension, g, r, step_count, update_mode)?;
                Ok(NamedConfiguration {
                    name: name.to_string(),
                    config,
                })
            });
            (name.to_string(), entry)
        })
        .collect()
}

fn regression_entry(&(k, g, r, lf, steps, seed): &RegressionRow) -> NamedConfiguration {
    let config = TestConfiguration::regression(k, g, r, lf, steps, UpdateMode::Batch, seed);
    NamedConfiguration {
        name: config.test_name(),
        config,
    }
}

/// Standard regression set, followed by the large-scale extras when `include_extra`.
pub fn regression_list(include_extra: bool) -> Vec<NamedConfiguration> {
    let extra: &[RegressionRow] = if include_extra {
        &EXTRA_REGRESSION
    } else {
        &[]
    };
    REGRESSION
        .iter()
        .chain(extra)
        .map(regression_entry)
        .collect()
}
