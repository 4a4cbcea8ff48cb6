//! Configuration model: one test case in the benchmark/regression space and the names derived from it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// Seed the simulators use when none is given on the command line.
pub const DEFAULT_SEED: u32 = 618;

/// Supported grid dimensions and the rat load factor generated for each.
pub const LOAD_FACTORS: [(u32, u32); 4] = [(12, 4), (36, 10), (60, 25), (180, 32)];

/// Graph layout of the input grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphType {
    Tiled,
    Horizontal,
    Vertical,
    Parquet,
}

/// Initial rat distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatType {
    Uniform,
    Diagonal,
    Random,
}

/// Simulation update policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    Synchronous,
    Batch,
    Rat,
}

/// Which simulator produced an artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Reference,
    Candidate,
}

impl GraphType {
    pub fn tag(self) -> char {
        match self {
            GraphType::Tiled => 't',
            GraphType::Horizontal => 'h',
            GraphType::Vertical => 'v',
            GraphType::Parquet => 'p',
        }
    }
}

impl RatType {
    pub fn tag(self) -> char {
        match self {
            RatType::Uniform => 'u',
            RatType::Diagonal => 'd',
            RatType::Random => 'r',
        }
    }
}

impl UpdateMode {
    pub fn tag(self) -> char {
        match self {
            UpdateMode::Synchronous => 's',
            UpdateMode::Batch => 'b',
            UpdateMode::Rat => 'r',
        }
    }
}

impl Role {
    pub fn prefix(self) -> &'static str {
        match self {
            Role::Reference => "ref",
            Role::Candidate => "tst",
        }
    }
}

/// Looks up the load factor generated for a grid dimension.
pub fn derive_load_factor(dimension: u32) -> Result<u32> {
    LOAD_FACTORS
        .iter()
        .find(|(k, _)| *k == dimension)
        .map(|(_, lf)| *lf)
        .ok_or_else(|| {
            HarnessError::Configuration(format!("unsupported graph dimension {dimension}"))
        })
}

/// `g-<gtype><k>x<k>.gph`, with k zero-padded to three digits.
pub fn graph_file_name(dimension: u32, graph_type: GraphType) -> PathBuf {
    PathBuf::from(format!(
        "g-{}{:03}x{:03}.gph",
        graph_type.tag(),
        dimension,
        dimension
    ))
}

/// `r-<k>x<k>-<rtype><lf>.rats`; the load factor is not zero-padded.
pub fn rat_file_name(dimension: u32, rat_type: RatType, load_factor: u32) -> PathBuf {
    PathBuf::from(format!(
        "r-{:03}x{:03}-{}{}.rats",
        dimension,
        dimension,
        rat_type.tag(),
        load_factor
    ))
}

/// Immutable description of one test case.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestConfiguration {
    pub dimension: u32,
    pub graph_type: GraphType,
    pub rat_type: RatType,
    pub load_factor: u32,
    pub step_count: u32,
    pub update_mode: UpdateMode,
    pub seed: u32,
}

impl TestConfiguration {
    /// Benchmark-matrix entry: load factor derived from the dimension, default seed.
    pub fn new(
        dimension: u32,
        graph_type: GraphType,
        rat_type: RatType,
        step_count: u32,
        update_mode: UpdateMode,
    ) -> Result<Self> {
        if step_count == 0 {
            return Err(HarnessError::Configuration(
                "step count must be positive".into(),
            ));
        }
        Ok(Self {
            dimension,
            graph_type,
            rat_type,
            load_factor: derive_load_factor(dimension)?,
            step_count,
            update_mode,
            seed: DEFAULT_SEED,
        })
    }

    /// Ad hoc regression entry with every field supplied.
    pub fn regression(
        dimension: u32,
        graph_type: GraphType,
        rat_type: RatType,
        load_factor: u32,
        step_count: u32,
        update_mode: UpdateMode,
        seed: u32,
    ) -> Self {
        Self {
            dimension,
            graph_type,
            rat_type,
            load_factor,
            step_count,
            update_mode,
            seed,
        }
    }

    pub fn graph_file(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(graph_file_name(self.dimension, self.graph_type))
    }

    pub fn rat_file(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(rat_file_name(
            self.dimension,
            self.rat_type,
            self.load_factor,
        ))
    }

    /// Number of simulated rat moves: nodes * load factor * steps.
    pub fn moves(&self) -> u64 {
        let nodes = u64::from(self.dimension) * u64::from(self.dimension);
        nodes * u64::from(self.load_factor) * u64::from(self.step_count)
    }

    /// Role-free part of the artifact key, e.g. `012-t-u-04-10-b-618`.
    pub fn test_name(&self) -> String {
        format!(
            "{:03}-{}-{}-{:02}-{:02}-{}-{:02}",
            self.dimension,
            self.graph_type.tag(),
            self.rat_type.tag(),
            self.load_factor,
            self.step_count,
            self.update_mode.tag(),
            self.seed
        )
    }
}

/// File name identifying the output of one role for one configuration.
///
/// Identical inputs always give byte-identical keys; the reference cache and
/// the candidate/reference pairing in verification rely on it.
pub fn artifact_key(config: &TestConfiguration, role: Role, run_id: Option<&str>) -> String {
    let mut key = format!("{}-{}", role.prefix(), config.test_name());
    if let Some(id) = run_id.filter(|id| !id.is_empty()) {
        key.push('-');
        key.push_str(id);
    }
    key.push_str(".txt");
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> TestConfiguration {
        TestConfiguration::new(12, GraphType::Tiled, RatType::Uniform, 10, UpdateMode::Batch)
            .unwrap()
    }

    #[test]
    fn load_factor_for_supported_dimensions() {
        assert_eq!(derive_load_factor(12).unwrap(), 4);
        assert_eq!(derive_load_factor(36).unwrap(), 10);
        assert_eq!(derive_load_factor(60).unwrap(), 25);
        assert_eq!(derive_load_factor(180).unwrap(), 32);
    }

    #[test]
    fn load_factor_rejects_unsupported_dimension() {
        for k in [0, 6, 13, 100, 181] {
            assert!(matches!(
                derive_load_factor(k),
                Err(HarnessError::Configuration(_))
            ));
        }
    }

    #[test]
    fn input_file_names_are_zero_padded() {
        assert_eq!(
            graph_file_name(12, GraphType::Vertical),
            PathBuf::from("g-v012x012.gph")
        );
        assert_eq!(
            rat_file_name(36, RatType::Diagonal, 10),
            PathBuf::from("r-036x036-d10.rats")
        );
        assert_eq!(
            rat_file_name(6, RatType::Uniform, 2),
            PathBuf::from("r-006x006-u2.rats")
        );
    }

    #[test]
    fn artifact_key_layout() {
        let c = sample();
        assert_eq!(
            artifact_key(&c, Role::Reference, None),
            "ref-012-t-u-04-10-b-618.txt"
        );
        assert_eq!(
            artifact_key(&c, Role::Candidate, Some("0427")),
            "tst-012-t-u-04-10-b-618-0427.txt"
        );
        assert_eq!(
            artifact_key(&c, Role::Candidate, Some("")),
            "tst-012-t-u-04-10-b-618.txt"
        );
    }

    #[test]
    fn regression_entry_keeps_explicit_load_factor() {
        let c = TestConfiguration::regression(
            6,
            GraphType::Tiled,
            RatType::Uniform,
            2,
            11,
            UpdateMode::Batch,
            16,
        );
        assert_eq!(artifact_key(&c, Role::Reference, None), "ref-006-t-u-02-11-b-16.txt");
        assert_eq!(
            c.rat_file(Path::new("data")),
            PathBuf::from("data/r-006x006-u2.rats")
        );
    }

    #[test]
    fn moves_counts_nodes_load_and_steps() {
        assert_eq!(sample().moves(), 12 * 12 * 4 * 10);
    }

    fn arb_config() -> impl Strategy<Value = TestConfiguration> {
        (
            1u32..400,
            prop_oneof![
                Just(GraphType::Tiled),
                Just(GraphType::Horizontal),
                Just(GraphType::Vertical),
                Just(GraphType::Parquet)
            ],
            prop_oneof![
                Just(RatType::Uniform),
                Just(RatType::Diagonal),
                Just(RatType::Random)
            ],
            1u32..64,
            1u32..200,
            prop_oneof![
                Just(UpdateMode::Synchronous),
                Just(UpdateMode::Batch),
                Just(UpdateMode::Rat)
            ],
            0u32..1000,
        )
            .prop_map(|(k, g, r, lf, n, u, s)| TestConfiguration::regression(k, g, r, lf, n, u, s))
    }

    proptest! {
        #[test]
        fn prop_artifact_key_is_deterministic(c in arb_config(), id in "[0-9]{0,4}") {
            let copy = c.clone();
            prop_assert_eq!(
                artifact_key(&c, Role::Candidate, Some(&id)),
                artifact_key(&copy, Role::Candidate, Some(&id))
            );
        }

        #[test]
        fn prop_artifact_key_separates_fields(a in arb_config(), b in arb_config()) {
            prop_assume!(a != b);
            prop_assert_ne!(
                artifact_key(&a, Role::Reference, None),
                artifact_key(&b, Role::Reference, None)
            );
        }

        #[test]
        fn prop_artifact_key_separates_roles(c in arb_config()) {
            prop_assert_ne!(
                artifact_key(&c, Role::Reference, None),
                artifact_key(&c, Role::Candidate, None)
            );
        }
    }
}
