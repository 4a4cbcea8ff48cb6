//! Regression cache: reference-simulator output kept on disk and reused across runs.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{artifact_key, Role, TestConfiguration};
use crate::error::{HarnessError, Result};
use crate::launcher::Invocation;
use crate::runner::{Executor, SimulationRunner};

/// How a reference output was obtained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheLookup {
    /// Already present; the reference simulator was not run.
    Hit(PathBuf),
    /// Produced by running the reference simulator now.
    Populated(PathBuf),
}

impl CacheLookup {
    pub fn path(&self) -> &Path {
        match self {
            CacheLookup::Hit(p) | CacheLookup::Populated(p) => p,
        }
    }
}

/// One file per (configuration, role) under a single root directory.
///
/// Entries are never invalidated individually; [`RegressionCache::flush`] removes
/// the whole tree. Concurrent users of the same root are not supported.
pub struct RegressionCache {
    root: PathBuf,
}

impl RegressionCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Deletes the entire cache tree, if present.
    pub fn flush(&self) -> Result<()> {
        if self.root.exists() {
            info!(root = %self.root.display(), "flushing regression cache");
            fs::remove_dir_all(&self.root).map_err(|e| HarnessError::io(&self.root, e))?;
        }
        Ok(())
    }

    /// Creates the cache root if needed.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| HarnessError::io(&self.root, e))
    }

    pub fn path_for(&self, config: &TestConfiguration, role: Role) -> PathBuf {
        self.root.join(artifact_key(config, role, None))
    }

    /// Returns the cached reference output for `config`, running `invocation` to produce it on a miss.
    ///
    /// A failed run leaves no file behind, so the next lookup misses again.
    pub fn ensure_reference<E: Executor>(
        &self,
        config: &TestConfiguration,
        invocation: &Invocation,
        runner: &mut SimulationRunner<E>,
    ) -> Result<CacheLookup> {
        let path = self.path_for(config, Role::Reference);
        if path.exists() {
            info!(path = %path.display(), "reference cache hit");
            return Ok(CacheLookup::Hit(path));
        }
        self.prepare()?;
        info!(path = %path.display(), "reference cache miss, running reference simulator");
        match runner.run_once(invocation, Some(&path)) {
            Ok(_) => Ok(CacheLookup::Populated(path)),
            Err(e) => {
                if path.exists() {
                    if let Err(rm) = fs::remove_file(&path) {
                        warn!(
                            path = %path.display(),
                            error = %rm,
                            "could not remove partial cache entry"
                        );
                    }
                }
                Err(e)
            }
        }
    }
}
