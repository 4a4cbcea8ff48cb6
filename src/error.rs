//! Error kinds raised by the harness. Verification mismatches are outcomes, not errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    /// Invalid or unsupported parameter (unknown dimension, benchmark name, process count).
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// The simulator could not be started at all.
    #[error("failed to launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },
    /// The simulator ran but exited with a non-zero status.
    #[error("command '{command}' gave return code {code}")]
    Exit { command: String, code: i32 },
    /// An output, cache, or comparison file could not be opened, read, or written.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A simulator output stream failed while being compared.
    #[error("failed reading {stream}: {source}")]
    Read {
        stream: String,
        #[source]
        source: io::Error,
    },
}

impl HarnessError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_failure_reports_code() {
        let err = HarnessError::Exit {
            command: "./crun-seq -g g.gph".into(),
            code: 3,
        };
        assert_eq!(
            err.to_string(),
            "command './crun-seq -g g.gph' gave return code 3"
        );
    }

    #[test]
    fn configuration_error_names_the_problem() {
        let err = HarnessError::Configuration("unsupported dimension 7".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: unsupported dimension 7"
        );
    }
}
