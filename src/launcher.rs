//! Launcher selection: which program runs a simulation and what prefix starts it.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::Role;

/// Host family the harness runs on. Decides MPI binding flags and the reference program.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Machine {
    Ghc,
    Latedays,
    #[default]
    Other,
}

impl Machine {
    /// Classifies a host by its name prefix.
    pub fn from_hostname(host: &str) -> Self {
        if host.starts_with("ghc") || host.starts_with("unix") {
            Machine::Ghc
        } else if host.starts_with("latedays") || host.starts_with("compute") {
            Machine::Latedays
        } else {
            Machine::Other
        }
    }

    /// Process-affinity flags passed to the distributed launcher.
    pub fn binding_flags(self) -> &'static [&'static str] {
        match self {
            Machine::Ghc => &["-map-by", "core", "-bind-to", "core"],
            Machine::Latedays => &["-bycore", "-bind-to-core"],
            Machine::Other => &[],
        }
    }

    /// Hosts with a reference solution can check and score runs.
    pub fn has_reference(self) -> bool {
        !matches!(self, Machine::Other)
    }
}

/// Paths of the programs the harness can invoke.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Programs {
    pub sequential: PathBuf,
    pub distributed: PathBuf,
    /// Distributed-execution launcher, e.g. `mpirun`.
    pub mpi_launcher: String,
    pub reference_ghc: PathBuf,
    pub reference_latedays: PathBuf,
    /// Gold-standard simulator used to fill the regression cache.
    pub regression_reference: PathBuf,
}

impl Default for Programs {
    fn default() -> Self {
        Self {
            sequential: PathBuf::from("./crun-seq"),
            distributed: PathBuf::from("./crun-mpi"),
            mpi_launcher: "mpirun".into(),
            reference_ghc: PathBuf::from("./crun-soln-ghc"),
            reference_latedays: PathBuf::from("./crun-soln-latedays"),
            regression_reference: PathBuf::from("./grun.py"),
        }
    }
}

impl Programs {
    /// Benchmark reference solution for a host, if one exists there.
    pub fn reference_for(&self, machine: Machine) -> Option<&PathBuf> {
        match machine {
            Machine::Ghc => Some(&self.reference_ghc),
            Machine::Latedays => Some(&self.reference_latedays),
            Machine::Other => None,
        }
    }
}

/// Program plus the argument prefix that starts it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Launcher {
    pub prefix: Vec<String>,
    pub program: PathBuf,
}

impl Launcher {
    pub fn sequential(program: PathBuf) -> Self {
        Self {
            prefix: Vec::new(),
            program,
        }
    }

    /// Full argv: prefix, program, then `args`.
    pub fn invocation<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = self.prefix.clone();
        argv.push(self.program.display().to_string());
        argv.extend(args.into_iter().map(Into::into));
        Invocation { argv }
    }
}

/// Pure selection of the launcher for `(process_count, role, machine)`.
///
/// More than one process always goes through the distributed launcher with the
/// machine's binding flags. The program is the machine's reference solution for
/// [`Role::Reference`] (`None` when the host has none), otherwise the sequential or
/// distributed candidate depending on the process count.
pub fn select_launcher(
    process_count: u32,
    role: Role,
    machine: Machine,
    programs: &Programs,
) -> Option<Launcher> {
    let program = match role {
        Role::Reference => programs.reference_for(machine)?.clone(),
        Role::Candidate if process_count > 1 => programs.distributed.clone(),
        Role::Candidate => programs.sequential.clone(),
    };
    let prefix = if process_count > 1 {
        let mut prefix = vec![
            programs.mpi_launcher.clone(),
            "-np".to_string(),
            process_count.to_string(),
        ];
        prefix.extend(machine.binding_flags().iter().map(|f| f.to_string()));
        prefix
    } else {
        Vec::new()
    };
    Some(Launcher { prefix, program })
}

/// Fully formed command line for one external run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub argv: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_from_hostname() {
        assert_eq!(Machine::from_hostname("ghc42.ghc.andrew.cmu.edu"), Machine::Ghc);
        assert_eq!(Machine::from_hostname("unix3"), Machine::Ghc);
        assert_eq!(Machine::from_hostname("latedays"), Machine::Latedays);
        assert_eq!(Machine::from_hostname("compute-0-12"), Machine::Latedays);
        assert_eq!(Machine::from_hostname("laptop"), Machine::Other);
        assert_eq!(Machine::from_hostname(""), Machine::Other);
    }

    #[test]
    fn single_process_candidate_is_sequential() {
        let p = Programs::default();
        let l = select_launcher(1, Role::Candidate, Machine::Ghc, &p).unwrap();
        assert!(l.prefix.is_empty());
        assert_eq!(l.program, PathBuf::from("./crun-seq"));
    }

    #[test]
    fn multi_process_candidate_uses_mpi_with_binding_flags() {
        let p = Programs::default();
        let l = select_launcher(6, Role::Candidate, Machine::Ghc, &p).unwrap();
        assert_eq!(l.program, PathBuf::from("./crun-mpi"));
        assert_eq!(
            l.prefix,
            vec!["mpirun", "-np", "6", "-map-by", "core", "-bind-to", "core"]
        );
        let l = select_launcher(4, Role::Candidate, Machine::Other, &p).unwrap();
        assert_eq!(l.prefix, vec!["mpirun", "-np", "4"]);
    }

    #[test]
    fn reference_program_depends_on_machine() {
        let p = Programs::default();
        let l = select_launcher(12, Role::Reference, Machine::Latedays, &p).unwrap();
        assert_eq!(l.program, PathBuf::from("./crun-soln-latedays"));
        assert_eq!(l.prefix[3..], ["-bycore", "-bind-to-core"]);
        assert!(select_launcher(1, Role::Reference, Machine::Other, &p).is_none());
    }

    #[test]
    fn invocation_joins_prefix_program_and_args() {
        let l = Launcher::sequential(PathBuf::from("./crun-seq"));
        let inv = l.invocation(["-g", "data/g.gph", "-q"]);
        assert_eq!(inv.program(), Some("./crun-seq"));
        assert_eq!(inv.args().len(), 3);
        assert_eq!(inv.to_string(), "./crun-seq -g data/g.gph -q");
    }
}
