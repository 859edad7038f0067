use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use simulator::Scenario;

use crate::{IcarusRunner, SourceSet, VerilatorRunner};

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("unsupported simulator '{0}' (expected one of: icarus, verilator)")]
    UnsupportedSimulator(String),
    #[error("{backend} cannot build VHDL sources ({count} given)")]
    UnsupportedLanguage { backend: Backend, count: usize },
    #[error("no sources to build for toplevel '{0}'")]
    NoSources(String),
    #[error("toplevel '{0}' has not been built")]
    NotBuilt(String),
    #[error(transparent)]
    Shell(#[from] xshell::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Simulator backends a harness can run on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Icarus,
    Verilator,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Icarus, Backend::Verilator];

    pub fn name(self) -> &'static str {
        match self {
            Backend::Icarus => "icarus",
            Backend::Verilator => "verilator",
        }
    }

    /// Executable that must be on `PATH` for this backend
    pub fn tool(self) -> &'static str {
        match self {
            Backend::Icarus => "iverilog",
            Backend::Verilator => "verilator",
        }
    }

    pub fn runner(self) -> Box<dyn Runner> {
        match self {
            Backend::Icarus => Box::new(IcarusRunner::new()),
            Backend::Verilator => Box::new(VerilatorRunner::new()),
        }
    }
}

impl FromStr for Backend {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Backend::ALL
            .into_iter()
            .find(|backend| backend.name() == s)
            .ok_or_else(|| RunnerError::UnsupportedSimulator(s.to_owned()))
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Look up the runner for a simulator name such as `SIM`'s value
pub fn get_runner(simulator: &str) -> Result<Box<dyn Runner>, RunnerError> {
    Ok(simulator.parse::<Backend>()?.runner())
}

/// Inputs of the build phase
#[derive(Debug, Clone)]
pub struct BuildSpec<'a> {
    pub sources: &'a SourceSet,
    pub hdl_toplevel: &'a str,
    /// Rebuild even when the previous build is newer than every source
    pub always: bool,
    /// Passed to the backend's compiler verbatim
    pub build_args: &'a [String],
    pub build_dir: &'a Path,
}

/// Inputs of the test phase
#[derive(Debug, Clone)]
pub struct TestSpec<'a> {
    pub hdl_toplevel: &'a str,
    /// Stimulus module; its name is the test module's name
    pub test_module: &'a Scenario,
    pub waves: bool,
    pub verbose: bool,
    pub build_dir: &'a Path,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestReport {
    pub test_module: String,
    pub testbench: PathBuf,
    pub waveform: Option<PathBuf>,
}

/// State a backend keeps between its build and test phases
#[derive(Debug, Clone)]
pub(crate) struct BuiltDesign {
    pub toplevel: String,
    pub sources: Vec<PathBuf>,
    pub build_args: Vec<String>,
}

impl BuiltDesign {
    /// Check that `spec` is something `backend` can compile
    pub fn from_spec(backend: Backend, spec: &BuildSpec<'_>) -> Result<Self, RunnerError> {
        if !spec.sources.vhdl.is_empty() {
            return Err(RunnerError::UnsupportedLanguage {
                backend,
                count: spec.sources.vhdl.len(),
            });
        }
        if spec.sources.verilog.is_empty() {
            return Err(RunnerError::NoSources(spec.hdl_toplevel.to_owned()));
        }
        Ok(Self {
            toplevel: spec.hdl_toplevel.to_owned(),
            sources: spec.sources.verilog.clone(),
            build_args: spec.build_args.to_vec(),
        })
    }

    pub fn require<'a>(built: Option<&'a Self>, toplevel: &str) -> Result<&'a Self, RunnerError> {
        built
            .filter(|design| design.toplevel == toplevel)
            .ok_or_else(|| RunnerError::NotBuilt(toplevel.to_owned()))
    }
}

/// Capability to build and run a simulation with some external simulator
pub trait Runner {
    fn backend_name(&self) -> &str;

    fn build(&mut self, spec: &BuildSpec<'_>) -> Result<(), RunnerError>;

    fn test(&mut self, spec: &TestSpec<'_>) -> Result<TestReport, RunnerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_runner() {
        assert_eq!(get_runner("icarus").unwrap().backend_name(), "icarus");
        assert_eq!(get_runner("verilator").unwrap().backend_name(), "verilator");
        assert!(matches!(
            get_runner("questa"),
            Err(RunnerError::UnsupportedSimulator(name)) if name == "questa"
        ));
    }

    #[test]
    fn test_built_design_rejects_vhdl_and_empty_sources() {
        let vhdl = SourceSet {
            verilog: Vec::new(),
            vhdl: vec![PathBuf::from("/proj/")],
        };
        let spec = BuildSpec {
            sources: &vhdl,
            hdl_toplevel: "serialCom",
            always: true,
            build_args: &[],
            build_dir: Path::new("sim_build"),
        };
        assert!(matches!(
            BuiltDesign::from_spec(Backend::Verilator, &spec),
            Err(RunnerError::UnsupportedLanguage { backend: Backend::Verilator, count: 1 })
        ));

        let empty = SourceSet::default();
        let spec = BuildSpec { sources: &empty, ..spec };
        assert!(matches!(
            BuiltDesign::from_spec(Backend::Icarus, &spec),
            Err(RunnerError::NoSources(top)) if top == "serialCom"
        ));
    }

    #[test]
    fn test_test_before_build_fails() {
        assert!(matches!(
            BuiltDesign::require(None, "monit"),
            Err(RunnerError::NotBuilt(top)) if top == "monit"
        ));
    }

    #[test]
    fn test_backend_names_round_trip() {
        for backend in Backend::ALL {
            assert_eq!(backend.name().parse::<Backend>().unwrap(), backend);
        }
        assert_eq!(Backend::Icarus.tool(), "iverilog");
    }
}
