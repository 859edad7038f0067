mod config;
mod icarus;
mod runner;
mod sources;
mod utils;
mod verilator;
mod wrapper;

pub use config::{
    DEFAULT_SIMULATOR, Environment, Language, SIMULATOR_VAR, TOPLEVEL_LANG_VAR, VERILOG,
};
pub use icarus::IcarusRunner;
pub use runner::{Backend, BuildSpec, Runner, RunnerError, TestReport, TestSpec, get_runner};
pub use sources::SourceSet;
pub use verilator::VerilatorRunner;
pub use wrapper::render_testbench;

pub use utils::{find_tool, stamp_is_fresh};
