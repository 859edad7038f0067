//! Simulation harnesses for the UART communication and monitoring designs.

mod harness;

pub use harness::{BUILD_ARGS, BUILTIN_HARNESSES, Harness, ResolvedBuild, run_harness};
