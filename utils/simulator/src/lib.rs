//! Stimulus schedules and the cooperative sequencer that plays them.
//!
//! A [`Scenario`] describes what a harness drives into its DUT. The
//! [`Sequencer`] executes it on a single simulated timeline against any
//! [`Dut`], usually a recording [`Trace`].

mod logic;
mod scenario;
mod sequencer;
mod trace;

pub use logic::{Logic, TimeUnit};
pub use scenario::{ClockSpec, Scenario, Step};
pub use sequencer::{
    ClockProcess, Dut, Process, Resume, RunSummary, ScenarioProcess, Sequencer, TaskId,
};
pub use trace::Trace;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("DUT has no signal named '{0}'")]
    UnknownSignal(String),
    #[error("'{0}' is not a single-bit logic value")]
    InvalidLogicValue(u8),
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
    #[error("write to '{signal}' at {time} precedes its last change at {last}")]
    TimeReversal { signal: String, last: u64, time: u64 },
}

/// Play `scenario` against a fresh trace that exposes exactly the driven signals
pub fn simulate(scenario: &Scenario, until: Option<u64>) -> Result<(Trace, RunSummary), SimError> {
    let mut trace = Trace::with_ports(scenario.driven_signals());
    let mut sequencer = Sequencer::for_scenario(scenario)?;
    let summary = sequencer.run(&mut trace, until)?;
    log::info!(
        "Scenario {} {} at {}{} ({} wakeups)",
        scenario.name,
        if summary.completed { "completed" } else { "stopped" },
        summary.end_time,
        scenario.time_unit,
        summary.wakeups
    );
    Ok((trace, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulate_rejects_overflowing_schedule() {
        let scenario = Scenario::new("t").wait(1).wait(u64::MAX);
        assert!(matches!(
            simulate(&scenario, None),
            Err(SimError::InvalidScenario(_))
        ));
    }
}
