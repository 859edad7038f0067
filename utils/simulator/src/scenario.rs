use serde::Deserialize;

use crate::{Logic, SimError, TimeUnit};

/// Free-running clock started alongside a scenario
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClockSpec {
    pub signal: String,
    pub period: u64,
    #[serde(default = "default_start_high")]
    pub start_high: bool,
}

fn default_start_high() -> bool {
    true
}

impl ClockSpec {
    /// Time spent high in each period. Odd periods give the extra unit to the high phase.
    pub fn high_time(&self) -> u64 {
        self.period - self.period / 2
    }

    pub fn low_time(&self) -> u64 {
        self.period / 2
    }
}

/// One entry of a stimulus schedule
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Set { signal: String, value: Logic },
    Wait(u64),
}

/// Ordered stimulus schedule driven into a DUT
///
/// `name` doubles as the name of the stimulus module handed to the simulator.
/// Every signal written by a `Set` step is an input of the DUT and starts at `0`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub time_unit: TimeUnit,
    #[serde(default)]
    pub clock: Option<ClockSpec>,
    /// Written in YAML as single-key maps, e.g. `- wait: 90`
    #[serde(default, deserialize_with = "yaml_serde::with::singleton_map_recursive::deserialize")]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time_unit: TimeUnit::default(),
            clock: None,
            steps: Vec::new(),
        }
    }

    pub fn time_unit(mut self, unit: TimeUnit) -> Self {
        self.time_unit = unit;
        self
    }

    /// Start a clock that begins high
    pub fn clock(mut self, signal: impl Into<String>, period: u64) -> Self {
        self.clock = Some(ClockSpec {
            signal: signal.into(),
            period,
            start_high: true,
        });
        self
    }

    pub fn set(mut self, signal: impl Into<String>, value: Logic) -> Self {
        self.steps.push(Step::Set {
            signal: signal.into(),
            value,
        });
        self
    }

    pub fn wait(mut self, duration: u64) -> Self {
        self.steps.push(Step::Wait(duration));
        self
    }

    /// Signals written by the schedule, in first-appearance order
    pub fn inputs(&self) -> Vec<&str> {
        let mut inputs: Vec<&str> = Vec::new();
        for step in &self.steps {
            if let Step::Set { signal, .. } = step {
                if !inputs.contains(&signal.as_str()) {
                    inputs.push(signal);
                }
            }
        }
        inputs
    }

    /// Every signal the scenario drives, clock first
    pub fn driven_signals(&self) -> Vec<&str> {
        let mut signals: Vec<&str> = self.clock.iter().map(|c| c.signal.as_str()).collect();
        signals.extend(self.inputs());
        signals
    }

    /// Simulated time at which the schedule completes, or `None` if it does not fit in `u64`
    pub fn duration(&self) -> Option<u64> {
        self.steps.iter().try_fold(0u64, |total, step| match step {
            Step::Wait(duration) => total.checked_add(*duration),
            Step::Set { .. } => Some(total),
        })
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.name.is_empty() {
            return Err(SimError::InvalidScenario(
                "scenario name must not be empty".into(),
            ));
        }
        if let Some(clock) = &self.clock {
            if clock.period < 2 {
                return Err(SimError::InvalidScenario(format!(
                    "clock period {} on '{}' is shorter than two time units",
                    clock.period, clock.signal
                )));
            }
            if self.inputs().contains(&clock.signal.as_str()) {
                return Err(SimError::InvalidScenario(format!(
                    "clock signal '{}' is also written by the schedule",
                    clock.signal
                )));
            }
        }
        if self.duration().is_none() {
            return Err(SimError::InvalidScenario(format!(
                "total wait of '{}' overflows the time counter",
                self.name
            )));
        }
        Ok(())
    }
}
