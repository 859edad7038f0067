use std::{cmp::Reverse, collections::BinaryHeap};

use crate::{ClockSpec, Logic, Scenario, SimError, Step};

/// Signal interface of a device under test
pub trait Dut {
    fn write(&mut self, time: u64, signal: &str, value: Logic) -> Result<(), SimError>;
}

/// What a process asks for when it yields back to the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Wake me at this absolute time
    At(u64),
    Done,
}

/// Cooperative task multiplexed on the sequencer's timeline
pub trait Process {
    fn resume(&mut self, now: u64, dut: &mut dyn Dut) -> Result<Resume, SimError>;
}

pub type TaskId = usize;

/// Outcome of a sequencer run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub end_time: u64,
    /// False when the horizon cut the scenario short
    pub completed: bool,
    pub wakeups: u64,
}

/// Toggles a signal forever, starting at the clock's configured level
pub struct ClockProcess {
    signal: String,
    high_time: u64,
    low_time: u64,
    level: Logic,
}

impl ClockProcess {
    pub fn new(spec: &ClockSpec) -> Self {
        Self {
            signal: spec.signal.clone(),
            high_time: spec.high_time(),
            low_time: spec.low_time(),
            level: Logic::from(spec.start_high),
        }
    }
}

impl Process for ClockProcess {
    fn resume(&mut self, now: u64, dut: &mut dyn Dut) -> Result<Resume, SimError> {
        dut.write(now, &self.signal, self.level)?;
        let hold = match self.level {
            Logic::One => self.high_time,
            _ => self.low_time,
        };
        self.level = self.level.inverted();
        // an edge past the end of the time counter can never be reached
        Ok(now.checked_add(hold).map_or(Resume::Done, Resume::At))
    }
}

/// Walks a scenario's steps, suspending at every wait
pub struct ScenarioProcess {
    inputs: Vec<String>,
    steps: Vec<Step>,
    cursor: usize,
    started: bool,
}

impl ScenarioProcess {
    pub fn new(scenario: &Scenario) -> Self {
        Self {
            inputs: scenario.inputs().into_iter().map(str::to_owned).collect(),
            steps: scenario.steps.clone(),
            cursor: 0,
            started: false,
        }
    }
}

impl Process for ScenarioProcess {
    fn resume(&mut self, now: u64, dut: &mut dyn Dut) -> Result<Resume, SimError> {
        if !self.started {
            self.started = true;
            for input in &self.inputs {
                dut.write(now, input, Logic::Zero)?;
            }
        }

        while let Some(step) = self.steps.get(self.cursor) {
            self.cursor += 1;
            match step {
                Step::Set { signal, value } => dut.write(now, signal, *value)?,
                Step::Wait(duration) => {
                    let at = now.checked_add(*duration).ok_or_else(|| {
                        SimError::InvalidScenario(format!(
                            "wait of {duration} at {now} overflows the time counter"
                        ))
                    })?;
                    return Ok(Resume::At(at));
                }
            }
        }

        Ok(Resume::Done)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Wakeup {
    at: u64,
    seq: u64,
    task: TaskId,
}

/// Single-threaded discrete-event scheduler
///
/// The first spawned task is the main task; the run ends as soon as it
/// finishes and every other task is dropped. Wakeups at equal times are served
/// in the order they were scheduled.
pub struct Sequencer {
    now: u64,
    next_seq: u64,
    queue: BinaryHeap<Reverse<Wakeup>>,
    tasks: Vec<Option<Box<dyn Process>>>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_seq: 0,
            queue: BinaryHeap::new(),
            tasks: Vec::new(),
        }
    }

    /// Scenario as the main task, followed by its clock
    pub fn for_scenario(scenario: &Scenario) -> Result<Self, SimError> {
        scenario.validate()?;

        let mut sequencer = Self::new();
        sequencer.spawn(Box::new(ScenarioProcess::new(scenario)));
        if let Some(clock) = &scenario.clock {
            sequencer.spawn(Box::new(ClockProcess::new(clock)));
        }
        Ok(sequencer)
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Schedule a task to start at the current time
    pub fn spawn(&mut self, process: Box<dyn Process>) -> TaskId {
        let id = self.tasks.len();
        self.tasks.push(Some(process));
        self.schedule(self.now, id);
        id
    }

    fn schedule(&mut self, at: u64, task: TaskId) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Wakeup { at, seq, task }));
    }

    /// Run until the main task finishes or simulated time would pass `until`.
    ///
    /// A horizon earlier than [`Sequencer::now`] returns immediately without
    /// moving time backwards.
    pub fn run(&mut self, dut: &mut dyn Dut, until: Option<u64>) -> Result<RunSummary, SimError> {
        const MAIN: TaskId = 0;

        let mut wakeups = 0;
        while let Some(Reverse(wakeup)) = self.queue.pop() {
            if let Some(limit) = until.filter(|limit| wakeup.at > *limit) {
                self.queue.push(Reverse(wakeup));
                self.now = self.now.max(limit);
                log::debug!("Horizon reached at {} after {} wakeups", self.now, wakeups);
                return Ok(RunSummary {
                    end_time: self.now,
                    completed: false,
                    wakeups,
                });
            }

            self.now = wakeup.at;
            wakeups += 1;

            let Some(process) = self.tasks[wakeup.task].as_mut() else {
                continue;
            };
            match process.resume(self.now, dut)? {
                Resume::At(at) => self.schedule(at, wakeup.task),
                Resume::Done => {
                    self.tasks[wakeup.task] = None;
                    if wakeup.task == MAIN {
                        self.queue.clear();
                        self.tasks.clear();
                        log::debug!("Main task finished at {}", self.now);
                        return Ok(RunSummary {
                            end_time: self.now,
                            completed: true,
                            wakeups,
                        });
                    }
                }
            }
        }

        Ok(RunSummary {
            end_time: self.now,
            completed: true,
            wakeups,
        })
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}
