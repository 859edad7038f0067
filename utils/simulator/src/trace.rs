use std::{collections::HashMap, io::Write};

use crate::{Dut, Logic, SimError, TimeUnit};

/// Recording DUT: keeps every value change of its declared ports
#[derive(Debug, Default, Clone)]
pub struct Trace {
    ports: Vec<String>,
    changes: HashMap<String, Vec<(u64, Logic)>>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ports<I, S>(ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut trace = Self::new();
        for port in ports {
            trace.declare(port);
        }
        trace
    }

    pub fn declare(&mut self, port: impl Into<String>) {
        let port = port.into();
        if !self.changes.contains_key(&port) {
            self.changes.insert(port.clone(), Vec::new());
            self.ports.push(port);
        }
    }

    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    /// Every write to `signal` in time order, or `None` for an undeclared port
    pub fn changes(&self, signal: &str) -> Option<&[(u64, Logic)]> {
        self.changes.get(signal).map(Vec::as_slice)
    }

    /// Value held by `signal` at `time`; the last write at that time wins
    pub fn value_at(&self, signal: &str, time: u64) -> Option<Logic> {
        let changes = self.changes.get(signal)?;
        let idx = changes.partition_point(|(t, _)| *t <= time);
        Some(if idx == 0 { Logic::X } else { changes[idx - 1].1 })
    }

    /// Dump the trace as a VCD file with a single scope
    pub fn write_vcd<W: Write>(&self, out: W, scope: &str, unit: TimeUnit) -> std::io::Result<()> {
        let mut writer = vcd::Writer::new(out);
        writer.timescale(1, unit.into())?;
        writer.add_module(scope)?;
        let mut ids = Vec::with_capacity(self.ports.len());
        for port in &self.ports {
            ids.push(writer.add_wire(1, port)?);
        }
        writer.upscope()?;
        writer.enddefinitions()?;

        let mut events: Vec<(u64, usize, Logic)> = Vec::new();
        for (idx, port) in self.ports.iter().enumerate() {
            if let Some(changes) = self.changes.get(port) {
                events.extend(changes.iter().map(|(t, v)| (*t, idx, *v)));
            }
        }
        // stable sort keeps same-time writes to one port in program order
        events.sort_by_key(|(t, _, _)| *t);

        writer.timestamp(0)?;
        for id in &ids {
            writer.change_scalar(*id, vcd::Value::X)?;
        }
        let mut current = 0;
        for (time, idx, value) in events {
            if time != current {
                writer.timestamp(time)?;
                current = time;
            }
            writer.change_scalar(ids[idx], value)?;
        }
        Ok(())
    }
}

impl Dut for Trace {
    fn write(&mut self, time: u64, signal: &str, value: Logic) -> Result<(), SimError> {
        let changes = self
            .changes
            .get_mut(signal)
            .ok_or_else(|| SimError::UnknownSignal(signal.to_owned()))?;
        if let Some((last, _)) = changes.last() {
            if *last > time {
                return Err(SimError::TimeReversal {
                    signal: signal.to_owned(),
                    last: *last,
                    time,
                });
            }
        }
        changes.push((time, value));
        Ok(())
    }
}
