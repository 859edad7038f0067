use std::fmt;

use serde::Deserialize;

use crate::SimError;

/// Value of a single-bit signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u8")]
pub enum Logic {
    Zero,
    One,
    /// Not driven yet
    X,
}

impl Logic {
    /// Verilog literal, e.g. `1'b1`
    pub fn verilog_literal(self) -> &'static str {
        match self {
            Logic::Zero => "1'b0",
            Logic::One => "1'b1",
            Logic::X => "1'bx",
        }
    }

    pub fn inverted(self) -> Self {
        match self {
            Logic::Zero => Logic::One,
            Logic::One => Logic::Zero,
            Logic::X => Logic::X,
        }
    }
}

impl From<bool> for Logic {
    fn from(value: bool) -> Self {
        if value { Logic::One } else { Logic::Zero }
    }
}

impl TryFrom<u8> for Logic {
    type Error = SimError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Logic::Zero),
            1 => Ok(Logic::One),
            other => Err(SimError::InvalidLogicValue(other)),
        }
    }
}

impl From<Logic> for vcd::Value {
    fn from(value: Logic) -> Self {
        match value {
            Logic::Zero => vcd::Value::V0,
            Logic::One => vcd::Value::V1,
            Logic::X => vcd::Value::X,
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Logic::Zero => '0',
            Logic::One => '1',
            Logic::X => 'x',
        };
        write!(f, "{c}")
    }
}

/// Unit of simulated time shared by a scenario, its testbench and its trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Fs,
    Ps,
    #[default]
    Ns,
    Us,
    Ms,
    S,
}

impl TimeUnit {
    /// Next finer unit, used as the timescale precision
    pub fn precision(self) -> Self {
        match self {
            TimeUnit::Fs | TimeUnit::Ps => TimeUnit::Fs,
            TimeUnit::Ns => TimeUnit::Ps,
            TimeUnit::Us => TimeUnit::Ns,
            TimeUnit::Ms => TimeUnit::Us,
            TimeUnit::S => TimeUnit::Ms,
        }
    }
}

impl From<TimeUnit> for vcd::TimescaleUnit {
    fn from(unit: TimeUnit) -> Self {
        match unit {
            TimeUnit::Fs => vcd::TimescaleUnit::FS,
            TimeUnit::Ps => vcd::TimescaleUnit::PS,
            TimeUnit::Ns => vcd::TimescaleUnit::NS,
            TimeUnit::Us => vcd::TimescaleUnit::US,
            TimeUnit::Ms => vcd::TimescaleUnit::MS,
            TimeUnit::S => vcd::TimescaleUnit::S,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeUnit::Fs => "fs",
            TimeUnit::Ps => "ps",
            TimeUnit::Ns => "ns",
            TimeUnit::Us => "us",
            TimeUnit::Ms => "ms",
            TimeUnit::S => "s",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logic_from_integer() {
        assert_eq!(Logic::try_from(0).unwrap(), Logic::Zero);
        assert_eq!(Logic::try_from(1).unwrap(), Logic::One);
        assert!(matches!(
            Logic::try_from(2),
            Err(SimError::InvalidLogicValue(2))
        ));
    }

    #[test]
    fn test_logic_literals() {
        assert_eq!(Logic::One.verilog_literal(), "1'b1");
        assert_eq!(Logic::Zero.inverted(), Logic::One);
        assert_eq!(Logic::X.inverted(), Logic::X);
        assert_eq!(Logic::from(true).to_string(), "1");
    }

    #[test]
    fn test_timescale_precision() {
        assert_eq!(TimeUnit::default(), TimeUnit::Ns);
        assert_eq!(TimeUnit::Ns.precision(), TimeUnit::Ps);
        assert_eq!(TimeUnit::Fs.precision(), TimeUnit::Fs);
        assert_eq!(TimeUnit::Us.to_string(), "us");
    }
}
