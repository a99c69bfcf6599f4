use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Product configurations the harness knows how to validate. Each class
/// implies a fixed device count; a partially attached fleet is rejected
/// rather than silently sampled short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
pub enum TopologyClass {
    #[default]
    P100,
    P300,
    Galaxy,
}

impl TopologyClass {
    pub fn expected_devices(&self) -> usize {
        match self {
            TopologyClass::P100 => 1,
            TopologyClass::P300 => 2,
            TopologyClass::Galaxy => 32,
        }
    }
}

impl fmt::Display for TopologyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TopologyClass::P100 => "p100",
            TopologyClass::P300 => "p300",
            TopologyClass::Galaxy => "galaxy",
        };
        write!(f, "{name}")
    }
}

/// Terminal state of a supervised workload run. Exactly one of these is
/// reached; a non-zero exit code still counts as `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { exit: Option<i32> },
    TimedOut,
    Errored,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed { exit: Some(code) } => write!(f, "completed (exit {code})"),
            RunOutcome::Completed { exit: None } => write!(f, "completed (terminated by signal)"),
            RunOutcome::TimedOut => write!(f, "timed out"),
            RunOutcome::Errored => write!(f, "errored"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_device_counts() {
        assert_eq!(TopologyClass::P100.expected_devices(), 1);
        assert_eq!(TopologyClass::P300.expected_devices(), 2);
        assert_eq!(TopologyClass::Galaxy.expected_devices(), 32);
    }

    #[test]
    fn outcome_display() {
        assert_eq!(
            RunOutcome::Completed { exit: Some(0) }.to_string(),
            "completed (exit 0)"
        );
        assert_eq!(RunOutcome::TimedOut.to_string(), "timed out");
    }
}
