//! # Sequence Executable Parameters
//!
//! This module provide parameters for the sequence executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::part_ctrl::{PartCtrlError, PartParams};
use crate::seq_store::{DEFAULT_CAPACITY, DEFAULT_SPEED};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default target period of one cycle of the main loop.
pub const DEFAULT_CYCLE_PERIOD_S: f64 = 0.02;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeqExecParams {
    /// Target period of one cycle of the main loop.
    ///
    /// Units: seconds
    #[serde(default = "default_cycle_period_s")]
    pub cycle_period_s: f64,

    /// Number of slots in every part's sequence table, the last one being the sentinel row.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Initial value of the speed sliders.
    ///
    /// Units: degrees/second
    #[serde(default = "default_speed")]
    pub default_speed: f64,

    /// The parts to open.
    #[serde(default, rename = "part")]
    pub parts: Vec<PartParams>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("The cycle period must be positive, got {0} s")]
    InvalidCyclePeriod(f64),

    #[error("The table capacity must be at least 2, got {0}")]
    InvalidCapacity(usize),

    #[error("The default speed must be positive, got {0}")]
    InvalidDefaultSpeed(f64),

    #[error("Part {0} is configured twice")]
    DuplicatePart(String),

    #[error("Part labels cannot be empty")]
    EmptyLabel,

    #[error("Part {0}: {1}")]
    Part(String, PartCtrlError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SeqExecParams {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(self.cycle_period_s > 0.0) {
            return Err(ParamsError::InvalidCyclePeriod(self.cycle_period_s));
        }
        if self.capacity < 2 {
            return Err(ParamsError::InvalidCapacity(self.capacity));
        }
        if !(self.default_speed > 0.0) {
            return Err(ParamsError::InvalidDefaultSpeed(self.default_speed));
        }

        for (i, part) in self.parts.iter().enumerate() {
            if part.label.trim().is_empty() {
                return Err(ParamsError::EmptyLabel);
            }
            if self.parts[..i].iter().any(|p| p.label == part.label) {
                return Err(ParamsError::DuplicatePart(part.label.clone()));
            }
            part.validate()
                .map_err(|e| ParamsError::Part(part.label.clone(), e))?;
        }

        Ok(())
    }
}

fn default_cycle_period_s() -> f64 {
    DEFAULT_CYCLE_PERIOD_S
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_speed() -> f64 {
    DEFAULT_SPEED
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const PARAMS: &str = r#"
cycle_period_s = 0.05

[[part]]
label = "head"
num_joints = 2
initial_positions = [0.0, 0.0]
max_speeds = [50.0, 50.0]
min_positions = [-40.0, -70.0]
max_positions = [30.0, 60.0]
home_positions = [0.0, 0.0]

[[part]]
label = "left_arm"
num_joints = 1
initial_positions = [0.0]
max_speeds = [20.0]
min_positions = [-90.0]
max_positions = [90.0]
"#;

    #[test]
    fn test_load_params() {
        let p: SeqExecParams = util::params::from_str(PARAMS).unwrap();

        assert_eq!(p.cycle_period_s, 0.05);
        assert_eq!(p.capacity, DEFAULT_CAPACITY);
        assert_eq!(p.default_speed, DEFAULT_SPEED);
        assert_eq!(p.parts.len(), 2);
        assert!(p.parts[1].home_positions.is_none());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_invalid_params() {
        let mut p: SeqExecParams = util::params::from_str(PARAMS).unwrap();
        p.parts[1].label = "head".into();
        assert!(matches!(p.validate(), Err(ParamsError::DuplicatePart(_))));

        let mut p: SeqExecParams = util::params::from_str(PARAMS).unwrap();
        p.parts[0].max_speeds.pop();
        assert!(matches!(p.validate(), Err(ParamsError::Part(_, _))));

        let mut p: SeqExecParams = util::params::from_str(PARAMS).unwrap();
        p.capacity = 1;
        assert!(matches!(p.validate(), Err(ParamsError::InvalidCapacity(1))));
    }
}
