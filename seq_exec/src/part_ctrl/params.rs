//! Parameters structure for PartCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::JointVector;
use serde::{Deserialize, Serialize};

use super::PartCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Configuration of one robot part.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PartParams {
    /// Label of the part, also used in the extension of its sequence files.
    pub label: String,

    /// Number of joints in the part.
    pub num_joints: usize,

    // ---- SIMULATION ----
    /// Joint positions when the simulated service starts.
    ///
    /// Units: degrees
    pub initial_positions: Vec<f64>,

    /// Maximum joint speed the service will accept.
    ///
    /// Units: degrees/second
    pub max_speeds: Vec<f64>,

    /// Lowest joint positions.
    ///
    /// Units: degrees
    pub min_positions: Vec<f64>,

    /// Highest joint positions.
    ///
    /// Units: degrees
    pub max_positions: Vec<f64>,

    // ---- HOME ----
    /// Home position used by the home-all command.
    ///
    /// Units: degrees
    #[serde(default)]
    pub home_positions: Option<Vec<f64>>,

    /// Speeds used to reach the home position, defaults to the default speed on every joint.
    ///
    /// Units: degrees/second
    #[serde(default)]
    pub home_speeds: Option<Vec<f64>>,
}

/// Data needed to initialise a PartCtrl.
#[derive(Debug, Clone)]
pub struct PartInit {
    /// Number of slots in the part's table.
    pub capacity: usize,

    /// Initial value of every speed slider.
    pub default_speed: f64,

    pub home: Option<HomeConfig>,
}

/// Home position of a part.
#[derive(Debug, Clone, PartialEq)]
pub struct HomeConfig {
    pub positions: JointVector,
    pub speeds: JointVector,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PartParams {
    /// Check every per-joint list has one value per joint.
    pub fn validate(&self) -> Result<(), PartCtrlError> {
        let lists: [(&'static str, Option<&Vec<f64>>); 6] = [
            ("initial position", Some(&self.initial_positions)),
            ("max speed", Some(&self.max_speeds)),
            ("min position", Some(&self.min_positions)),
            ("max position", Some(&self.max_positions)),
            ("home position", self.home_positions.as_ref()),
            ("home speed", self.home_speeds.as_ref()),
        ];

        for (what, list) in lists.iter() {
            if let Some(l) = list {
                if l.len() != self.num_joints {
                    return Err(PartCtrlError::WrongLength {
                        what: *what,
                        expected: self.num_joints,
                        found: l.len(),
                    });
                }
            }
        }

        Ok(())
    }
}

impl PartInit {
    /// Build the init data of a part from its parameters.
    pub fn from_params(params: &PartParams, capacity: usize, default_speed: f64) -> Self {
        let home = params.home_positions.as_ref().map(|positions| HomeConfig {
            positions: positions.clone(),
            speeds: params
                .home_speeds
                .clone()
                .unwrap_or_else(|| vec![default_speed; positions.len()]),
        });

        Self {
            capacity,
            default_speed,
            home,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate() {
        let mut p = PartParams {
            label: "head".into(),
            num_joints: 2,
            initial_positions: vec![0.0; 2],
            max_speeds: vec![50.0; 2],
            min_positions: vec![-90.0; 2],
            max_positions: vec![90.0; 2],
            home_positions: Some(vec![0.0, 10.0]),
            home_speeds: None,
        };
        assert!(p.validate().is_ok());

        let init = PartInit::from_params(&p, 30, 10.0);
        assert_eq!(init.home.unwrap().speeds, vec![10.0, 10.0]);

        p.home_speeds = Some(vec![1.0]);
        assert!(matches!(
            p.validate(),
            Err(PartCtrlError::WrongLength {
                what: "home speed",
                expected: 2,
                found: 1
            })
        ));
    }
}
