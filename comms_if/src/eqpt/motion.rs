//! # Motion Control Capability Set
//!
//! The engine never talks to a motion-control device directly, it only uses the capabilities
//! listed in [`MotionControl`]. How a capability reaches the device (network, bus, simulation)
//! is up to the implementor.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// One value per joint of a part, in the units of the motion-control service.
///
/// The length is fixed for the lifetime of a part session and equal to
/// [`MotionControl::axis_count`].
pub type JointVector = Vec<f64>;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors reported by a motion-control service.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MotionError {
    #[error("The motion-control service is not reachable")]
    NotConnected,

    #[error("Expected a vector of {expected} values but got {found}")]
    WrongLength { expected: usize, found: usize },

    #[error("Joint {0} does not exist")]
    InvalidJoint(usize),

    #[error("The motion-control service rejected the command: {0}")]
    Rejected(String),
}

/// Control modes a part can be switched into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMode {
    /// Joints are not actuated.
    Idle,

    /// Joints follow absolute position commands.
    Position,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The capability set of a part's motion-control service.
///
/// All calls are blocking round trips from the caller's point of view. No call is required to
/// time out.
pub trait MotionControl {
    /// Number of joints (axes) in the part.
    fn axis_count(&mut self) -> Result<usize, MotionError>;

    /// Current position of every joint.
    fn encoders(&mut self) -> Result<JointVector, MotionError>;

    /// Set the reference speed used by subsequent position moves, one value per joint.
    fn set_ref_speeds(&mut self, speeds: &[f64]) -> Result<(), MotionError>;

    /// Command an absolute position move of every joint.
    fn position_move(&mut self, positions: &[f64]) -> Result<(), MotionError>;

    /// Whether the given joint has reached its last commanded position.
    fn check_motion_done(&mut self, joint: usize) -> Result<bool, MotionError>;

    /// Switch every joint of the part into the given control mode.
    fn set_control_mode(&mut self, mode: ControlMode) -> Result<(), MotionError>;
}
