//! # Equipment Interface
//!
//! This module defines the interfaces the engine uses to drive equipment.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod motion;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use motion::{ControlMode, JointVector, MotionControl, MotionError};
