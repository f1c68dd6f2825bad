//! # Sequence library.
//!
//! Joint sequence recording and playback for the parts of an articulated robot. This library
//! allows the executable (and other crates in the workspace) to access items defined inside the
//! sequence crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Activation arbiter - enables global commands only while no part is playing
pub mod arbiter;

/// Sequence application - owns every part and implements the global commands
pub mod app;

/// Coordinated motion solver - speeds which make every joint arrive at the same time
pub mod coord_motion;

/// Executable parameters
pub mod params;

/// Part control module - one sequence table, playback and motion service per robot part
pub mod part_ctrl;

/// Sequence persistence - save and load tables to the legacy group file format
pub mod persist;

/// Playback scheduler - steps through a part's play sequence
pub mod playback;

/// Sequence store - sparse table of recorded joint configurations
pub mod seq_store;

/// Simulated motion-control service
pub mod sim_motion;

/// Telecommand processor - routes intents to the parts
pub mod tc_processor;
