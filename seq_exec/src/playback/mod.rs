//! # Playback
//!
//! Walks a part's play sequence one step at a time. Each step is a single position move, and the
//! next step is dispatched once the current step's timing has elapsed on a cooperative one-shot
//! timer. The scheduler never blocks, it is driven by calls to
//! [`PlaybackScheduler::tick`] from the main loop.
//!
//! ```text
//!          start(mode)                 stop, or end of a run-once pass
//!   Idle ---------------> Stepping(mode) -------------------------------> Idle
//! ```

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod scheduler;
mod timer;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::JointVector;
use serde::{Deserialize, Serialize};

pub use scheduler::*;
pub use timer::OneShotTimer;

use crate::coord_motion::SolveError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A step dispatched to the motion-control service.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub slot: usize,
    pub rank: i32,
    pub positions: JointVector,
    pub speeds: JointVector,

    /// False if the service refused (or could not be reached for) any part of the step.
    pub accepted: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The ways a sequence can be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackMode {
    /// Single pass with the recorded speeds.
    RunOnce,

    /// Single pass with coordinated speeds computed from the step timings.
    RunOnceTimed,

    /// Loop with the recorded speeds.
    Cycle,

    /// Loop with coordinated speeds computed from the step timings.
    CycleTimed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Idle,
    Stepping(PlaybackMode),
}

/// Outcome of a scheduler tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Not playing.
    Idle,

    /// Playing, current step still running.
    Waiting,

    /// The next step was dispatched.
    Stepped(StepReport),

    /// The playback ended and the scheduler went back to idle.
    Finished,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaybackError {
    #[error("There is no sequence to play")]
    EmptySequence,

    #[error("A {0:?} playback is already running")]
    AlreadyStepping(PlaybackMode),

    #[error("Single moves are not allowed during playback")]
    NotIdle,

    #[error("Could not compute coordinated speeds: {0}")]
    Solve(#[from] SolveError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PlaybackMode {
    /// True if step speeds are computed from the timings.
    pub fn is_timed(&self) -> bool {
        matches!(self, PlaybackMode::RunOnceTimed | PlaybackMode::CycleTimed)
    }

    /// True if the sequence wraps around instead of ending.
    pub fn is_cyclic(&self) -> bool {
        matches!(self, PlaybackMode::Cycle | PlaybackMode::CycleTimed)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState::Idle
    }
}

impl PlaybackState {
    pub fn is_idle(&self) -> bool {
        *self == PlaybackState::Idle
    }
}
