//! # Telemetry module
//!
//! Events produced by the sequence engine for the front-end. Every event carries the label of
//! the part it concerns, except for the global enablement event.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::eqpt::JointVector;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// An event raised by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeqEvent {
    /// The part's sequence table changed and should be redrawn.
    TableChanged { part: String },

    /// A playback started on the part.
    SequenceActivated { part: String },

    /// The part's playback ended or was stopped.
    SequenceStopped { part: String },

    /// A step was dispatched to the part's motion-control service.
    StepStarted {
        part: String,
        slot: usize,
        positions: JointVector,
        speeds: JointVector,
    },

    /// The part's sliders and table edit controls were enabled or disabled.
    ControlsEnabled { part: String, enabled: bool },

    /// The global (all parts) commands were enabled or disabled.
    GlobalsEnabled { enabled: bool },

    /// An intent for the part failed, with a human readable reason.
    PartError { part: String, msg: String },

    /// A non-fatal notice for the part, for example a truncated load.
    Notice { part: String, msg: String },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SeqEvent {
    /// The label of the part the event concerns, if any.
    pub fn part(&self) -> Option<&str> {
        match self {
            SeqEvent::TableChanged { part }
            | SeqEvent::SequenceActivated { part }
            | SeqEvent::SequenceStopped { part }
            | SeqEvent::StepStarted { part, .. }
            | SeqEvent::ControlsEnabled { part, .. }
            | SeqEvent::PartError { part, .. }
            | SeqEvent::Notice { part, .. } => Some(part),
            SeqEvent::GlobalsEnabled { .. } => None,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
