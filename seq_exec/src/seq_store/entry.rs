//! Sequence table rows

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::JointVector;
use serde::{Deserialize, Serialize};

use super::UNRANKED;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A recorded joint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceEntry {
    /// Index of the row in the table, never renumbered.
    pub slot: usize,

    /// Joint positions to move to.
    pub positions: JointVector,

    /// Per-joint reference speeds used by the untimed playback modes.
    pub speeds: JointVector,

    /// Duration of the step in seconds. A value `<= 0` marks the row as unset and terminates the
    /// play sequence.
    pub timing: f64,

    /// Rank of the row in the play sequence, or [`UNRANKED`].
    pub play_order: i32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SequenceEntry {
    /// A freshly captured row, with unset timing and no rank.
    pub fn new(slot: usize, positions: JointVector, speeds: JointVector) -> Self {
        Self {
            slot,
            positions,
            speeds,
            timing: 0.0,
            play_order: UNRANKED,
        }
    }

    pub fn is_ranked(&self) -> bool {
        self.play_order != UNRANKED
    }

    /// True if the row's timing is set, i.e. it does not terminate a sequence.
    pub fn has_timing(&self) -> bool {
        self.timing > 0.0
    }
}
