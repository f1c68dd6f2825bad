//! # Sequence telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// An intent raised for a single part's sequence table and playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeqCmd {
    /// Record the part's current joint positions and slider speeds into the given slot.
    Capture { slot: usize },

    /// Set the duration of a slot's step, in seconds.
    SetTiming { slot: usize, seconds: f64 },

    /// Set the play order rank of a slot, `-1` removes it from the play sequence.
    SetPlayOrder { slot: usize, rank: i32 },

    /// Select a row of the table.
    Select { slot: usize },

    /// Move once to the selected row.
    GoSelected,

    /// Play the sequence once using the recorded joint speeds.
    Run,

    /// Play the sequence once using coordinated speeds computed from the timings.
    RunTimed,

    /// Play the sequence in a loop using the recorded joint speeds.
    Cycle,

    /// Play the sequence in a loop using coordinated speeds computed from the timings.
    CycleTimed,

    /// Stop any playback.
    Stop,

    /// Save the sequence. The part's extension is appended to the given path.
    Save { path: PathBuf },

    /// Load a sequence previously saved for this part.
    Load { path: PathBuf },

    /// Clear a row of the table.
    Delete { slot: usize },

    /// Copy a row into the part's row clipboard.
    Copy { slot: usize },

    /// Paste the row clipboard onto a row.
    Paste { slot: usize },

    /// Move one joint's position slider, commanding the part to the new slider positions.
    MoveSlider { joint: usize, position: f64 },

    /// Set one joint's speed slider.
    SetSliderSpeed { joint: usize, speed: f64 },
}

/// An intent applying to every open part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalCmd {
    /// Every part moves once to its selected row.
    GoAll,

    /// Every part plays its sequence once with recorded speeds.
    RunAll,

    /// Every part plays its sequence once with coordinated speeds.
    RunTimeAll,

    /// Every part cycles its sequence with recorded speeds.
    CycleAll,

    /// Every part cycles its sequence with coordinated speeds.
    CycleTimeAll,

    /// Every part saves its sequence using one base path.
    SaveAll { path: PathBuf },

    /// Every part loads its sequence from one base path.
    LoadAll { path: PathBuf },

    /// Every part stops its playback.
    StopAll,

    /// Every part moves to its configured home position.
    HomeAll,

    /// Every part stops and its joints are switched to idle.
    IdleAll,

    /// Every part is switched to position control and its sliders re-synced.
    RunAllParts,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GlobalCmd {
    /// Whether the command may be issued while a part is playing a sequence.
    pub fn allowed_during_playback(&self) -> bool {
        matches!(self, GlobalCmd::StopAll)
    }
}
