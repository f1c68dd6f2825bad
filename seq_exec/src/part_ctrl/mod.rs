//! # Part control module
//!
//! One [`PartCtrl`] runs per robot part (arm, head, torso, ...). It owns the part's sequence
//! table, its playback scheduler and its motion-control service, and turns the front-end's
//! intents into edits, moves and playbacks. Everything the front-end should redraw is reported
//! as a [`comms_if::tm::SeqEvent`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::path::{Path, PathBuf};

pub use params::*;
pub use state::*;

use comms_if::eqpt::MotionError;
use crate::{persist::PersistError, playback::PlaybackError, seq_store::StoreError};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Intents a front-end can raise for one part.
pub trait SeqIntents {
    /// Record the current joint positions and slider speeds into a slot.
    fn capture(&mut self, slot: usize) -> Result<(), PartCtrlError>;

    fn set_timing(&mut self, slot: usize, seconds: f64) -> Result<(), PartCtrlError>;

    fn set_play_order(&mut self, slot: usize, rank: i32) -> Result<(), PartCtrlError>;

    fn select(&mut self, slot: usize) -> Result<(), PartCtrlError>;

    /// Single move to the selected row, which must have a timing.
    fn go_selected(&mut self) -> Result<(), PartCtrlError>;

    fn run(&mut self) -> Result<(), PartCtrlError>;

    fn run_timed(&mut self) -> Result<(), PartCtrlError>;

    fn cycle(&mut self) -> Result<(), PartCtrlError>;

    fn cycle_timed(&mut self) -> Result<(), PartCtrlError>;

    /// Stop any playback. Stopping an idle part is not an error.
    fn stop(&mut self) -> Result<(), PartCtrlError>;

    /// Save the table, returning the path actually written.
    fn save(&mut self, path: &Path) -> Result<PathBuf, PartCtrlError>;

    /// Replace the table with one loaded from a file saved for this part.
    fn load(&mut self, path: &Path) -> Result<(), PartCtrlError>;

    fn delete(&mut self, slot: usize) -> Result<(), PartCtrlError>;

    fn copy(&mut self, slot: usize) -> Result<(), PartCtrlError>;

    fn paste(&mut self, slot: usize) -> Result<(), PartCtrlError>;

    fn move_slider(&mut self, joint: usize, position: f64) -> Result<(), PartCtrlError>;

    fn set_slider_speed(&mut self, joint: usize, speed: f64) -> Result<(), PartCtrlError>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during PartCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum PartCtrlError {
    #[error("The part has not been initialised")]
    NotInitialised,

    #[error("Part {0} is playing a sequence, stop it first")]
    Busy(String),

    #[error("No row is selected")]
    NoSelection,

    #[error("Row {0} has no timing")]
    SelectionUnset(usize),

    #[error("Joint {0} does not exist")]
    InvalidJoint(usize),

    #[error("Speed must be a positive number, got {0}")]
    InvalidSpeed(f64),

    #[error("No home position is configured for this part")]
    NoHomeConfig,

    #[error("Nothing has been copied")]
    ClipboardEmpty,

    #[error("Expected {expected} {what} values but got {found}")]
    WrongLength {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("Motion-control error: {0}")]
    Motion(#[from] MotionError),
}
