//! # Sequence persistence
//!
//! Saves and loads a part's sequence table to the legacy group file format:
//!
//! ```text
//! [POSITION0]
//! jointPositions 0.00 12.50 -3.00
//! jointVelocities 10.00 10.00 10.00
//! timing 1.00
//! ```
//!
//! A file belongs to exactly one part, recorded in its extension (`pos<label>`), so saving every
//! part with one base name gives one file per part.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod codec;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub use codec::{load, save};

use crate::seq_store::{SequenceStore, StoreError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Result of loading a sequence file.
#[derive(Debug)]
pub struct LoadReport {
    /// The table rebuilt from the file.
    pub store: SequenceStore,

    /// The file held more records than the table can take.
    pub truncated: bool,

    /// Indexes of records skipped because they were missing or had the wrong number of joints.
    pub skipped: Vec<usize>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("{0:?} does not name a file")]
    InvalidPath(PathBuf),

    #[error("{path:?} is not a sequence for this part, expected the extension .{expected}")]
    WrongExtension { path: PathBuf, expected: String },

    #[error("Could not access {0:?}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("Malformed sequence file at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("The sequence file has no valid first record (POSITION0)")]
    MissingFirstRecord,

    #[error("The first record has {found} joints but the part has {expected}")]
    FirstRecordWrongLength { expected: usize, found: usize },

    #[error("There is nothing to save, slot 0 is empty or has no timing")]
    NothingToSave,

    #[error("Could not rebuild the table: {0}")]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Extension of the sequence files of a part.
pub fn extension_for(part_label: &str) -> String {
    format!("pos{}", part_label)
}

/// Path of the part's file for the given base path.
///
/// The part extension is appended to the whole file name, `walk.v1` becomes
/// `walk.v1.pos<label>`. Returns `None` if `base` does not name a file.
pub fn part_file(base: &Path, part_label: &str) -> Option<PathBuf> {
    let mut name: OsString = base.file_name()?.to_os_string();
    name.push(".");
    name.push(extension_for(part_label));

    Some(base.with_file_name(name))
}
