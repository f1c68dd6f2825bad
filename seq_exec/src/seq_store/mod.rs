//! # Sequence store
//!
//! A sparse table of recorded joint configurations for one part. Rows are addressed by a stable
//! slot index, and each row carries a duration and a play order rank which together define the
//! sequence that playback walks through.
//!
//! The last slot of the table is a sentinel row: it may hold a configuration but never a rank,
//! and no rank may equal its index.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod entry;
mod store;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use entry::*;
pub use store::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default number of slots in a part's table.
pub const DEFAULT_CAPACITY: usize = 30;

/// Default joint speed given to a new speed slider, and to records loaded without speeds.
///
/// Units: motion-control service units per second (degrees/second on most parts)
pub const DEFAULT_SPEED: f64 = 10.0;

/// Rank of a slot which is not part of the play sequence.
pub const UNRANKED: i32 = -1;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when editing a sequence store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("A table needs at least two slots (one usable and the sentinel), got {0}")]
    InvalidCapacity(usize),

    #[error("Slot {slot} is outside the table (capacity {capacity})")]
    SlotOutOfRange { slot: usize, capacity: usize },

    #[error("Play order {rank} is outside the allowed range [-1, {max_excl})")]
    RankOutOfRange { rank: i32, max_excl: i32 },

    #[error("Slot {0} is the sentinel row and cannot be given a play order")]
    SentinelSlot(usize),

    #[error("Play order {rank} is already used by slot {slot}")]
    DuplicateRank { rank: i32, slot: usize },

    #[error("Timing must be a positive number of seconds, got {0}")]
    InvalidTiming(f64),

    #[error("Slot {0} has not been captured")]
    EmptySlot(usize),

    #[error("Expected {expected} joint values but got {found}")]
    WrongLength { expected: usize, found: usize },
}
