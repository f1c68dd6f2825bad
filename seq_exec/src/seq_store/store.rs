//! Sequence store implementation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::JointVector;
use log::trace;

use super::{SequenceEntry, StoreError, UNRANKED};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The sequence table of one part.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceStore {
    num_joints: usize,

    slots: Vec<Option<SequenceEntry>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SequenceStore {
    /// Create an empty table of `capacity` slots for a part with `num_joints` joints.
    pub fn new(capacity: usize, num_joints: usize) -> Result<Self, StoreError> {
        if capacity < 2 {
            return Err(StoreError::InvalidCapacity(capacity));
        }

        Ok(Self {
            num_joints,
            slots: vec![None; capacity],
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn num_joints(&self) -> usize {
        self.num_joints
    }

    /// Index of the sentinel row, which can never be ranked.
    pub fn sentinel_slot(&self) -> usize {
        self.slots.len() - 1
    }

    /// Number of captured rows, ranked or not.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn entry(&self, slot: usize) -> Option<&SequenceEntry> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    /// Captured rows in slot order.
    pub fn entries(&self) -> impl Iterator<Item = &SequenceEntry> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    /// Write positions and speeds into a slot.
    ///
    /// A slot captured for the first time gets an unset timing and no rank, an already captured
    /// slot keeps both.
    pub fn capture(
        &mut self,
        slot: usize,
        positions: JointVector,
        speeds: JointVector,
    ) -> Result<(), StoreError> {
        self.check_slot(slot)?;
        self.check_len(&positions)?;
        self.check_len(&speeds)?;

        match &mut self.slots[slot] {
            Some(e) => {
                e.positions = positions;
                e.speeds = speeds;
            }
            s => *s = Some(SequenceEntry::new(slot, positions, speeds)),
        }

        trace!("Captured slot {}", slot);

        Ok(())
    }

    /// Set the play order rank of a slot.
    ///
    /// `rank` must be in `[-1, capacity - 1)`, the sentinel slot only accepts `-1` and a rank may
    /// only be held by one slot. Nothing is changed on error.
    pub fn set_play_order(&mut self, slot: usize, rank: i32) -> Result<(), StoreError> {
        self.check_slot(slot)?;

        let max_excl = self.sentinel_slot() as i32;
        if rank < UNRANKED || rank >= max_excl {
            return Err(StoreError::RankOutOfRange { rank, max_excl });
        }

        if slot == self.sentinel_slot() && rank != UNRANKED {
            return Err(StoreError::SentinelSlot(slot));
        }

        if self.slots[slot].is_none() {
            return Err(StoreError::EmptySlot(slot));
        }

        if rank != UNRANKED {
            if let Some(other) = self
                .entries()
                .find(|e| e.play_order == rank && e.slot != slot)
            {
                return Err(StoreError::DuplicateRank {
                    rank,
                    slot: other.slot,
                });
            }
        }

        if let Some(e) = &mut self.slots[slot] {
            e.play_order = rank;
        }

        Ok(())
    }

    /// Set the step duration of a slot. Nothing is changed on error.
    pub fn set_timing(&mut self, slot: usize, seconds: f64) -> Result<(), StoreError> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(StoreError::InvalidTiming(seconds));
        }

        self.check_slot(slot)?;

        match &mut self.slots[slot] {
            Some(e) => {
                e.timing = seconds;
                Ok(())
            }
            None => Err(StoreError::EmptySlot(slot)),
        }
    }

    /// The play sequence: ranked rows in ascending rank, cut before the first row without a
    /// timing.
    pub fn ordered_entries(&self) -> Vec<&SequenceEntry> {
        let mut ranked: Vec<&SequenceEntry> = self.entries().filter(|e| e.is_ranked()).collect();

        ranked.sort_by_key(|e| e.play_order);

        ranked.into_iter().take_while(|e| e.has_timing()).collect()
    }

    /// True if there is nothing to play.
    ///
    /// The table may still contain captured rows which are not part of the play sequence.
    pub fn is_empty(&self) -> bool {
        self.ordered_entries().is_empty()
    }

    /// Clear a slot, returning the entry it held.
    pub fn delete(&mut self, slot: usize) -> Result<Option<SequenceEntry>, StoreError> {
        self.check_slot(slot)?;

        Ok(self.slots[slot].take())
    }

    /// Copy of the entry in a slot.
    pub fn copy(&self, slot: usize) -> Result<SequenceEntry, StoreError> {
        self.check_slot(slot)?;

        self.entry(slot).cloned().ok_or(StoreError::EmptySlot(slot))
    }

    /// Paste the positions, speeds and timing of `source` onto a slot.
    ///
    /// The slot keeps its own rank, or gets none if it was empty.
    pub fn paste(&mut self, slot: usize, source: &SequenceEntry) -> Result<(), StoreError> {
        self.check_slot(slot)?;
        self.check_len(&source.positions)?;
        self.check_len(&source.speeds)?;

        let play_order = self.entry(slot).map_or(UNRANKED, |e| e.play_order);

        self.slots[slot] = Some(SequenceEntry {
            slot,
            positions: source.positions.clone(),
            speeds: source.speeds.clone(),
            timing: source.timing,
            play_order,
        });

        Ok(())
    }

    /// Put a complete entry into its slot, replacing any previous content.
    ///
    /// Used when rebuilding a table from a file, the rank is validated as for
    /// [`SequenceStore::set_play_order`].
    pub(crate) fn restore(&mut self, entry: SequenceEntry) -> Result<(), StoreError> {
        let slot = entry.slot;
        let rank = entry.play_order;

        self.capture(slot, entry.positions, entry.speeds)?;

        if let Some(e) = &mut self.slots[slot] {
            e.timing = entry.timing;
        }

        self.set_play_order(slot, rank)
    }

    fn check_slot(&self, slot: usize) -> Result<(), StoreError> {
        if slot >= self.slots.len() {
            Err(StoreError::SlotOutOfRange {
                slot,
                capacity: self.slots.len(),
            })
        } else {
            Ok(())
        }
    }

    fn check_len(&self, values: &[f64]) -> Result<(), StoreError> {
        if values.len() != self.num_joints {
            Err(StoreError::WrongLength {
                expected: self.num_joints,
                found: values.len(),
            })
        } else {
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
