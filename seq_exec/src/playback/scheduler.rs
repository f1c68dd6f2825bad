//! Playback scheduler state machine

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::MotionControl;
use log::{debug, info, trace, warn};

use super::{OneShotTimer, PlaybackError, PlaybackMode, PlaybackState, StepReport, TickOutcome};
use crate::coord_motion;
use crate::seq_store::{SequenceEntry, SequenceStore};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Playback state machine of one part.
///
/// The scheduler does not own the store or the service, both are lent on each call so that the
/// play sequence is re-read at every step.
#[derive(Debug, Default)]
pub struct PlaybackScheduler {
    state: PlaybackState,

    timer: OneShotTimer,

    /// Rank of the last dispatched step.
    last_rank: Option<i32>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    /// Time at which the current step ends, if playing.
    pub fn next_step_at(&self) -> Option<f64> {
        self.timer.deadline()
    }

    /// Start playing, dispatching the first step immediately.
    pub fn start(
        &mut self,
        mode: PlaybackMode,
        store: &SequenceStore,
        motion: &mut dyn MotionControl,
        now_s: f64,
    ) -> Result<StepReport, PlaybackError> {
        if let PlaybackState::Stepping(m) = self.state {
            return Err(PlaybackError::AlreadyStepping(m));
        }

        let first = match store.ordered_entries().first() {
            Some(e) => (*e).clone(),
            None => return Err(PlaybackError::EmptySequence),
        };

        info!("Starting {:?} playback", mode);

        self.state = PlaybackState::Stepping(mode);

        Ok(self.step(mode, &first, motion, now_s))
    }

    /// Advance the playback if the current step's timing has elapsed.
    pub fn tick(
        &mut self,
        store: &SequenceStore,
        motion: &mut dyn MotionControl,
        now_s: f64,
    ) -> TickOutcome {
        let mode = match self.state {
            PlaybackState::Idle => return TickOutcome::Idle,
            PlaybackState::Stepping(m) => m,
        };

        if !self.timer.take_expired(now_s) {
            return TickOutcome::Waiting;
        }

        let entries = store.ordered_entries();

        let next = match self.last_rank {
            Some(last) => entries.iter().find(|e| e.play_order > last),
            None => entries.first(),
        };

        let next = match next {
            Some(e) => Some(*e),
            None if mode.is_cyclic() => entries.first().copied(),
            None => None,
        };

        match next.cloned() {
            Some(entry) => TickOutcome::Stepped(self.step(mode, &entry, motion, now_s)),
            None => {
                if entries.is_empty() {
                    info!("Sequence emptied during playback, stopping");
                } else {
                    info!("End of sequence reached");
                }
                self.reset();
                TickOutcome::Finished
            }
        }
    }

    /// Stop playing. Returns true if a playback was running.
    pub fn stop(&mut self) -> bool {
        let was_stepping = !self.state.is_idle();

        if was_stepping {
            info!("Playback stopped");
        }
        self.reset();

        was_stepping
    }

    /// Single move to an entry, outside of any playback.
    pub fn go_to(
        &self,
        entry: &SequenceEntry,
        motion: &mut dyn MotionControl,
    ) -> Result<StepReport, PlaybackError> {
        if !self.state.is_idle() {
            return Err(PlaybackError::NotIdle);
        }

        debug!("Single move to slot {}", entry.slot);

        Ok(dispatch(false, entry, motion))
    }

    fn step(
        &mut self,
        mode: PlaybackMode,
        entry: &SequenceEntry,
        motion: &mut dyn MotionControl,
        now_s: f64,
    ) -> StepReport {
        let report = dispatch(mode.is_timed(), entry, motion);

        self.last_rank = Some(entry.play_order);
        self.timer.arm(now_s, entry.timing);

        report
    }

    fn reset(&mut self) {
        self.state = PlaybackState::Idle;
        self.timer.cancel();
        self.last_rank = None;
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Send one step to the service.
///
/// Service failures are logged and reported in the step, they never stop a playback.
fn dispatch(timed: bool, entry: &SequenceEntry, motion: &mut dyn MotionControl) -> StepReport {
    let mut accepted = true;

    let speeds = if timed {
        let solved = motion
            .encoders()
            .map_err(|e| e.to_string())
            .and_then(|current| {
                coord_motion::solve(&current, &entry.positions, entry.timing)
                    .map_err(|e| e.to_string())
            });

        match solved {
            Ok(s) => s,
            Err(e) => {
                warn!(
                    "Could not compute coordinated speeds for slot {}, using recorded speeds: {}",
                    entry.slot, e
                );
                accepted = false;
                entry.speeds.clone()
            }
        }
    } else {
        entry.speeds.clone()
    };

    if let Err(e) = motion.set_ref_speeds(&speeds) {
        warn!("Could not set speeds for slot {}: {}", entry.slot, e);
        accepted = false;
    }

    if let Err(e) = motion.position_move(&entry.positions) {
        warn!("Could not move to slot {}: {}", entry.slot, e);
        accepted = false;
    }

    trace!(
        "Dispatched slot {} (rank {}): positions {:?}, speeds {:?}",
        entry.slot,
        entry.play_order,
        entry.positions,
        speeds
    );

    StepReport {
        slot: entry.slot,
        rank: entry.play_order,
        positions: entry.positions.clone(),
        speeds,
        accepted,
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
