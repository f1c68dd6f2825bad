//! Implementations for the PartCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Internal
use super::{HomeConfig, PartCtrlError, PartInit, SeqIntents};
use crate::{
    persist,
    playback::{PlaybackMode, PlaybackScheduler, PlaybackState, StepReport, TickOutcome},
    seq_store::{SequenceEntry, SequenceStore, StoreError},
};
use comms_if::{
    eqpt::{ControlMode, JointVector, MotionControl},
    tm::SeqEvent,
};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Part control module state
pub struct PartCtrl {
    label: String,

    motion: Box<dyn MotionControl>,

    /// Sequence table, `None` until initialised.
    store: Option<SequenceStore>,

    scheduler: PlaybackScheduler,

    num_joints: usize,

    /// Last commanded slider positions.
    slider_positions: JointVector,

    /// Speed slider values, recorded by capture and used by slider moves.
    slider_speeds: JointVector,

    selection: Option<usize>,

    clipboard: Option<SequenceEntry>,

    home: Option<HomeConfig>,

    /// Time of the current cycle.
    now_s: f64,

    /// Events raised since they were last taken.
    events: Vec<SeqEvent>,
}

/// Status report for PartCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug, PartialEq)]
pub struct StatusReport {
    pub state: PlaybackState,

    /// Number of captured rows.
    pub num_rows: usize,

    /// Number of rows in the play sequence.
    pub num_steps: usize,

    pub selection: Option<usize>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for PartCtrl {
    type InitData = PartInit;
    type InitError = PartCtrlError;

    type InputData = f64;
    type OutputData = Vec<SeqEvent>;
    type StatusReport = StatusReport;
    type ProcError = PartCtrlError;

    /// Initialise the PartCtrl module.
    ///
    /// Queries the service for the number of joints and the current positions, and creates an
    /// empty table.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        let n = self.motion.axis_count()?;

        if let Some(home) = &init_data.home {
            check_len("home position", n, &home.positions)?;
            check_len("home speed", n, &home.speeds)?;
        }

        self.store = Some(SequenceStore::new(init_data.capacity, n)?);
        self.num_joints = n;
        self.slider_positions = self.motion.encoders()?;
        self.slider_speeds = vec![init_data.default_speed; n];
        self.home = init_data.home;
        self.selection = None;
        self.clipboard = None;

        info!(
            "{}: {} joints, table of {} slots",
            self.label, n, init_data.capacity
        );

        self.push_controls_enabled(true);

        Ok(())
    }

    /// Perform cyclic processing of Part Control.
    ///
    /// Input data is the current time in seconds. Outputs all events raised since the last
    /// call.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        self.now_s = *input_data;

        let store = self.store.as_ref().ok_or(PartCtrlError::NotInitialised)?;

        match self.scheduler.tick(store, self.motion.as_mut(), self.now_s) {
            TickOutcome::Stepped(r) => self.push_step(r),
            TickOutcome::Finished => self.push_stopped(),
            TickOutcome::Idle | TickOutcome::Waiting => (),
        }

        Ok((self.take_events(), self.status_report()))
    }
}

impl PartCtrl {
    /// Create a new part around its motion-control service. The part must be initialised before
    /// use.
    pub fn new(label: &str, motion: Box<dyn MotionControl>) -> Self {
        Self {
            label: label.to_string(),
            motion,
            store: None,
            scheduler: PlaybackScheduler::new(),
            num_joints: 0,
            slider_positions: Vec::new(),
            slider_speeds: Vec::new(),
            selection: None,
            clipboard: None,
            home: None,
            now_s: 0.0,
            events: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn store(&self) -> Option<&SequenceStore> {
        self.store.as_ref()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn slider_positions(&self) -> &[f64] {
        &self.slider_positions
    }

    pub fn slider_speeds(&self) -> &[f64] {
        &self.slider_speeds
    }

    /// Set the time used by intents raised before the next `proc`.
    pub fn set_time(&mut self, now_s: f64) {
        self.now_s = now_s;
    }

    /// Take all events raised since the last call.
    pub fn take_events(&mut self) -> Vec<SeqEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            state: self.scheduler.state(),
            num_rows: self.store.as_ref().map_or(0, |s| s.len()),
            num_steps: self
                .store
                .as_ref()
                .map_or(0, |s| s.ordered_entries().len()),
            selection: self.selection,
        }
    }

    /// Move to the configured home position.
    pub fn home(&mut self) -> Result<(), PartCtrlError> {
        self.ensure_idle()?;

        let home = self.home.clone().ok_or(PartCtrlError::NoHomeConfig)?;

        self.motion.set_ref_speeds(&home.speeds)?;
        self.motion.position_move(&home.positions)?;
        self.slider_positions = home.positions;

        info!("{}: moving home", self.label);

        Ok(())
    }

    /// Stop any playback and switch the joints to idle.
    pub fn idle(&mut self) -> Result<(), PartCtrlError> {
        self.stop()?;
        self.motion.set_control_mode(ControlMode::Idle)?;

        info!("{}: joints idle", self.label);

        Ok(())
    }

    /// Switch the joints to position control and re-sync the sliders to the joints.
    pub fn run_part(&mut self) -> Result<(), PartCtrlError> {
        self.motion.set_control_mode(ControlMode::Position)?;
        self.slider_positions = self.motion.encoders()?;

        info!("{}: joints in position control", self.label);

        Ok(())
    }

    fn start(&mut self, mode: PlaybackMode) -> Result<(), PartCtrlError> {
        let store = self.store.as_ref().ok_or(PartCtrlError::NotInitialised)?;

        let report = self
            .scheduler
            .start(mode, store, self.motion.as_mut(), self.now_s)?;

        self.events.push(SeqEvent::SequenceActivated {
            part: self.label.clone(),
        });
        self.push_controls_enabled(false);
        self.push_step(report);

        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), PartCtrlError> {
        if self.scheduler.is_idle() {
            Ok(())
        } else {
            Err(PartCtrlError::Busy(self.label.clone()))
        }
    }

    fn check_joint(&self, joint: usize) -> Result<(), PartCtrlError> {
        if joint < self.num_joints {
            Ok(())
        } else {
            Err(PartCtrlError::InvalidJoint(joint))
        }
    }

    /// Table to edit, only available while idle.
    fn editable_store(&mut self) -> Result<&mut SequenceStore, PartCtrlError> {
        self.ensure_idle()?;
        self.store.as_mut().ok_or(PartCtrlError::NotInitialised)
    }

    fn push_step(&mut self, report: StepReport) {
        if !report.accepted {
            warn!("{}: step to slot {} not accepted", self.label, report.slot);
        }

        self.events.push(SeqEvent::StepStarted {
            part: self.label.clone(),
            slot: report.slot,
            positions: report.positions,
            speeds: report.speeds,
        });
    }

    fn push_stopped(&mut self) {
        self.events.push(SeqEvent::SequenceStopped {
            part: self.label.clone(),
        });
        self.push_controls_enabled(true);
    }

    fn push_controls_enabled(&mut self, enabled: bool) {
        self.events.push(SeqEvent::ControlsEnabled {
            part: self.label.clone(),
            enabled,
        });
    }

    fn push_table_changed(&mut self) {
        self.events.push(SeqEvent::TableChanged {
            part: self.label.clone(),
        });
    }

    fn push_notice(&mut self, msg: String) {
        self.events.push(SeqEvent::Notice {
            part: self.label.clone(),
            msg,
        });
    }
}

impl SeqIntents for PartCtrl {
    fn capture(&mut self, slot: usize) -> Result<(), PartCtrlError> {
        self.ensure_idle()?;

        let positions = self.motion.encoders()?;
        let speeds = self.slider_speeds.clone();
        self.editable_store()?.capture(slot, positions, speeds)?;

        debug!("{}: captured slot {}", self.label, slot);
        self.push_table_changed();

        Ok(())
    }

    fn set_timing(&mut self, slot: usize, seconds: f64) -> Result<(), PartCtrlError> {
        self.editable_store()?.set_timing(slot, seconds)?;
        self.push_table_changed();

        Ok(())
    }

    fn set_play_order(&mut self, slot: usize, rank: i32) -> Result<(), PartCtrlError> {
        self.editable_store()?.set_play_order(slot, rank)?;
        self.push_table_changed();

        Ok(())
    }

    fn select(&mut self, slot: usize) -> Result<(), PartCtrlError> {
        let store = self.store.as_ref().ok_or(PartCtrlError::NotInitialised)?;

        if slot >= store.capacity() {
            return Err(StoreError::SlotOutOfRange {
                slot,
                capacity: store.capacity(),
            }
            .into());
        }

        self.selection = Some(slot);

        Ok(())
    }

    fn go_selected(&mut self) -> Result<(), PartCtrlError> {
        let store = self.store.as_ref().ok_or(PartCtrlError::NotInitialised)?;
        let slot = self.selection.ok_or(PartCtrlError::NoSelection)?;

        let entry = store.copy(slot)?;
        if !entry.has_timing() {
            return Err(PartCtrlError::SelectionUnset(slot));
        }

        let report = self.scheduler.go_to(&entry, self.motion.as_mut())?;
        if report.accepted {
            self.slider_positions = report.positions.clone();
        }
        self.push_step(report);

        Ok(())
    }

    fn run(&mut self) -> Result<(), PartCtrlError> {
        self.start(PlaybackMode::RunOnce)
    }

    fn run_timed(&mut self) -> Result<(), PartCtrlError> {
        self.start(PlaybackMode::RunOnceTimed)
    }

    fn cycle(&mut self) -> Result<(), PartCtrlError> {
        self.start(PlaybackMode::Cycle)
    }

    fn cycle_timed(&mut self) -> Result<(), PartCtrlError> {
        self.start(PlaybackMode::CycleTimed)
    }

    fn stop(&mut self) -> Result<(), PartCtrlError> {
        if self.scheduler.stop() {
            self.push_stopped();
        }

        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<PathBuf, PartCtrlError> {
        let store = self.store.as_ref().ok_or(PartCtrlError::NotInitialised)?;

        Ok(persist::save(store, path, &self.label)?)
    }

    fn load(&mut self, path: &Path) -> Result<(), PartCtrlError> {
        let (capacity, num_joints) = {
            let store = self.editable_store()?;
            (store.capacity(), store.num_joints())
        };

        let report = persist::load(path, &self.label, capacity, num_joints)?;

        self.store = Some(report.store);
        self.selection = None;
        self.push_table_changed();

        if report.truncated {
            self.push_notice(format!(
                "{:?} holds more than {} rows, the sequence was truncated",
                path,
                capacity - 1
            ));
        }
        if !report.skipped.is_empty() {
            self.push_notice(format!(
                "Rows {:?} of {:?} are missing or have the wrong number of joints and were skipped",
                report.skipped, path
            ));
        }

        Ok(())
    }

    fn delete(&mut self, slot: usize) -> Result<(), PartCtrlError> {
        if self.editable_store()?.delete(slot)?.is_some() {
            self.push_table_changed();
        }

        Ok(())
    }

    fn copy(&mut self, slot: usize) -> Result<(), PartCtrlError> {
        let store = self.store.as_ref().ok_or(PartCtrlError::NotInitialised)?;

        self.clipboard = Some(store.copy(slot)?);

        Ok(())
    }

    fn paste(&mut self, slot: usize) -> Result<(), PartCtrlError> {
        let row = self.clipboard.clone().ok_or(PartCtrlError::ClipboardEmpty)?;

        self.editable_store()?.paste(slot, &row)?;
        self.push_table_changed();

        Ok(())
    }

    fn move_slider(&mut self, joint: usize, position: f64) -> Result<(), PartCtrlError> {
        self.ensure_idle()?;
        self.check_joint(joint)?;

        let mut target = self.slider_positions.clone();
        target[joint] = position;

        self.motion.set_ref_speeds(&self.slider_speeds)?;
        self.motion.position_move(&target)?;
        self.slider_positions = target;

        Ok(())
    }

    fn set_slider_speed(&mut self, joint: usize, speed: f64) -> Result<(), PartCtrlError> {
        self.ensure_idle()?;
        self.check_joint(joint)?;

        if !speed.is_finite() || speed <= 0.0 {
            return Err(PartCtrlError::InvalidSpeed(speed));
        }

        self.slider_speeds[joint] = speed;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_len(what: &'static str, expected: usize, values: &[f64]) -> Result<(), PartCtrlError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(PartCtrlError::WrongLength {
            what,
            expected,
            found: values.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::playback::PlaybackError;
    use crate::sim_motion::{SimClock, SimHandle, SimMotion};
    use comms_if::eqpt::MotionError;

    fn part(label: &str, clock: &SimClock) -> (PartCtrl, SimHandle) {
        let sim = SimMotion::new(clock.clone(), vec![0.0, 0.0]);
        let handle = sim.handle();
        let mut part = PartCtrl::new(label, Box::new(sim));

        part.init(PartInit {
            capacity: 10,
            default_speed: 10.0,
            home: Some(HomeConfig {
                positions: vec![5.0, 5.0],
                speeds: vec![2.0, 2.0],
            }),
        })
        .unwrap();
        part.take_events();

        (part, handle)
    }

    /// Record two rows at the given positions, timings 1 s, ranked 0 and 1
    fn record_two(part: &mut PartCtrl, clock: &SimClock) {
        for (slot, pos) in [10.0, 20.0].iter().enumerate() {
            part.move_slider(0, *pos).unwrap();
            clock.advance(5.0);
            part.capture(slot).unwrap();
            part.set_timing(slot, 1.0).unwrap();
            part.set_play_order(slot, slot as i32).unwrap();
        }
        part.take_events();
    }

    #[test]
    fn test_capture_uses_encoders_and_slider_speeds() {
        let clock = SimClock::new();
        let (mut part, _) = part("head", &clock);

        part.set_slider_speed(1, 4.0).unwrap();
        part.move_slider(1, 8.0).unwrap();
        clock.advance(1.0);
        part.capture(3).unwrap();

        let e = part.store().unwrap().entry(3).unwrap();
        assert_eq!(e.positions, vec![0.0, 4.0]);
        assert_eq!(e.speeds, vec![10.0, 4.0]);
        assert_eq!(
            part.take_events(),
            vec![SeqEvent::TableChanged {
                part: "head".into()
            }]
        );

        assert!(matches!(
            part.set_slider_speed(0, -1.0),
            Err(PartCtrlError::InvalidSpeed(_))
        ));
        assert!(matches!(
            part.move_slider(2, 0.0),
            Err(PartCtrlError::InvalidJoint(2))
        ));
        assert!(matches!(
            part.set_timing(4, 1.0),
            Err(PartCtrlError::Store(StoreError::EmptySlot(4)))
        ));
    }

    #[test]
    fn test_run_events_and_busy() {
        let clock = SimClock::new();
        let (mut part, handle) = part("head", &clock);
        record_two(&mut part, &clock);

        part.set_time(clock.now());
        part.run().unwrap();
        let events = part.take_events();
        assert_eq!(events[0], SeqEvent::SequenceActivated { part: "head".into() });
        assert_eq!(
            events[1],
            SeqEvent::ControlsEnabled {
                part: "head".into(),
                enabled: false
            }
        );
        assert!(matches!(events[2], SeqEvent::StepStarted { slot: 0, .. }));

        // Edits and single moves are refused while playing
        assert!(matches!(part.capture(2), Err(PartCtrlError::Busy(_))));
        assert!(matches!(part.set_timing(0, 2.0), Err(PartCtrlError::Busy(_))));
        assert!(matches!(part.delete(0), Err(PartCtrlError::Busy(_))));
        assert!(matches!(part.move_slider(0, 1.0), Err(PartCtrlError::Busy(_))));
        assert!(matches!(
            part.cycle(),
            Err(PartCtrlError::Playback(PlaybackError::AlreadyStepping(_)))
        ));
        part.select(0).unwrap();
        assert!(matches!(
            part.go_selected(),
            Err(PartCtrlError::Playback(PlaybackError::NotIdle))
        ));

        let start = clock.now();
        assert_eq!(part.playback_state(), PlaybackState::Stepping(PlaybackMode::RunOnce));
        let (events, report) = part.proc(&(start + 1.0)).unwrap();
        assert!(matches!(events[0], SeqEvent::StepStarted { slot: 1, .. }));
        assert_eq!(report.state, PlaybackState::Stepping(PlaybackMode::RunOnce));

        let (events, report) = part.proc(&(start + 2.0)).unwrap();
        assert_eq!(
            events,
            vec![
                SeqEvent::SequenceStopped { part: "head".into() },
                SeqEvent::ControlsEnabled {
                    part: "head".into(),
                    enabled: true
                }
            ]
        );
        assert_eq!(report.state, PlaybackState::Idle);
        assert_eq!(report.num_steps, 2);

        // Two slider moves and two steps
        assert_eq!(handle.num_moves(), 4);
    }

    #[test]
    fn test_stop() {
        let clock = SimClock::new();
        let (mut part, _) = part("head", &clock);
        record_two(&mut part, &clock);

        part.cycle_timed().unwrap();
        part.take_events();

        part.stop().unwrap();
        assert_eq!(part.take_events().len(), 2);
        assert!(part.is_idle());

        // Stopping again is harmless and silent
        part.stop().unwrap();
        assert!(part.take_events().is_empty());

        let (events, _) = part.proc(&100.0).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let clock = SimClock::new();
        let (mut part, _) = part("head", &clock);

        assert!(matches!(
            part.run_timed(),
            Err(PartCtrlError::Playback(PlaybackError::EmptySequence))
        ));
        assert!(part.is_idle());
        assert!(part.take_events().is_empty());
    }

    #[test]
    fn test_go_selected() {
        let clock = SimClock::new();
        let (mut part, handle) = part("head", &clock);

        assert!(matches!(part.go_selected(), Err(PartCtrlError::NoSelection)));

        part.capture(0).unwrap();
        part.select(0).unwrap();
        assert!(matches!(
            part.go_selected(),
            Err(PartCtrlError::SelectionUnset(0))
        ));

        part.set_timing(0, 1.0).unwrap();
        part.go_selected().unwrap();
        assert_eq!(handle.num_moves(), 1);

        assert!(matches!(
            part.select(10),
            Err(PartCtrlError::Store(StoreError::SlotOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_copy_paste_delete() {
        let clock = SimClock::new();
        let (mut part, _) = part("head", &clock);
        record_two(&mut part, &clock);

        assert!(matches!(part.paste(5), Err(PartCtrlError::ClipboardEmpty)));

        part.copy(1).unwrap();
        part.paste(5).unwrap();
        part.delete(1).unwrap();

        let store = part.store().unwrap();
        assert_eq!(store.entry(5).unwrap().positions, vec![20.0, 0.0]);
        assert!(store.entry(1).is_none());
        assert_eq!(part.take_events().len(), 2);

        // Deleting an empty row changes nothing
        part.delete(1).unwrap();
        assert!(part.take_events().is_empty());
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let clock = SimClock::new();
        let (mut left, _) = part("left_arm", &clock);
        let (mut head, _) = part("head", &clock);
        record_two(&mut left, &clock);
        record_two(&mut head, &clock);
        head.move_slider(1, 3.0).unwrap();
        clock.advance(1.0);
        head.capture(5).unwrap();

        let path = left.save(&dir.path().join("wave")).unwrap();
        assert_eq!(path.extension().unwrap(), "posleft_arm");

        // Loading another part's file leaves the table untouched
        let before = head.store().unwrap().clone();
        assert!(matches!(
            head.load(&path),
            Err(PartCtrlError::Persist(persist::PersistError::WrongExtension { .. }))
        ));
        assert_eq!(head.store().unwrap(), &before);

        head.select(5).unwrap();
        head.take_events();
        let head_path = head.save(&dir.path().join("wave.txt")).unwrap();
        assert_eq!(head_path, dir.path().join("wave.txt.poshead"));
        head.load(&head_path).unwrap();
        assert_eq!(head.selection(), None);
        assert_eq!(head.store().unwrap().len(), 2);
        assert!(head.store().unwrap().entry(5).is_none());
        assert_eq!(
            head.take_events(),
            vec![SeqEvent::TableChanged { part: "head".into() }]
        );
    }

    #[test]
    fn test_load_notices() {
        let dir = tempfile::tempdir().unwrap();
        let clock = SimClock::new();
        let (mut part, _) = part("head", &clock);

        // Capacity 10: record 1 is too short, record 3 is missing, record 9 does not fit
        let path = dir.path().join("long.poshead");
        let mut text = String::from("[POSITION1]\njointPositions 1.0\ntiming 1.0\n");
        for i in [0, 2, 4, 9].iter() {
            text.push_str(&format!(
                "[POSITION{}]\njointPositions {}.0 0.0\ntiming 1.0\n",
                i, i
            ));
        }
        std::fs::write(&path, text).unwrap();

        part.load(&path).unwrap();
        assert_eq!(part.store().unwrap().len(), 3);

        let events = part.take_events();
        assert_eq!(events[0], SeqEvent::TableChanged { part: "head".into() });

        let notices: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                SeqEvent::Notice { msg, .. } => Some(msg.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(notices.len(), 2);
        assert!(notices[0].contains("truncated"));
        assert!(notices[1].starts_with("Rows [1, 3]"));
    }

    #[test]
    fn test_home_idle_run_part() {
        let clock = SimClock::new();
        let (mut part, handle) = part("head", &clock);

        part.home().unwrap();
        let moves = handle.moves();
        assert_eq!(moves[0].positions, vec![5.0, 5.0]);
        assert_eq!(moves[0].speeds, vec![2.0, 2.0]);

        clock.advance(1.0);
        part.idle().unwrap();
        assert!(matches!(
            part.move_slider(0, 1.0),
            Err(PartCtrlError::Motion(MotionError::Rejected(_)))
        ));

        part.run_part().unwrap();
        assert_eq!(part.slider_positions(), &[2.0, 2.0]);
        part.move_slider(0, 1.0).unwrap();
    }

    #[test]
    fn test_init_failure() {
        let clock = SimClock::new();
        let sim = SimMotion::new(clock, vec![0.0]);
        sim.handle().set_fault(Some(MotionError::NotConnected));
        let mut part = PartCtrl::new("leg", Box::new(sim));

        assert!(matches!(
            part.init(PartInit {
                capacity: 30,
                default_speed: 10.0,
                home: None
            }),
            Err(PartCtrlError::Motion(MotionError::NotConnected))
        ));
        assert!(matches!(part.run(), Err(PartCtrlError::NotInitialised)));
        assert!(matches!(part.proc(&0.0), Err(PartCtrlError::NotInitialised)));
    }
}
