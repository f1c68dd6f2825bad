//! # Sequence application
//!
//! Holds every open part, the activation arbiter and the queue of events for the front-end, and
//! implements the global commands which apply one operation to every part.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::BTreeMap;
use std::fmt;

use comms_if::{tc::GlobalCmd, tm::SeqEvent};
use log::{info, warn};
use util::module::State;

use crate::{
    arbiter::{ActivationArbiter, ArbiterError},
    part_ctrl::{PartCtrl, PartCtrlError, SeqIntents},
    persist::{self, PersistError},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The sequence engine.
#[derive(Default)]
pub struct SeqApp {
    parts: BTreeMap<String, PartCtrl>,

    arbiter: ActivationArbiter,

    /// Events waiting to be taken by the front-end.
    events: Vec<SeqEvent>,

    /// Global command enablement last reported to the front-end.
    globals_enabled: bool,
}

/// Per-part failures of a global command.
#[derive(Debug)]
pub struct PartFailures(pub Vec<(String, PartCtrlError)>);

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No part is labelled {0}")]
    UnknownPart(String),

    #[error("Part {0} is already open")]
    DuplicatePart(String),

    #[error("Part {0}: {1}")]
    Part(String, PartCtrlError),
}

#[derive(Debug, thiserror::Error)]
pub enum GlobalCmdError {
    #[error(transparent)]
    Disabled(#[from] ArbiterError),

    #[error("{cmd:?} failed on {failures}")]
    PartsFailed {
        cmd: GlobalCmd,
        failures: PartFailures,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SeqApp {
    pub fn new() -> Self {
        Self {
            globals_enabled: true,
            ..Default::default()
        }
    }

    /// Add an initialised part.
    pub fn add_part(&mut self, mut part: PartCtrl) -> Result<(), AppError> {
        let label = part.label().to_string();

        if self.parts.contains_key(&label) {
            return Err(AppError::DuplicatePart(label));
        }

        self.events.append(&mut part.take_events());
        self.parts.insert(label, part);

        Ok(())
    }

    pub fn part(&self, label: &str) -> Option<&PartCtrl> {
        self.parts.get(label)
    }

    pub fn part_labels(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(|k| k.as_str())
    }

    pub fn arbiter(&self) -> &ActivationArbiter {
        &self.arbiter
    }

    /// True if no part is playing.
    pub fn all_idle(&self) -> bool {
        self.parts.values().all(|p| p.is_idle())
    }

    /// Set the time of the new cycle on every part, before intents are applied.
    pub fn cycle_start(&mut self, now_s: f64) {
        for part in self.parts.values_mut() {
            part.set_time(now_s);
        }
    }

    /// Apply an intent to one part.
    pub fn with_part<T, F>(&mut self, label: &str, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut PartCtrl) -> Result<T, PartCtrlError>,
    {
        let part = self
            .parts
            .get_mut(label)
            .ok_or_else(|| AppError::UnknownPart(label.to_string()))?;

        let result = f(part);
        let events = part.take_events();
        self.absorb(events);

        result.map_err(|e| AppError::Part(label.to_string(), e))
    }

    /// Execute a global command on every part.
    ///
    /// Every part is attempted even if some fail, failures are returned together.
    pub fn global(&mut self, cmd: &GlobalCmd) -> Result<(), GlobalCmdError> {
        self.arbiter.check_global(cmd)?;

        info!("Global command {:?}", cmd);

        let mut failures = Vec::new();
        let mut events = Vec::new();

        for (label, part) in self.parts.iter_mut() {
            if let Err(e) = apply_global(part, cmd) {
                warn!("{:?} failed on {}: {}", cmd, label, e);
                failures.push((label.clone(), e));
            }
            events.append(&mut part.take_events());
        }

        self.absorb(events);

        if failures.is_empty() {
            Ok(())
        } else {
            Err(GlobalCmdError::PartsFailed {
                cmd: cmd.clone(),
                failures: PartFailures(failures),
            })
        }
    }

    /// Queue an event for the front-end.
    pub fn push_event(&mut self, event: SeqEvent) {
        self.events.push(event);
    }

    /// Advance every part's playback and take all queued events.
    pub fn proc(&mut self, now_s: f64) -> Vec<SeqEvent> {
        let mut events = Vec::new();

        for (label, part) in self.parts.iter_mut() {
            match part.proc(&now_s) {
                Ok((mut e, _)) => events.append(&mut e),
                Err(e) => warn!("Error during {} processing: {}", label, e),
            }
        }

        self.absorb(events);

        std::mem::take(&mut self.events)
    }

    /// Queue part events, keeping the arbiter in step with playback starts and stops.
    fn absorb(&mut self, events: Vec<SeqEvent>) {
        for event in events {
            match &event {
                SeqEvent::SequenceActivated { part } => {
                    if let Err(e) = self.arbiter.on_sequence_activated(part) {
                        warn!("{}", e);
                    }
                }
                SeqEvent::SequenceStopped { part } => {
                    self.arbiter.on_sequence_stopped(part);
                }
                _ => (),
            }

            self.events.push(event);

            let enabled = self.arbiter.globals_enabled();
            if enabled != self.globals_enabled {
                self.globals_enabled = enabled;
                self.events.push(SeqEvent::GlobalsEnabled { enabled });
            }
        }
    }
}

impl fmt::Display for PartFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|(l, _)| l.as_str()).collect();
        write!(f, "{}", names.join(", "))
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn apply_global(part: &mut PartCtrl, cmd: &GlobalCmd) -> Result<(), PartCtrlError> {
    match cmd {
        GlobalCmd::GoAll => part.go_selected(),
        GlobalCmd::RunAll => part.run(),
        GlobalCmd::RunTimeAll => part.run_timed(),
        GlobalCmd::CycleAll => part.cycle(),
        GlobalCmd::CycleTimeAll => part.cycle_timed(),
        GlobalCmd::SaveAll { path } => part.save(path).map(|_| ()),
        GlobalCmd::LoadAll { path } => {
            // Each part loads its own file from the common base name
            match persist::part_file(path, part.label()) {
                Some(file) => part.load(&file),
                None => Err(PersistError::InvalidPath(path.clone()).into()),
            }
        }
        GlobalCmd::StopAll => part.stop(),
        GlobalCmd::HomeAll => part.home(),
        GlobalCmd::IdleAll => part.idle(),
        GlobalCmd::RunAllParts => part.run_part(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::part_ctrl::{HomeConfig, PartInit};
    use crate::sim_motion::{SimClock, SimMotion};

    fn app(clock: &SimClock, labels: &[&str]) -> SeqApp {
        let mut app = SeqApp::new();

        for label in labels {
            let sim = SimMotion::new(clock.clone(), vec![0.0, 0.0]);
            let mut part = PartCtrl::new(label, Box::new(sim));
            part.init(PartInit {
                capacity: 10,
                default_speed: 10.0,
                home: None,
            })
            .unwrap();
            app.add_part(part).unwrap();
        }

        app.proc(0.0);
        app
    }

    /// Give a part a two step sequence with 1 s timings
    fn record(app: &mut SeqApp, label: &str) {
        app.with_part(label, |p| {
            for slot in 0..2 {
                p.move_slider(0, 10.0 * slot as f64)?;
                p.capture(slot)?;
                p.set_timing(slot, 1.0)?;
                p.set_play_order(slot, slot as i32)?;
            }
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_two_part_arbitration() {
        let clock = SimClock::new();
        let mut app = app(&clock, &["head", "left_arm"]);
        record(&mut app, "head");
        record(&mut app, "left_arm");
        app.proc(0.0);

        app.with_part("head", |p| p.run()).unwrap();
        let events = app.proc(0.0);
        assert!(events.contains(&SeqEvent::GlobalsEnabled { enabled: false }));

        assert_eq!(app.arbiter().count(), 1);
        assert!(matches!(
            app.global(&GlobalCmd::RunAll),
            Err(GlobalCmdError::Disabled(ArbiterError::GlobalsDisabled(_)))
        ));

        // The other part can still play on its own
        assert!(app.arbiter().is_local_enabled("left_arm"));
        app.with_part("left_arm", |p| p.cycle()).unwrap();
        assert_eq!(app.arbiter().count(), 2);

        // Head's run ends after two 1 s steps, the arm keeps cycling
        app.proc(1.0);
        let events = app.proc(2.0);
        assert!(events.contains(&SeqEvent::SequenceStopped { part: "head".into() }));
        assert!(!events.contains(&SeqEvent::GlobalsEnabled { enabled: true }));
        assert_eq!(app.arbiter().count(), 1);
        assert!(app.global(&GlobalCmd::CycleAll).is_err());

        app.global(&GlobalCmd::StopAll).unwrap();
        let events = app.proc(2.0);
        assert!(events.contains(&SeqEvent::GlobalsEnabled { enabled: true }));
        assert_eq!(app.arbiter().count(), 0);
        assert!(app.all_idle());

        app.global(&GlobalCmd::RunTimeAll).unwrap();
        assert_eq!(app.arbiter().count(), 2);
    }

    #[test]
    fn test_global_failures_are_aggregated() {
        let clock = SimClock::new();
        let mut app = app(&clock, &["head", "left_arm", "torso"]);
        record(&mut app, "left_arm");

        match app.global(&GlobalCmd::RunAll) {
            Err(GlobalCmdError::PartsFailed { failures, .. }) => {
                let names: Vec<&str> = failures.0.iter().map(|(l, _)| l.as_str()).collect();
                assert_eq!(names, vec!["head", "torso"]);
                assert_eq!(failures.to_string(), "head, torso");
            }
            r => panic!("Expected part failures, got {:?}", r),
        }

        // The part with a sequence still started
        assert!(!app.part("left_arm").unwrap().is_idle());

        // Go-all needs a selection with a timing on every part
        app.global(&GlobalCmd::StopAll).unwrap();
        app.with_part("left_arm", |p| p.select(0)).unwrap();
        match app.global(&GlobalCmd::GoAll) {
            Err(GlobalCmdError::PartsFailed { failures, .. }) => {
                assert_eq!(failures.0.len(), 2);
                assert!(matches!(failures.0[0].1, PartCtrlError::NoSelection));
            }
            r => panic!("Expected part failures, got {:?}", r),
        }

        // No part has a home position
        assert!(app.global(&GlobalCmd::HomeAll).is_err());
    }

    #[test]
    fn test_save_load_all() {
        let dir = tempfile::tempdir().unwrap();
        let clock = SimClock::new();
        let mut app = app(&clock, &["head", "left_arm"]);
        record(&mut app, "head");
        record(&mut app, "left_arm");

        let base = dir.path().join("demo");
        app.global(&GlobalCmd::SaveAll { path: base.clone() }).unwrap();
        assert!(dir.path().join("demo.poshead").is_file());
        assert!(dir.path().join("demo.posleft_arm").is_file());

        app.with_part("head", |p| p.delete(0)).unwrap();
        app.global(&GlobalCmd::LoadAll { path: base }).unwrap();
        assert_eq!(app.part("head").unwrap().store().unwrap().len(), 2);

        // A dotted base keeps its own files
        let dotted = dir.path().join("demo.v2");
        app.global(&GlobalCmd::SaveAll { path: dotted.clone() }).unwrap();
        assert!(dir.path().join("demo.v2.poshead").is_file());
        app.global(&GlobalCmd::LoadAll { path: dotted }).unwrap();
    }

    #[test]
    fn test_idle_and_run_all_parts() {
        let clock = SimClock::new();
        let mut app = SeqApp::new();
        let sim = SimMotion::new(clock.clone(), vec![0.0]);
        let mut part = PartCtrl::new("neck", Box::new(sim));
        part.init(PartInit {
            capacity: 5,
            default_speed: 10.0,
            home: Some(HomeConfig {
                positions: vec![30.0],
                speeds: vec![10.0],
            }),
        })
        .unwrap();
        app.add_part(part).unwrap();

        app.global(&GlobalCmd::HomeAll).unwrap();
        clock.advance(1.0);
        app.global(&GlobalCmd::IdleAll).unwrap();

        let err = app.with_part("neck", |p| p.move_slider(0, 0.0));
        assert!(matches!(err, Err(AppError::Part(_, PartCtrlError::Motion(_)))));

        app.global(&GlobalCmd::RunAllParts).unwrap();
        assert_eq!(app.part("neck").unwrap().slider_positions(), &[10.0]);

        assert!(matches!(
            app.with_part("tail", |p| p.run()),
            Err(AppError::UnknownPart(_))
        ));
    }
}
