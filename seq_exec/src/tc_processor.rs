//! # Telecommand processor module
//!
//! The telecommand processor handles intents coming from any source. Failed intents are never
//! fatal, they are logged and reported to the front-end as `PartError` events.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use std::path::Path;

// Internal
use crate::{
    app::{AppError, GlobalCmdError, SeqApp},
    part_ctrl::{PartCtrlError, SeqIntents},
};
use comms_if::{
    tc::{GlobalCmd, SeqCmd, Tc},
    tm::SeqEvent,
};
use util::session::resolve_seq_path;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Relative save and load paths are placed in `seq_root`.
pub fn exec(app: &mut SeqApp, tc: &Tc, seq_root: &Path) {
    match tc {
        Tc::Part { part, cmd } => {
            debug!("Received {:?} for {}", cmd, part);

            match app.with_part(part, |p| apply(p, cmd, seq_root)) {
                Ok(()) => (),
                Err(AppError::Part(label, e)) => report_part_error(app, &label, &e),
                Err(e) => {
                    warn!("Could not execute TC: {}", e);
                    app.push_event(SeqEvent::PartError {
                        part: part.clone(),
                        msg: e.to_string(),
                    });
                }
            }
        }
        Tc::Global { cmd } => {
            debug!("Received global {:?}", cmd);

            let cmd = resolve_global(cmd, seq_root);

            match app.global(&cmd) {
                Ok(()) => (),
                Err(GlobalCmdError::PartsFailed { cmd, failures }) => {
                    warn!("{:?} failed on {}", cmd, failures);
                    for (label, e) in failures.0.iter() {
                        report_part_error(app, label, e);
                    }
                }
                Err(e) => warn!("Could not execute global TC: {}", e),
            }
        }
    }
}

/// Apply a part intent.
pub fn apply<I>(intents: &mut I, cmd: &SeqCmd, seq_root: &Path) -> Result<(), PartCtrlError>
where
    I: SeqIntents + ?Sized,
{
    match cmd {
        SeqCmd::Capture { slot } => intents.capture(*slot),
        SeqCmd::SetTiming { slot, seconds } => intents.set_timing(*slot, *seconds),
        SeqCmd::SetPlayOrder { slot, rank } => intents.set_play_order(*slot, *rank),
        SeqCmd::Select { slot } => intents.select(*slot),
        SeqCmd::GoSelected => intents.go_selected(),
        SeqCmd::Run => intents.run(),
        SeqCmd::RunTimed => intents.run_timed(),
        SeqCmd::Cycle => intents.cycle(),
        SeqCmd::CycleTimed => intents.cycle_timed(),
        SeqCmd::Stop => intents.stop(),
        SeqCmd::Save { path } => intents
            .save(&resolve_seq_path(seq_root, path))
            .map(|_| ()),
        SeqCmd::Load { path } => intents.load(&resolve_seq_path(seq_root, path)),
        SeqCmd::Delete { slot } => intents.delete(*slot),
        SeqCmd::Copy { slot } => intents.copy(*slot),
        SeqCmd::Paste { slot } => intents.paste(*slot),
        SeqCmd::MoveSlider { joint, position } => intents.move_slider(*joint, *position),
        SeqCmd::SetSliderSpeed { joint, speed } => intents.set_slider_speed(*joint, *speed),
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn resolve_global(cmd: &GlobalCmd, seq_root: &Path) -> GlobalCmd {
    match cmd {
        GlobalCmd::SaveAll { path } => GlobalCmd::SaveAll {
            path: resolve_seq_path(seq_root, path),
        },
        GlobalCmd::LoadAll { path } => GlobalCmd::LoadAll {
            path: resolve_seq_path(seq_root, path),
        },
        c => c.clone(),
    }
}

fn report_part_error(app: &mut SeqApp, part: &str, e: &PartCtrlError) {
    warn!("{}: {}", part, e);

    app.push_event(SeqEvent::PartError {
        part: part.to_string(),
        msg: e.to_string(),
    });
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::part_ctrl::{PartCtrl, PartInit};
    use crate::sim_motion::{SimClock, SimMotion};
    use util::module::State;

    fn app(clock: &SimClock) -> SeqApp {
        let mut app = SeqApp::new();
        for label in ["head", "left_arm"].iter() {
            let mut part = PartCtrl::new(label, Box::new(SimMotion::new(clock.clone(), vec![0.0])));
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

    fn tc(json: &str) -> Tc {
        Tc::from_json(json).unwrap()
    }

    #[test]
    fn test_part_tcs() {
        let dir = tempfile::tempdir().unwrap();
        let clock = SimClock::new();
        let mut app = app(&clock);

        exec(&mut app, &tc(r#"{"type": "part", "part": "head", "cmd": {"capture": {"slot": 0}}}"#), dir.path());
        exec(
            &mut app,
            &tc(r#"{"type": "part", "part": "head", "cmd": {"set_timing": {"slot": 0, "seconds": 0.5}}}"#),
            dir.path(),
        );
        exec(
            &mut app,
            &tc(r#"{"type": "part", "part": "head", "cmd": {"set_play_order": {"slot": 0, "rank": 0}}}"#),
            dir.path(),
        );
        exec(
            &mut app,
            &tc(r#"{"type": "part", "part": "head", "cmd": {"save": {"path": "demo"}}}"#),
            dir.path(),
        );

        let events = app.proc(0.0);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, SeqEvent::TableChanged { .. }))
                .count(),
            3
        );
        assert!(dir.path().join("demo.poshead").is_file());

        exec(&mut app, &tc(r#"{"type": "part", "part": "head", "cmd": "run_timed"}"#), dir.path());
        assert!(!app.part("head").unwrap().is_idle());
    }

    #[test]
    fn test_errors_become_events() {
        let dir = tempfile::tempdir().unwrap();
        let clock = SimClock::new();
        let mut app = app(&clock);

        exec(&mut app, &tc(r#"{"type": "part", "part": "head", "cmd": "run"}"#), dir.path());
        exec(
            &mut app,
            &tc(r#"{"type": "part", "part": "tail", "cmd": {"capture": {"slot": 0}}}"#),
            dir.path(),
        );
        exec(&mut app, &tc(r#"{"type": "global", "cmd": "cycle_all"}"#), dir.path());

        let errors: Vec<String> = app
            .proc(0.0)
            .into_iter()
            .filter_map(|e| match e {
                SeqEvent::PartError { part, .. } => Some(part),
                _ => None,
            })
            .collect();

        assert_eq!(errors, vec!["head", "tail", "head", "left_arm"]);
    }
}
