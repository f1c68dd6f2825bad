//! Main sequence engine executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all parts
//!     - Main loop:
//!         - Telecommand (intent) processing
//!         - Playback processing of every part
//!         - Event reporting
//!
//! Parts are driven by simulated motion-control services sharing one clock. Intents come from a
//! script given on the command line.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::Instant;
use structopt::StructOpt;

// Internal
use comms_if::tm::SeqEvent;
use seq_lib::{
    app::SeqApp,
    params::SeqExecParams,
    part_ctrl::{PartCtrl, PartInit},
    sim_motion::{SimClock, SimMotion},
    tc_processor,
};
use util::{
    host,
    logger::{logger_init, LevelFilter, EVENT_TARGET},
    module::State,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::Session,
    time::seconds_to_std_duration,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line arguments of the executable.
#[derive(Debug, StructOpt)]
#[structopt(name = "seq_exec", about = "Joint sequence playback engine")]
struct Opt {
    /// Intent script to execute. Without a script the configuration is reported and the
    /// executable exits.
    #[structopt(parse(from_os_str))]
    script: Option<PathBuf>,

    /// Parameter file, relative to $SEQ_SW_ROOT/params
    #[structopt(long, default_value = "seq_exec.toml")]
    params: String,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("seq_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Sequence Engine Executable\n");
    info!("Running on: {}", host::get_host_info());
    info!("Session directory: {:?}\n", session.session_root);

    debug!("CLI arguments: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let params: SeqExecParams =
        util::params::load(&opt.params).wrap_err("Could not load exec params")?;
    params.validate().wrap_err("Invalid exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE PARTS ----

    info!("Initialising parts...");

    let clock = SimClock::new();
    let mut app = SeqApp::new();

    for part_params in params.parts.iter() {
        let sim = SimMotion::new(clock.clone(), part_params.initial_positions.clone())
            .with_speed_limits(part_params.max_speeds.clone())
            .with_position_limits(
                part_params.min_positions.clone(),
                part_params.max_positions.clone(),
            );

        let mut part = PartCtrl::new(&part_params.label, Box::new(sim));
        part.init(PartInit::from_params(
            part_params,
            params.capacity,
            params.default_speed,
        ))
        .wrap_err_with(|| format!("Failed to initialise part {}", part_params.label))?;

        app.add_part(part)
            .wrap_err_with(|| format!("Failed to add part {}", part_params.label))?;
        info!("{} init complete", part_params.label);
    }

    info!(
        "Part initialisation complete, {} parts open\n",
        params.parts.len()
    );

    // ---- LOAD SCRIPT ----

    let mut si = match opt.script {
        Some(ref path) => {
            info!("Loading script from {:?}", path);

            let si = ScriptInterpreter::new(path).wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} TCs\n",
                si.get_duration(),
                si.get_num_tcs()
            );

            si
        }
        None => {
            info!("No script provided, nothing to execute");
            session.exit();
            return Ok(());
        }
    };

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    let cycle_period = seconds_to_std_duration(params.cycle_period_s);
    let loop_start = Instant::now();
    let mut script_ended = false;
    let mut num_cycles: u64 = 0;

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();
        let now_s = (cycle_start_instant - loop_start).as_secs_f64();

        clock.set(now_s);
        app.cycle_start(now_s);

        // ---- TELECOMMAND PROCESSING ----

        if !script_ended {
            match si.get_pending_tcs(now_s) {
                PendingTcs::None => (),
                PendingTcs::Some(tc_vec) => {
                    for tc in tc_vec.iter() {
                        match tc.to_json() {
                            Ok(s) => info!(target: EVENT_TARGET, "TC {}", s),
                            Err(e) => warn!("Could not serialise TC: {}", e),
                        }
                        tc_processor::exec(&mut app, tc, &session.seq_root);
                    }
                }
                PendingTcs::EndOfScript => {
                    info!("End of TC script reached, waiting for playbacks to end");
                    script_ended = true;
                }
            }
        }

        // ---- PLAYBACK PROCESSING ----

        for event in app.proc(now_s) {
            report_event(&event);
        }

        // Exit once the script is over and nothing is playing
        if script_ended && app.all_idle() {
            break;
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
            ),
        }

        num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    info!("End of execution after {} cycles", num_cycles);
    session.exit();

    Ok(())
}

/// Log an event for the front-end.
fn report_event(event: &SeqEvent) {
    let part = event.part().unwrap_or("all parts");

    match event {
        SeqEvent::StepStarted {
            slot, positions, ..
        } => info!("{}: step to row {} {:?}", part, slot, positions),
        SeqEvent::SequenceActivated { .. } => info!("{}: sequence activated", part),
        SeqEvent::SequenceStopped { .. } => info!("{}: sequence stopped", part),
        SeqEvent::GlobalsEnabled { enabled } => {
            info!("{}: global commands enabled: {}", part, enabled)
        }
        SeqEvent::PartError { msg, .. } | SeqEvent::Notice { msg, .. } => {
            warn!("{}: {}", part, msg)
        }
        SeqEvent::TableChanged { .. } | SeqEvent::ControlsEnabled { .. } => (),
    }

    match serde_json::to_string(event) {
        Ok(s) => info!(target: EVENT_TARGET, "TM {}", s),
        Err(e) => warn!("Could not serialise event: {}", e),
    }
}
