//! Session management

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal imports
use crate::time;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// A chrono format string which diplays a timestamp. See
/// https://docs.rs/chrono/0.4.11/chrono/format/strftime/index.html for more
/// information.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Name of the directory inside the session where sequence files are kept.
const SEQUENCES_DIR: &str = "sequences";

/// Name of the TC and event record inside the session.
const EVENT_LOG_FILE: &str = "events.log";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A struct storing information about the current session
#[derive(Clone, Debug)]
pub struct Session {
    /// The root directory for this session
    pub session_root: PathBuf,

    /// Directory relative sequence file paths are resolved against
    pub seq_root: PathBuf,

    /// The path to the session's log file
    pub log_file_path: PathBuf,

    /// The path to the file recording every TC and event as JSON
    pub event_log_path: PathBuf,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors associated with the session module.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable (SEQ_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot create the session directory: {0}")]
    CannotCreateDir(std::io::Error),

    #[error(
        "Cannot initialise the session epoch, have you already initialised the \
         session? (conquer_once error: {0})"
    )]
    CannotInitEpoch(conquer_once::TryInitError),

    #[error("Cannot get the epoch time, did you forget to initialise the session?")]
    CannotGetEpoch,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start a new session within the given directory.
    ///
    /// This will create a new session directory named `{exec_name}_{timestamp}`
    /// under `$SEQ_SW_ROOT/{sessions_dir}`.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        let root = crate::host::get_sw_root().map_err(|_| SessionError::SwRootNotSet)?;

        Self::new_in(&root.join(sessions_dir), exec_name)
    }

    /// Start a new session inside an explicit parent directory.
    pub fn new_in(parent: &Path, exec_name: &str) -> Result<Self, SessionError> {
        // Set the session epoch
        SESSION_EPOCH
            .try_init_once(Utc::now)
            .map_err(SessionError::CannotInitEpoch)?;

        // Format the session epoch as a timestamp
        let timestamp = match SESSION_EPOCH.get() {
            Some(e) => e.format(TIMESTAMP_FORMAT),
            None => return Err(SessionError::CannotGetEpoch),
        };

        // Create the session directory and the sequence directory inside it
        let session_root = parent.join(format!("{}_{}", exec_name, timestamp));
        let seq_root = session_root.join(SEQUENCES_DIR);
        fs::create_dir_all(&seq_root).map_err(SessionError::CannotCreateDir)?;

        let log_file_path = session_root.join(format!("{}.log", exec_name));
        let event_log_path = session_root.join(EVENT_LOG_FILE);

        Ok(Session {
            session_root,
            seq_root,
            log_file_path,
            event_log_path,
        })
    }

    /// Exit the session.
    pub fn exit(self) {
        info!(
            "Session exited after {:.3} s, data in {:?}",
            get_elapsed_seconds(),
            self.session_root
        );
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the number of seconds elapsed since the start of the session.
///
/// # Panics
/// - This function will panic if the session epoch has not been
///   initialised, which is performed on creating a new Session instance.
pub fn get_elapsed_seconds() -> f64 {
    match SESSION_EPOCH.get() {
        Some(e) => {
            let elapsed = Utc::now() - *e;
            match time::duration_to_seconds(elapsed) {
                Some(s) => s,
                None => std::f64::NAN,
            }
        }
        None => panic!("Cannot get the session epoch!"),
    }
}

/// Return a reference to the session's epoch.
///
/// # Panics
/// - This function will panic if the session epoch has not been
///   initialised, which is performed on creating a new Session instance.
pub fn get_epoch() -> &'static DateTime<Utc> {
    match SESSION_EPOCH.get() {
        Some(e) => e,
        None => panic!("Cannot get the session epoch!"),
    }
}

/// Resolve a sequence file path given by an intent.
///
/// Absolute paths are kept, relative ones are placed in the sequence
/// directory `seq_root`.
pub fn resolve_seq_path<P: AsRef<Path>>(seq_root: &Path, path: P) -> PathBuf {
    if path.as_ref().is_absolute() {
        path.as_ref().to_path_buf()
    }
    else {
        seq_root.join(path)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    // The epoch is process wide so only one test may create a session.
    #[test]
    fn test_session_dirs() {
        let parent = tempfile::tempdir().unwrap();
        let session = Session::new_in(parent.path(), "seq_test").unwrap();

        assert!(session.session_root.starts_with(parent.path()));
        assert!(session.seq_root.is_dir());
        assert_eq!(session.log_file_path.file_name().unwrap(), "seq_test.log");
        assert_eq!(session.event_log_path.parent(), Some(session.session_root.as_path()));

        assert_eq!(
            resolve_seq_path(&session.seq_root, "wave"),
            session.seq_root.join("wave")
        );
        assert_eq!(
            resolve_seq_path(&session.seq_root, "/tmp/wave"),
            PathBuf::from("/tmp/wave")
        );

        assert!(get_elapsed_seconds() >= 0.0);
        assert!(matches!(
            Session::new_in(parent.path(), "seq_test"),
            Err(SessionError::CannotInitEpoch(_))
        ));
    }
}
