//! # Activation arbiter
//!
//! Tracks which parts are playing a sequence. Global (all parts) commands are only enabled while
//! no part is playing, and each part may run at most one playback at a time.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::BTreeSet;

use comms_if::tc::GlobalCmd;
use log::debug;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ActivationArbiter {
    active: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArbiterError {
    #[error("Part {0} is already playing a sequence")]
    AlreadyActive(String),

    #[error("Global commands are disabled while parts are playing: {}", .0.join(", "))]
    GlobalsDisabled(Vec<String>),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ActivationArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a part's playback.
    pub fn on_sequence_activated(&mut self, part: &str) -> Result<(), ArbiterError> {
        if !self.active.insert(part.to_string()) {
            return Err(ArbiterError::AlreadyActive(part.to_string()));
        }

        debug!("{} activated, {} active", part, self.active.len());

        Ok(())
    }

    /// Record the end of a part's playback. Returns false if the part was not active.
    pub fn on_sequence_stopped(&mut self, part: &str) -> bool {
        let was_active = self.active.remove(part);

        if was_active {
            debug!("{} stopped, {} active", part, self.active.len());
        }

        was_active
    }

    /// Number of parts playing a sequence.
    pub fn count(&self) -> usize {
        self.active.len()
    }

    pub fn globals_enabled(&self) -> bool {
        self.active.is_empty()
    }

    /// Whether the part's own playback and edit commands are enabled.
    pub fn is_local_enabled(&self, part: &str) -> bool {
        !self.active.contains(part)
    }

    /// Check that a global command may be issued now.
    pub fn check_global(&self, cmd: &GlobalCmd) -> Result<(), ArbiterError> {
        if self.globals_enabled() || cmd.allowed_during_playback() {
            Ok(())
        } else {
            Err(ArbiterError::GlobalsDisabled(
                self.active.iter().cloned().collect(),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_counting() {
        let mut arb = ActivationArbiter::new();
        assert!(arb.globals_enabled());

        arb.on_sequence_activated("left_arm").unwrap();
        assert_eq!(
            arb.on_sequence_activated("left_arm"),
            Err(ArbiterError::AlreadyActive("left_arm".into()))
        );
        arb.on_sequence_activated("head").unwrap();
        assert_eq!(arb.count(), 2);

        assert!(!arb.is_local_enabled("head"));
        assert!(arb.is_local_enabled("torso"));

        assert!(arb.on_sequence_stopped("head"));
        assert!(!arb.on_sequence_stopped("head"));
        assert!(!arb.globals_enabled());

        assert_eq!(
            arb.check_global(&GlobalCmd::RunAll),
            Err(ArbiterError::GlobalsDisabled(vec!["left_arm".into()]))
        );
        assert!(arb.check_global(&GlobalCmd::StopAll).is_ok());

        arb.on_sequence_stopped("left_arm");
        assert_eq!(arb.count(), 0);
        assert!(arb.check_global(&GlobalCmd::RunAll).is_ok());
    }
}
