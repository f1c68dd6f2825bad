//! # Telecommand module
//!
//! Intent messages sent to the sequence engine. A front-end (or a script) names the part the
//! intent is for, or raises a global intent covering all open parts.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod seq;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
pub use seq::{GlobalCmd, SeqCmd};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an intent raised towards the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tc {
    /// An intent for a single part, identified by its label.
    Part { part: String, cmd: SeqCmd },

    /// An intent applying to every open part.
    Global { cmd: GlobalCmd },
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("TC has an empty part label")]
    EmptyPartLabel,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        let tc: Tc = serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)?;

        if let Tc::Part { part, .. } = &tc {
            if part.trim().is_empty() {
                return Err(TcParseError::EmptyPartLabel);
            }
        }

        Ok(tc)
    }

    /// Serialise the TC into a JSON packet.
    pub fn to_json(&self) -> Result<String, TcParseError> {
        serde_json::to_string(self).map_err(TcParseError::InvalidJson)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_part_tc() {
        let tc = Tc::from_json(
            r#"{"type": "part", "part": "left_arm", "cmd": {"capture": {"slot": 2}}}"#,
        )
        .unwrap();

        assert_eq!(
            tc,
            Tc::Part {
                part: "left_arm".into(),
                cmd: SeqCmd::Capture { slot: 2 }
            }
        );
    }

    #[test]
    fn test_parse_unit_cmds() {
        let tc = Tc::from_json(r#"{"type": "part", "part": "head", "cmd": "cycle_timed"}"#)
            .unwrap();
        assert_eq!(
            tc,
            Tc::Part {
                part: "head".into(),
                cmd: SeqCmd::CycleTimed
            }
        );

        let tc = Tc::from_json(r#"{"type": "global", "cmd": "stop_all"}"#).unwrap();
        assert_eq!(tc, Tc::Global { cmd: GlobalCmd::StopAll });
    }

    #[test]
    fn test_to_json() {
        let tc = Tc::Global {
            cmd: GlobalCmd::SaveAll {
                path: "wave".into(),
            },
        };
        let json = tc.to_json().unwrap();

        assert_eq!(json, r#"{"type":"global","cmd":{"save_all":{"path":"wave"}}}"#);
        assert_eq!(Tc::from_json(&json).unwrap(), tc);
    }

    #[test]
    fn test_reject_bad_tcs() {
        assert!(matches!(
            Tc::from_json(r#"{"type": "part", "part": "  ", "cmd": "run"}"#),
            Err(TcParseError::EmptyPartLabel)
        ));
        assert!(matches!(
            Tc::from_json(r#"{"type": "part", "part": "head", "cmd": "dance"}"#),
            Err(TcParseError::InvalidJson(_))
        ));
        assert!(matches!(
            Tc::from_json("not json"),
            Err(TcParseError::InvalidJson(_))
        ));
    }
}
