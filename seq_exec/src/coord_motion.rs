//! # Coordinated motion solver
//!
//! Computes per-joint reference speeds which make a constant-velocity point-to-point move finish
//! at the same time on every joint. This is not a trajectory planner, the motion-control service
//! may still clamp the speeds to its own limits.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::JointVector;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Distance under which a joint is considered not to move.
pub const MIN_DISTANCE: f64 = 0.01;

/// Speed commanded to joints which do not move.
pub const STILL_JOINT_SPEED: f64 = 1.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolveError {
    #[error("Start has {start} joints but target has {target}")]
    LengthMismatch { start: usize, target: usize },

    #[error("Move duration must be positive, got {0} s")]
    InvalidDuration(f64),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Speeds moving every joint from `start` to `target` in `duration_s` seconds.
pub fn solve(start: &[f64], target: &[f64], duration_s: f64) -> Result<JointVector, SolveError> {
    if start.len() != target.len() {
        return Err(SolveError::LengthMismatch {
            start: start.len(),
            target: target.len(),
        });
    }

    if !duration_s.is_finite() || duration_s <= 0.0 {
        return Err(SolveError::InvalidDuration(duration_s));
    }

    Ok(start
        .iter()
        .zip(target.iter())
        .map(|(s, t)| {
            let dist = (s - t).abs();
            if dist > MIN_DISTANCE {
                dist / duration_s
            } else {
                STILL_JOINT_SPEED
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solve() {
        let v = solve(&[0.0, 10.0, 5.0, 1.0], &[20.0, -10.0, 5.005, 1.02], 2.0).unwrap();

        assert_relative_eq!(v[0], 10.0);
        assert_relative_eq!(v[1], 10.0);
        assert_eq!(v[2], STILL_JOINT_SPEED);
        assert_relative_eq!(v[3], 0.01, epsilon = 1e-9);

        // Exactly on the threshold counts as not moving
        let v = solve(&[0.0], &[0.01], 0.5).unwrap();
        assert_eq!(v, vec![STILL_JOINT_SPEED]);
    }

    #[test]
    fn test_solve_errors() {
        assert_eq!(
            solve(&[0.0, 1.0], &[0.0], 1.0),
            Err(SolveError::LengthMismatch { start: 2, target: 1 })
        );
        assert_eq!(
            solve(&[0.0], &[1.0], 0.0),
            Err(SolveError::InvalidDuration(0.0))
        );
        assert!(solve(&[0.0], &[1.0], f64::NAN).is_err());
    }
}
