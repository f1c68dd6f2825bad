//! # Simulated motion-control service
//!
//! A constant-velocity stand-in for a part's motion-control service. Joints move towards their
//! last commanded position at their reference speed, as measured on a [`SimClock`] shared with
//! the rest of the executable. Every accepted position move is logged, and faults can be
//! injected through a [`SimHandle`] to exercise the engine's error paths.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use comms_if::eqpt::{ControlMode, JointVector, MotionControl, MotionError};
use log::trace;
use util::maths::{approach, clamp};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Distance from the target under which a joint's motion is done.
const MOTION_DONE_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulation time in seconds, shared by every simulated service.
#[derive(Debug, Clone, Default)]
pub struct SimClock(Rc<Cell<f64>>);

/// A position move accepted by a simulated service.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRecord {
    pub time_s: f64,
    pub positions: JointVector,
    pub speeds: JointVector,
}

#[derive(Debug, Default)]
struct Shared {
    move_log: Vec<MoveRecord>,
    fault: Option<MotionError>,
}

/// Access to a simulated service after it has been handed to the engine.
#[derive(Debug, Clone)]
pub struct SimHandle(Rc<RefCell<Shared>>);

/// Simulated motion-control service of one part.
#[derive(Debug)]
pub struct SimMotion {
    clock: SimClock,
    last_update_s: f64,

    mode: ControlMode,

    positions: JointVector,
    targets: JointVector,
    ref_speeds: JointVector,

    max_speeds: Option<JointVector>,
    position_limits: Option<(JointVector, JointVector)>,

    shared: Rc<RefCell<Shared>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> f64 {
        self.0.get()
    }

    pub fn set(&self, time_s: f64) {
        self.0.set(time_s)
    }

    pub fn advance(&self, dt_s: f64) {
        self.0.set(self.0.get() + dt_s)
    }
}

impl SimHandle {
    /// All position moves accepted so far.
    pub fn moves(&self) -> Vec<MoveRecord> {
        self.0.borrow().move_log.clone()
    }

    pub fn num_moves(&self) -> usize {
        self.0.borrow().move_log.len()
    }

    /// Make every call fail with `fault`, or clear the fault with `None`.
    pub fn set_fault(&self, fault: Option<MotionError>) {
        self.0.borrow_mut().fault = fault;
    }
}

impl SimMotion {
    /// A service with joints at `initial_positions`, in position mode, without limits.
    pub fn new(clock: SimClock, initial_positions: JointVector) -> Self {
        let n = initial_positions.len();

        Self {
            last_update_s: clock.now(),
            clock,
            mode: ControlMode::Position,
            targets: initial_positions.clone(),
            positions: initial_positions,
            ref_speeds: vec![0.0; n],
            max_speeds: None,
            position_limits: None,
            shared: Rc::new(RefCell::new(Shared::default())),
        }
    }

    /// Limit reference speeds to `max_speeds` (absolute values).
    pub fn with_speed_limits(mut self, max_speeds: JointVector) -> Self {
        self.max_speeds = Some(max_speeds);
        self
    }

    /// Limit commanded positions to `[min, max]` per joint.
    pub fn with_position_limits(mut self, min: JointVector, max: JointVector) -> Self {
        self.position_limits = Some((min, max));
        self
    }

    pub fn handle(&self) -> SimHandle {
        SimHandle(self.shared.clone())
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Integrate joint motion up to the current clock time.
    fn update(&mut self) {
        let now = self.clock.now();
        let dt = (now - self.last_update_s).max(0.0);
        self.last_update_s = now;

        if self.mode != ControlMode::Position {
            return;
        }

        for ((p, t), v) in self
            .positions
            .iter_mut()
            .zip(self.targets.iter())
            .zip(self.ref_speeds.iter())
        {
            *p = approach(*p, *t, v * dt);
        }
    }

    fn check_fault(&self) -> Result<(), MotionError> {
        match &self.shared.borrow().fault {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn check_len(&self, values: &[f64]) -> Result<(), MotionError> {
        if values.len() != self.positions.len() {
            Err(MotionError::WrongLength {
                expected: self.positions.len(),
                found: values.len(),
            })
        } else {
            Ok(())
        }
    }
}

impl MotionControl for SimMotion {
    fn axis_count(&mut self) -> Result<usize, MotionError> {
        self.check_fault()?;
        Ok(self.positions.len())
    }

    fn encoders(&mut self) -> Result<JointVector, MotionError> {
        self.check_fault()?;
        self.update();
        Ok(self.positions.clone())
    }

    fn set_ref_speeds(&mut self, speeds: &[f64]) -> Result<(), MotionError> {
        self.check_fault()?;
        self.check_len(speeds)?;
        self.update();

        self.ref_speeds = match &self.max_speeds {
            Some(max) => speeds
                .iter()
                .zip(max.iter())
                .map(|(v, m)| clamp(v.abs(), 0.0, m.abs()))
                .collect(),
            None => speeds.iter().map(|v| v.abs()).collect(),
        };

        Ok(())
    }

    fn position_move(&mut self, positions: &[f64]) -> Result<(), MotionError> {
        self.check_fault()?;
        self.check_len(positions)?;

        if self.mode != ControlMode::Position {
            return Err(MotionError::Rejected(
                "joints are not in position mode".into(),
            ));
        }

        self.update();

        self.targets = match &self.position_limits {
            Some((min, max)) => positions
                .iter()
                .zip(min.iter().zip(max.iter()))
                .map(|(p, (lo, hi))| clamp(*p, *lo, *hi))
                .collect(),
            None => positions.to_vec(),
        };

        trace!("Sim position move to {:?}", self.targets);

        self.shared.borrow_mut().move_log.push(MoveRecord {
            time_s: self.last_update_s,
            positions: self.targets.clone(),
            speeds: self.ref_speeds.clone(),
        });

        Ok(())
    }

    fn check_motion_done(&mut self, joint: usize) -> Result<bool, MotionError> {
        self.check_fault()?;
        self.update();

        match (self.positions.get(joint), self.targets.get(joint)) {
            (Some(p), Some(t)) => Ok((p - t).abs() <= MOTION_DONE_TOLERANCE),
            _ => Err(MotionError::InvalidJoint(joint)),
        }
    }

    fn set_control_mode(&mut self, mode: ControlMode) -> Result<(), MotionError> {
        self.check_fault()?;
        self.update();

        // Idle joints hold where they are once re-enabled
        if mode == ControlMode::Idle {
            self.targets = self.positions.clone();
        }
        self.mode = mode;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_velocity_move() {
        let clock = SimClock::new();
        let mut sim = SimMotion::new(clock.clone(), vec![0.0, 0.0]);

        sim.set_ref_speeds(&[10.0, 5.0]).unwrap();
        sim.position_move(&[20.0, -5.0]).unwrap();

        clock.advance(1.0);
        let p = sim.encoders().unwrap();
        assert_relative_eq!(p[0], 10.0);
        assert_relative_eq!(p[1], -5.0);
        assert!(!sim.check_motion_done(0).unwrap());
        assert!(sim.check_motion_done(1).unwrap());

        clock.advance(5.0);
        assert!(sim.check_motion_done(0).unwrap());
        assert_relative_eq!(sim.encoders().unwrap()[0], 20.0);

        assert_eq!(
            sim.check_motion_done(2),
            Err(MotionError::InvalidJoint(2))
        );
    }

    #[test]
    fn test_limits() {
        let clock = SimClock::new();
        let mut sim = SimMotion::new(clock.clone(), vec![0.0])
            .with_speed_limits(vec![2.0])
            .with_position_limits(vec![-1.0], vec![1.0]);
        let handle = sim.handle();

        sim.set_ref_speeds(&[-50.0]).unwrap();
        sim.position_move(&[30.0]).unwrap();

        let moves = handle.moves();
        assert_eq!(moves[0].positions, vec![1.0]);
        assert_eq!(moves[0].speeds, vec![2.0]);

        clock.advance(0.25);
        assert_relative_eq!(sim.encoders().unwrap()[0], 0.5);
    }

    #[test]
    fn test_idle_and_faults() {
        let clock = SimClock::new();
        let mut sim = SimMotion::new(clock.clone(), vec![0.0]);
        let handle = sim.handle();

        sim.set_ref_speeds(&[1.0]).unwrap();
        sim.position_move(&[10.0]).unwrap();
        clock.advance(2.0);

        // Going idle stops the joint where it is
        sim.set_control_mode(ControlMode::Idle).unwrap();
        assert!(matches!(
            sim.position_move(&[0.0]),
            Err(MotionError::Rejected(_))
        ));
        clock.advance(2.0);
        sim.set_control_mode(ControlMode::Position).unwrap();
        assert_relative_eq!(sim.encoders().unwrap()[0], 2.0);

        assert_eq!(
            sim.set_ref_speeds(&[1.0, 1.0]),
            Err(MotionError::WrongLength {
                expected: 1,
                found: 2
            })
        );

        handle.set_fault(Some(MotionError::NotConnected));
        assert_eq!(sim.encoders(), Err(MotionError::NotConnected));
        assert_eq!(sim.axis_count(), Err(MotionError::NotConnected));
        handle.set_fault(None);
        assert_eq!(sim.axis_count(), Ok(1));
        assert_eq!(handle.num_moves(), 1);
    }
}
