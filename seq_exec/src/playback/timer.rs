//! Cooperative one-shot timer

/// A timer which expires once, at a deadline on the caller's clock.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OneShotTimer {
    deadline_s: Option<f64>,
}

impl OneShotTimer {
    /// Arm the timer to expire `duration_s` after `now_s`, replacing any pending deadline.
    pub fn arm(&mut self, now_s: f64, duration_s: f64) {
        self.deadline_s = Some(now_s + duration_s);
    }

    pub fn cancel(&mut self) {
        self.deadline_s = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline_s.is_some()
    }

    pub fn deadline(&self) -> Option<f64> {
        self.deadline_s
    }

    /// If the deadline has been reached, disarm and return true.
    pub fn take_expired(&mut self, now_s: f64) -> bool {
        match self.deadline_s {
            Some(d) if now_s >= d => {
                self.deadline_s = None;
                true
            }
            _ => false,
        }
    }
}
