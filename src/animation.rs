//! Value transitions
//!
//! A [`Transition`] approaches its target exponentially: every step covers
//! `speed * dt` of the remaining distance. Retargeting starts from the
//! current value so reversals mid-flight stay continuous.

use std::time::Duration;

/// Distance at which a transition snaps to its target
const SETTLE_EPSILON: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    current: f32,
    target: f32,
    speed: f32,
    settle: f32,
}

impl Transition {
    pub fn new(from: f32, target: f32, speed: f32) -> Self {
        Self {
            current: from,
            target,
            speed: speed.max(0.0),
            settle: SETTLE_EPSILON,
        }
    }

    /// Snap distance, for values not measured in pixels
    pub fn with_settle_epsilon(mut self, epsilon: f32) -> Self {
        self.settle = epsilon.max(0.0);
        self
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_finished(&self) -> bool {
        self.current == self.target
    }

    /// Advance by `dt` and return the new value
    pub fn step(&mut self, dt: Duration) -> f32 {
        if self.is_finished() {
            return self.current;
        }

        let factor = (self.speed * dt.as_secs_f32()).min(1.0);
        self.current += (self.target - self.current) * factor;
        if (self.target - self.current).abs() < self.settle {
            self.current = self.target;
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_approaches_target() {
        let mut t = Transition::new(0.0, 100.0, 5.0);
        let first = t.step(Duration::from_millis(100));
        assert!((first - 50.0).abs() < 1e-3);
        let second = t.step(Duration::from_millis(100));
        assert!((second - 75.0).abs() < 1e-3);
        assert!(!t.is_finished());
    }

    #[test]
    fn test_large_step_settles() {
        let mut t = Transition::new(10.0, 200.0, 5.0);
        assert_eq!(t.step(Duration::from_secs(1)), 200.0);
        assert!(t.is_finished());
    }

    #[test]
    fn test_fraction_settle() {
        let mut t = Transition::new(0.0, 1.0, 10.0).with_settle_epsilon(0.001);
        assert!((t.step(Duration::from_millis(50)) - 0.5).abs() < 1e-4);
        assert!(!t.is_finished());
    }

    #[test]
    fn test_zero_speed_never_moves() {
        let mut t = Transition::new(3.0, 9.0, 0.0);
        assert_eq!(t.step(Duration::from_secs(10)), 3.0);
    }
}
