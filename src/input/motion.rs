//! Pointer motion to analog stick conversion
//!
//! Deltas are summed between flushes. On flush the sum is scaled by the sensitivity,
//! clamped to -1..1 and written to the stick. Timing (flush cadence, idle recenter)
//! is driven by the listener manager's scheduler.

use crate::gamepad::device::VirtualGamepadDevice;
use crate::mapping::binding::Stick;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct MotionSmoother {
    stick: Stick,
    sensitivity: f64,
    pending_x: f64,
    pending_y: f64,
}

impl MotionSmoother {
    /// `sensitivity` must be positive; config validation guarantees it
    pub fn new(stick: Stick, sensitivity: f64) -> Self {
        debug!(
            "Motion smoother on {:?} stick, sensitivity {}",
            stick, sensitivity
        );
        Self {
            stick,
            sensitivity,
            pending_x: 0.0,
            pending_y: 0.0,
        }
    }

    pub fn stick(&self) -> Stick {
        self.stick
    }

    pub fn accumulate(&mut self, dx: f64, dy: f64) {
        if !dx.is_finite() || !dy.is_finite() {
            warn!("Ignoring non-finite pointer delta ({}, {})", dx, dy);
            return;
        }
        self.pending_x += dx;
        self.pending_y += dy;
    }

    /// Writes the accumulated motion to the stick and starts a new window
    pub fn flush(&mut self, device: &mut VirtualGamepadDevice) -> (f64, f64) {
        let x = self.scale(self.pending_x);
        let y = self.scale(self.pending_y);
        self.pending_x = 0.0;
        self.pending_y = 0.0;
        device.set_axis(self.stick, x, y);
        (x, y)
    }

    /// Recenters the stick after motion stopped
    pub fn settle(&mut self, device: &mut VirtualGamepadDevice) {
        device.set_axis(self.stick, 0.0, 0.0);
    }

    /// Drops pending motion and recenters, used when pointer lock is lost
    pub fn release(&mut self, device: &mut VirtualGamepadDevice) {
        self.pending_x = 0.0;
        self.pending_y = 0.0;
        device.set_axis(self.stick, 0.0, 0.0);
    }

    fn scale(&self, sum: f64) -> f64 {
        if sum == 0.0 {
            0.0
        } else {
            (sum / self.sensitivity).clamp(-1.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamepad::clock::ManualClock;
    use std::sync::Arc;

    fn device() -> VirtualGamepadDevice {
        VirtualGamepadDevice::new("test pad", Arc::new(ManualClock::new()))
    }

    #[test]
    fn flush_scales_by_sensitivity() {
        let mut device = device();
        let mut smoother = MotionSmoother::new(Stick::Right, 50.0);
        smoother.accumulate(25.0, 0.0);

        assert_eq!(smoother.flush(&mut device), (0.5, 0.0));
        assert_eq!(device.snapshot().axes, [0.0, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn bursts_are_summed_and_clamped() {
        let mut device = device();
        let mut smoother = MotionSmoother::new(Stick::Left, 10.0);
        smoother.accumulate(8.0, -3.0);
        smoother.accumulate(8.0, -4.0);

        assert_eq!(smoother.flush(&mut device), (1.0, -0.7));
        // accumulator starts over after a flush
        assert_eq!(smoother.flush(&mut device), (0.0, 0.0));
    }

    #[test]
    fn release_discards_pending_motion() {
        let mut device = device();
        let mut smoother = MotionSmoother::new(Stick::Right, 20.0);
        smoother.accumulate(10.0, 10.0);
        smoother.flush(&mut device);
        smoother.accumulate(5.0, 5.0);

        smoother.release(&mut device);
        assert_eq!(device.snapshot().axes, [0.0; 4]);
        assert_eq!(smoother.flush(&mut device), (0.0, 0.0));
    }

    #[test]
    fn non_finite_deltas_are_ignored() {
        let mut device = device();
        let mut smoother = MotionSmoother::new(Stick::Right, 20.0);
        smoother.accumulate(f64::INFINITY, 1.0);
        smoother.accumulate(10.0, 0.0);
        assert_eq!(smoother.flush(&mut device), (0.5, 0.0));
    }
}
