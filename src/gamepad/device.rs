//! Virtual gamepad device
//!
//! Owns the canonical emulated controller state. Every mutation publishes a fresh
//! snapshot on a watch channel; readers only ever see copies, and only the latest
//! state matters, so there is no mutation queue.
//!
//! ```text
//! InputListenerManager ──► VirtualGamepadDevice ──[watch]──► GamepadNavigator ──► page
//!        (mutators)            (canonical state)              (get_gamepads)
//! ```

use crate::gamepad::clock::Clock;
use crate::mapping::binding::{Direction, Stick};
use crate::mapping::codes::{STANDARD_AXIS_COUNT, STANDARD_BUTTON_COUNT};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const STANDARD_MAPPING: &str = "standard";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GamepadButton {
    pub pressed: bool,
    /// Analog value 0..1; digital sources only produce 0 or 1
    pub value: f64,
}

/// Standard-shaped gamepad object as handed to page code
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GamepadSnapshot {
    pub id: String,
    pub index: u32,
    pub connected: bool,
    pub mapping: String,
    pub buttons: [GamepadButton; STANDARD_BUTTON_COUNT],
    /// Range -1..1: left x, left y, right x, right y
    pub axes: [f64; STANDARD_AXIS_COUNT],
    /// Milliseconds on the device clock
    pub timestamp: f64,
}

impl GamepadSnapshot {
    fn disconnected(id: String) -> Self {
        Self {
            id,
            index: 0,
            connected: false,
            mapping: STANDARD_MAPPING.to_string(),
            buttons: [GamepadButton::default(); STANDARD_BUTTON_COUNT],
            axes: [0.0; STANDARD_AXIS_COUNT],
            timestamp: 0.0,
        }
    }

    /// True when nothing is pressed and every axis rests at zero
    pub fn is_neutral(&self) -> bool {
        self.buttons.iter().all(|button| !button.pressed && button.value == 0.0)
            && self.axes.iter().all(|axis| *axis == 0.0)
    }

    pub fn is_pressed(&self, index: usize) -> bool {
        self.buttons.get(index).is_some_and(|button| button.pressed)
    }
}

#[derive(Debug)]
pub struct VirtualGamepadDevice {
    state: GamepadSnapshot,
    clock: Arc<dyn Clock>,
    publisher: watch::Sender<GamepadSnapshot>,
}

impl VirtualGamepadDevice {
    pub fn new(id: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        let state = GamepadSnapshot::disconnected(id.into());
        let (publisher, _) = watch::channel(state.clone());
        debug!("Created virtual gamepad device: {}", state.id);
        Self {
            state,
            clock,
            publisher,
        }
    }

    /// Receiver for the latest published snapshot
    pub fn subscribe(&self) -> watch::Receiver<GamepadSnapshot> {
        self.publisher.subscribe()
    }

    /// Copy of the current state; callers never see the live value
    pub fn snapshot(&self) -> GamepadSnapshot {
        self.state.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected
    }

    pub fn connect(&mut self) {
        if !self.state.connected {
            info!("Virtual gamepad connected: {}", self.state.id);
        }
        self.state.connected = true;
        self.publish();
    }

    /// Zeroes every button and axis and marks the device disconnected
    pub fn disconnect(&mut self) {
        if self.state.connected {
            info!("Virtual gamepad disconnected: {}", self.state.id);
        }
        self.state.buttons = [GamepadButton::default(); STANDARD_BUTTON_COUNT];
        self.state.axes = [0.0; STANDARD_AXIS_COUNT];
        self.state.connected = false;
        self.publish();
    }

    pub fn set_button(&mut self, index: usize, pressed: bool) {
        let Some(button) = self.state.buttons.get_mut(index) else {
            warn!("Ignoring out-of-range button index {}", index);
            return;
        };
        button.pressed = pressed;
        button.value = if pressed { 1.0 } else { 0.0 };
        self.publish();
    }

    /// Sets both axes of a stick, clamped to -1..1
    pub fn set_axis(&mut self, stick: Stick, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            warn!("Ignoring non-finite stick value ({}, {})", x, y);
            return;
        }
        let axis = stick.x_axis();
        self.state.axes[axis] = x.clamp(-1.0, 1.0);
        self.state.axes[axis + 1] = y.clamp(-1.0, 1.0);
        self.publish();
    }

    /// Pushes a single axis fully towards `direction`
    pub fn press_axis(&mut self, axis: usize, direction: Direction) {
        let Some(value) = self.state.axes.get_mut(axis) else {
            warn!("Ignoring out-of-range axis index {}", axis);
            return;
        };
        *value = direction.value();
        self.publish();
    }

    /// Recenters an axis, unless a later press already moved it the other way
    pub fn release_axis(&mut self, axis: usize, direction: Direction) {
        let Some(value) = self.state.axes.get_mut(axis) else {
            warn!("Ignoring out-of-range axis index {}", axis);
            return;
        };
        if *value == direction.value() {
            *value = 0.0;
        }
        self.publish();
    }

    fn publish(&mut self) {
        let now = self.clock.now().as_secs_f64() * 1000.0;
        self.state.timestamp = self.state.timestamp.max(now);
        self.publisher.send_replace(self.state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamepad::clock::ManualClock;
    use std::time::Duration;

    fn device() -> (VirtualGamepadDevice, ManualClock) {
        let clock = ManualClock::new();
        let device = VirtualGamepadDevice::new("test pad", Arc::new(clock.clone()));
        (device, clock)
    }

    #[test]
    fn starts_disconnected_with_standard_shape() {
        let (device, _) = device();
        let snapshot = device.snapshot();
        assert!(!snapshot.connected);
        assert_eq!(snapshot.mapping, "standard");
        assert_eq!(snapshot.buttons.len(), 17);
        assert_eq!(snapshot.axes.len(), 4);
        assert!(snapshot.is_neutral());
    }

    #[test]
    fn button_press_sets_value_and_timestamp() {
        let (mut device, clock) = device();
        device.connect();
        clock.advance(Duration::from_millis(12));
        device.set_button(3, true);

        let snapshot = device.snapshot();
        assert_eq!(
            snapshot.buttons[3],
            GamepadButton {
                pressed: true,
                value: 1.0
            }
        );
        assert_eq!(snapshot.timestamp, 12.0);
    }

    #[test]
    fn repeated_press_only_refreshes_timestamp() {
        let (mut device, clock) = device();
        device.set_button(0, true);
        let before = device.snapshot();

        clock.advance(Duration::from_millis(5));
        device.set_button(0, true);
        let after = device.snapshot();

        assert_eq!(before.buttons, after.buttons);
        assert!(after.timestamp > before.timestamp);
    }

    #[test]
    fn out_of_range_button_is_ignored() {
        let (mut device, _) = device();
        let before = device.snapshot();
        device.set_button(STANDARD_BUTTON_COUNT, true);
        device.set_button(usize::MAX, false);
        assert_eq!(device.snapshot(), before);
    }

    #[test]
    fn stick_values_are_clamped() {
        let (mut device, _) = device();
        device.set_axis(Stick::Right, 2.5, -0.25);
        assert_eq!(device.snapshot().axes, [0.0, 0.0, 1.0, -0.25]);

        device.set_axis(Stick::Left, f64::NAN, 0.5);
        assert_eq!(device.snapshot().axes, [0.0, 0.0, 1.0, -0.25]);
    }

    #[test]
    fn axis_release_keeps_opposite_press() {
        let (mut device, _) = device();
        device.press_axis(0, Direction::Negative);
        device.press_axis(0, Direction::Positive);
        device.release_axis(0, Direction::Negative);
        assert_eq!(device.snapshot().axes[0], 1.0);

        device.release_axis(0, Direction::Positive);
        assert_eq!(device.snapshot().axes[0], 0.0);
    }

    #[test]
    fn disconnect_zeroes_state() {
        let (mut device, _) = device();
        device.connect();
        device.set_button(7, true);
        device.set_axis(Stick::Left, 0.5, 0.5);

        device.disconnect();
        let snapshot = device.snapshot();
        assert!(!snapshot.connected);
        assert!(snapshot.is_neutral());
    }

    #[test]
    fn subscribers_see_latest_state_only() {
        let (mut device, _) = device();
        let receiver = device.subscribe();
        device.set_button(1, true);
        device.set_button(1, false);
        device.set_button(2, true);

        let seen = receiver.borrow().clone();
        assert!(!seen.is_pressed(1));
        assert!(seen.is_pressed(2));
    }

    #[test]
    fn snapshots_are_copies() {
        let (mut device, _) = device();
        let mut copy = device.snapshot();
        copy.buttons[0].pressed = true;
        copy.axes[0] = 1.0;
        assert!(device.snapshot().is_neutral());

        device.set_button(4, true);
        assert!(!copy.is_pressed(4));
    }
}
