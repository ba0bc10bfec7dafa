//! Virtual gamepad subsystem
//!
//! 1. [`clock`] - Time sources for timestamps and timers
//! 2. [`device`] - Canonical emulated controller state
//! 3. [`install`] - Reversible hook into the host's controller query

pub mod clock;
pub mod device;
pub mod install;

pub use clock::{Clock, ManualClock, TokioClock};
pub use device::{GamepadButton, GamepadSnapshot, VirtualGamepadDevice};
pub use install::{GamepadNavigator, GamepadQuery, InstallError, NoNativeGamepads};
