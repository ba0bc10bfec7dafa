//! Keyboard and mouse to virtual gamepad translation
//!
//! ```text
//! Preset ──► GamepadConfig ──► InputListenerManager ──► VirtualGamepadDevice ──► GamepadNavigator
//!                                    ▲
//!                               InputEvent
//! ```

pub mod config;
pub mod gamepad;
pub mod input;
pub mod mapping;
