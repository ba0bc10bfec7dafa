//! Exposes the virtual device through the host's controller query
//!
//! Installation is a separate, reversible step: the emulation core never knows how
//! its snapshots reach page code.

use crate::gamepad::device::GamepadSnapshot;
use std::fmt::Debug;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

/// Number of controller slots reported by a gamepad query
pub const GAMEPAD_SLOTS: usize = 4;

/// The host's controller query (`navigator.getGamepads()` in a browser)
pub trait GamepadQuery: Send + Sync + Debug {
    fn get_gamepads(&self) -> Vec<Option<GamepadSnapshot>>;
}

/// Native query for hosts without physical controllers
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNativeGamepads;

impl GamepadQuery for NoNativeGamepads {
    fn get_gamepads(&self) -> Vec<Option<GamepadSnapshot>> {
        vec![None; GAMEPAD_SLOTS]
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstallError {
    #[error("Virtual gamepad is already installed")]
    AlreadyInstalled,

    #[error("Virtual gamepad is not installed")]
    NotInstalled,
}

/// Controller query as seen by page code, optionally overlaid by the virtual device
#[derive(Debug)]
pub struct GamepadNavigator {
    native: Box<dyn GamepadQuery>,
    virtual_device: Option<watch::Receiver<GamepadSnapshot>>,
}

impl GamepadNavigator {
    pub fn new(native: Box<dyn GamepadQuery>) -> Self {
        Self {
            native,
            virtual_device: None,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.virtual_device.is_some()
    }

    pub fn install(
        &mut self,
        device: watch::Receiver<GamepadSnapshot>,
    ) -> Result<(), InstallError> {
        if self.virtual_device.is_some() {
            return Err(InstallError::AlreadyInstalled);
        }
        info!("Installing virtual gamepad into controller query");
        self.virtual_device = Some(device);
        Ok(())
    }

    /// Restores the native query
    pub fn uninstall(&mut self) -> Result<(), InstallError> {
        match self.virtual_device.take() {
            Some(_) => {
                info!("Virtual gamepad uninstalled, native controller query restored");
                Ok(())
            }
            None => Err(InstallError::NotInstalled),
        }
    }

    /// While the virtual device is connected it is the only controller reported, in slot 0
    pub fn get_gamepads(&self) -> Vec<Option<GamepadSnapshot>> {
        if let Some(receiver) = &self.virtual_device {
            let snapshot = receiver.borrow().clone();
            if snapshot.connected {
                let mut slots = vec![None; GAMEPAD_SLOTS];
                slots[0] = Some(snapshot);
                return slots;
            }
            debug!("Virtual gamepad disconnected, falling through to native query");
        }
        self.native.get_gamepads()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamepad::clock::ManualClock;
    use crate::gamepad::device::VirtualGamepadDevice;
    use std::sync::Arc;

    #[derive(Debug)]
    struct OneNativePad(GamepadSnapshot);

    impl GamepadQuery for OneNativePad {
        fn get_gamepads(&self) -> Vec<Option<GamepadSnapshot>> {
            vec![Some(self.0.clone()), None, None, None]
        }
    }

    fn native_pad() -> GamepadSnapshot {
        let mut device = VirtualGamepadDevice::new("native", Arc::new(ManualClock::new()));
        device.connect();
        device.snapshot()
    }

    #[test]
    fn reports_virtual_pad_while_connected() {
        let mut device = VirtualGamepadDevice::new("virtual", Arc::new(ManualClock::new()));
        let mut navigator = GamepadNavigator::new(Box::new(OneNativePad(native_pad())));
        navigator.install(device.subscribe()).unwrap();

        // disconnected device falls through to the native pad
        assert_eq!(navigator.get_gamepads()[0].as_ref().unwrap().id, "native");

        device.connect();
        device.set_button(0, true);
        let pads = navigator.get_gamepads();
        assert_eq!(pads.len(), GAMEPAD_SLOTS);
        let pad = pads[0].as_ref().unwrap();
        assert_eq!(pad.id, "virtual");
        assert!(pad.is_pressed(0));
        assert!(pads[1..].iter().all(Option::is_none));
    }

    #[test]
    fn uninstall_restores_native_query() {
        let mut device = VirtualGamepadDevice::new("virtual", Arc::new(ManualClock::new()));
        device.connect();
        let mut navigator = GamepadNavigator::new(Box::new(NoNativeGamepads));

        navigator.install(device.subscribe()).unwrap();
        assert!(navigator.get_gamepads()[0].is_some());

        navigator.uninstall().unwrap();
        assert!(!navigator.is_installed());
        assert!(navigator.get_gamepads().iter().all(Option::is_none));
    }

    #[test]
    fn install_and_uninstall_are_not_repeatable() {
        let device = VirtualGamepadDevice::new("virtual", Arc::new(ManualClock::new()));
        let mut navigator = GamepadNavigator::new(Box::new(NoNativeGamepads));

        assert_eq!(navigator.uninstall(), Err(InstallError::NotInstalled));
        navigator.install(device.subscribe()).unwrap();
        assert_eq!(
            navigator.install(device.subscribe()),
            Err(InstallError::AlreadyInstalled)
        );
    }
}
