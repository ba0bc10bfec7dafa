//! Input listener manager
//!
//! Top-level entry point of the emulation core. Owns the virtual gamepad, the scheduler
//! and at most one live [`ListenerGeneration`].
//!
//! # State Machine
//!
//! ```text
//!              enable(config)
//! Disabled ───────────────────► Enabled(N)
//!    ▲                            │    │
//!    │         disable()          │    │ enable(config): teardown N, attach N+1
//!    └────────────────────────────┘    ▼
//!                                   Enabled(N+1)
//! ```
//!
//! # Data Flow
//!
//! ```text
//! InputEvent ──► [attached?] ──► CodeMapping ──► VirtualGamepadDevice
//!                     │                              ▲
//!                MouseMove ──► MotionSmoother ───────┘ (on flush timer)
//! ```
//!
//! Every timer carries the id of the generation that scheduled it. Teardown cancels all of
//! them, and a timer that still arrives for an older generation is dropped, so nothing
//! scheduled before a swap can touch the state of the next generation.

use crate::config::EmulatorSettings;
use crate::gamepad::clock::Clock;
use crate::gamepad::device::{GamepadSnapshot, VirtualGamepadDevice};
use crate::input::event::{EventDisposition, InputEvent, ListenerKind, ListeningStatus};
use crate::input::generation::{Attached, ListenerGeneration};
use crate::input::motion::MotionSmoother;
use crate::input::scheduler::{Scheduler, Timer, TimerId, TimerKind, VirtualScheduler};
use crate::mapping::binding::{Binding, GamepadConfig};
use crate::mapping::codes::{self, ScrollDirection};
use crate::mapping::compiler::{compile, CompiledConfig, InvalidBinding};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug)]
enum ListenerState {
    Disabled,
    Enabled(ListenerGeneration<Attached>),
}

#[derive(Debug)]
pub struct InputListenerManager<S: Scheduler> {
    state: ListenerState,
    generations: u64,
    device: VirtualGamepadDevice,
    scheduler: S,
    settings: EmulatorSettings,
    status: watch::Sender<ListeningStatus>,
}

impl<S: Scheduler> InputListenerManager<S> {
    pub fn new(settings: EmulatorSettings, scheduler: S, clock: Arc<dyn Clock>) -> Self {
        info!("Creating InputListenerManager");
        let device = VirtualGamepadDevice::new(settings.gamepad_id.clone(), clock);
        let (status, _) = watch::channel(ListeningStatus::NotListening);
        Self {
            state: ListenerState::Disabled,
            generations: 0,
            device,
            scheduler,
            settings,
            status,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.state, ListenerState::Enabled(_))
    }

    /// Id of the live generation, if any
    pub fn generation(&self) -> Option<u64> {
        match &self.state {
            ListenerState::Enabled(generation) => Some(generation.id()),
            ListenerState::Disabled => None,
        }
    }

    pub fn attached_listeners(&self) -> Vec<ListenerKind> {
        match &self.state {
            ListenerState::Enabled(generation) => generation.listeners(),
            ListenerState::Disabled => Vec::new(),
        }
    }

    /// Timers the live generation is still waiting for
    pub fn live_timers(&self) -> usize {
        match &self.state {
            ListenerState::Enabled(generation) => generation.live_timers(),
            ListenerState::Disabled => 0,
        }
    }

    pub fn status(&self) -> ListeningStatus {
        *self.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ListeningStatus> {
        self.status.subscribe()
    }

    pub fn subscribe_gamepad(&self) -> watch::Receiver<GamepadSnapshot> {
        self.device.subscribe()
    }

    pub fn snapshot(&self) -> GamepadSnapshot {
        self.device.snapshot()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Replaces any live generation with one built from `config`
    ///
    /// Conflicting bindings are dropped and returned; the rest of the config is applied.
    pub fn enable(&mut self, config: &GamepadConfig) -> Vec<InvalidBinding> {
        if self.is_enabled() {
            debug!("Already enabled, tearing down current generation first");
            self.disable();
        }

        let CompiledConfig {
            code_mapping,
            invalid_bindings,
            has_errors,
        } = compile(&config.key_config);
        if has_errors {
            error!(
                "Invalid bindings in gamepad config, continuing with the valid subset: {:?}",
                invalid_bindings
            );
        }

        let motion = match config.mouse_config.mouse_controls {
            Some(stick) => match config.mouse_config.validate() {
                Ok(()) => Some(MotionSmoother::new(stick, config.mouse_config.sensitivity)),
                Err(e) => {
                    error!("Mouse controls disabled: {}", e);
                    None
                }
            },
            None => None,
        };

        self.generations += 1;
        let generation = ListenerGeneration::attach(self.generations, code_mapping, motion);
        self.state = ListenerState::Enabled(generation);
        self.set_status(ListeningStatus::NotListening);
        self.device.connect();

        info!("Input translation enabled (generation {})", self.generations);
        invalid_bindings
    }

    /// Removes all listeners, cancels all timers and zeroes the virtual device
    pub fn disable(&mut self) {
        match std::mem::replace(&mut self.state, ListenerState::Disabled) {
            ListenerState::Enabled(generation) => {
                let detached = generation.teardown(&mut self.scheduler);
                info!("Input translation disabled (generation {})", detached.id());
            }
            ListenerState::Disabled => debug!("Disable requested while already disabled"),
        }
        self.device.disconnect();
        self.set_status(ListeningStatus::NotListening);
    }

    /// Routes one raw event; events without an attached listener pass through untouched
    pub fn handle_event(&mut self, event: InputEvent) -> EventDisposition {
        let Some(mut dispatch) = self.dispatch() else {
            return EventDisposition::PassThrough;
        };
        if !dispatch.generation.is_attached(event.listener()) {
            return EventDisposition::PassThrough;
        }

        match event {
            InputEvent::KeyDown { code, repeat } => dispatch.key_down(&code, repeat),
            InputEvent::KeyUp { code } => {
                dispatch.apply(&code, false);
                EventDisposition::PassThrough
            }
            InputEvent::MouseDown { button } => dispatch.mouse_button(button, true),
            InputEvent::MouseUp { button } => dispatch.mouse_button(button, false),
            InputEvent::ContextMenu => EventDisposition::Consumed,
            InputEvent::Wheel { delta_y } => dispatch.wheel(delta_y),
            InputEvent::MouseMove { dx, dy } => dispatch.mouse_move(dx, dy),
            InputEvent::PointerLockChange { locked } => dispatch.pointer_lock_change(locked),
            InputEvent::PointerLockError => dispatch.pointer_lock_error(),
        }
    }

    /// Called by the scheduler driver when a timer fires
    pub fn on_timer(&mut self, id: TimerId, timer: Timer) {
        let Some(mut dispatch) = self.dispatch() else {
            debug!("Ignoring {:?} timer fired while disabled", timer.kind);
            return;
        };
        if !dispatch.generation.owns_timer(id, &timer) {
            debug!(
                "Ignoring stale {:?} timer from generation {}",
                timer.kind, timer.generation
            );
            return;
        }
        dispatch.generation.take_timer(timer.kind);

        match timer.kind {
            TimerKind::ScrollRelease => dispatch.scroll_release(),
            TimerKind::MotionFlush => dispatch.motion_flush(),
            TimerKind::MotionIdle => dispatch.motion_idle(),
        }
    }

    fn dispatch(&mut self) -> Option<Dispatch<'_, S>> {
        let ListenerState::Enabled(generation) = &mut self.state else {
            return None;
        };
        Some(Dispatch {
            generation,
            device: &mut self.device,
            scheduler: &mut self.scheduler,
            settings: &self.settings,
            status: &self.status,
        })
    }

    fn set_status(&self, status: ListeningStatus) {
        self.status.send_replace(status);
    }
}

impl InputListenerManager<VirtualScheduler> {
    /// Moves virtual time forward, firing every timer that falls due on the way
    pub fn advance(&mut self, by: Duration) {
        let target = self.scheduler.now() + by;
        while let Some((id, timer)) = self.scheduler.pop_due(target) {
            self.on_timer(id, timer);
        }
        self.scheduler.clock().set(target);
    }
}

/// Borrowed view of the live generation and everything it may mutate
struct Dispatch<'a, S: Scheduler> {
    generation: &'a mut ListenerGeneration<Attached>,
    device: &'a mut VirtualGamepadDevice,
    scheduler: &'a mut S,
    settings: &'a EmulatorSettings,
    status: &'a watch::Sender<ListeningStatus>,
}

impl<S: Scheduler> Dispatch<'_, S> {
    /// Applies a press or release edge for `code`; false if the code is unbound
    fn apply(&mut self, code: &str, pressed: bool) -> bool {
        let Some(binding) = self.generation.mapping().get(code).copied() else {
            return false;
        };
        match binding {
            Binding::Button { button } => self.device.set_button(button, pressed),
            Binding::Axis { axis, direction } if pressed => self.device.press_axis(axis, direction),
            Binding::Axis { axis, direction } => self.device.release_axis(axis, direction),
        }
        true
    }

    fn key_down(&mut self, code: &str, repeat: bool) -> EventDisposition {
        // auto-repeat while held, only the first edge counts
        if repeat {
            return EventDisposition::PassThrough;
        }
        consumed_if(self.apply(code, true))
    }

    fn mouse_button(&mut self, button: i16, pressed: bool) -> EventDisposition {
        match codes::mouse_button_code(button) {
            Some(code) => consumed_if(self.apply(code, pressed)),
            None => EventDisposition::PassThrough,
        }
    }

    /// Scroll acts as a momentary button per direction, released by a trailing timer
    fn wheel(&mut self, delta_y: f64) -> EventDisposition {
        let direction = ScrollDirection::from_delta(delta_y);

        if let Some(previous) = self.generation.last_scroll() {
            if previous != direction {
                // Richtungswechsel: alten "Button" sofort loslassen
                self.generation
                    .cancel_timer(self.scheduler, TimerKind::ScrollRelease);
                self.apply(previous.code(), false);
            }
        }

        let handled = self.apply(direction.code(), true);
        self.generation.set_last_scroll(handled.then_some(direction));
        if handled {
            self.generation.restart_timer(
                self.scheduler,
                TimerKind::ScrollRelease,
                self.settings.scroll_release(),
            );
        }
        consumed_if(handled)
    }

    fn scroll_release(&mut self) {
        if let Some(direction) = self.generation.last_scroll() {
            self.generation.set_last_scroll(None);
            self.apply(direction.code(), false);
        }
    }

    fn mouse_move(&mut self, dx: f64, dy: f64) -> EventDisposition {
        let Some(motion) = self.generation.motion_mut() else {
            return EventDisposition::PassThrough;
        };
        motion.accumulate(dx, dy);
        if !self.generation.has_timer(TimerKind::MotionFlush) {
            self.generation.restart_timer(
                self.scheduler,
                TimerKind::MotionFlush,
                self.settings.motion_flush(),
            );
        }
        EventDisposition::PassThrough
    }

    fn motion_flush(&mut self) {
        self.generation.restart_timer(
            self.scheduler,
            TimerKind::MotionIdle,
            self.settings.motion_idle(),
        );
        if let Some(motion) = self.generation.motion_mut() {
            let (x, y) = motion.flush(self.device);
            debug!("Motion flush: ({:.3}, {:.3})", x, y);
        }
    }

    fn motion_idle(&mut self) {
        if let Some(motion) = self.generation.motion_mut() {
            motion.settle(self.device);
        }
    }

    fn pointer_lock_change(&mut self, locked: bool) -> EventDisposition {
        if locked {
            info!("Pointer lock acquired, tracking mouse motion");
            self.generation.add_listener(ListenerKind::MouseMove);
            self.status.send_replace(ListeningStatus::Listening);
        } else {
            info!("Pointer lock released");
            self.stop_motion();
            self.status.send_replace(ListeningStatus::NotListening);
        }
        EventDisposition::PassThrough
    }

    /// Lock acquisition failed; the host needs a new user gesture to retry
    fn pointer_lock_error(&mut self) -> EventDisposition {
        warn!("Pointer lock request failed");
        self.stop_motion();
        self.status.send_replace(ListeningStatus::Error);
        EventDisposition::PassThrough
    }

    fn stop_motion(&mut self) {
        self.generation
            .cancel_timer(self.scheduler, TimerKind::MotionFlush);
        self.generation
            .cancel_timer(self.scheduler, TimerKind::MotionIdle);
        self.generation.remove_listener(ListenerKind::MouseMove);
        if let Some(motion) = self.generation.motion_mut() {
            motion.release(self.device);
        }
    }
}

fn consumed_if(handled: bool) -> EventDisposition {
    if handled {
        EventDisposition::Consumed
    } else {
        EventDisposition::PassThrough
    }
}
