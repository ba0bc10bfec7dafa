//! Listener generation with statum state machine
//!
//! A generation is everything one `enable()` call attaches: the compiled code mapping,
//! the set of raw listeners, the timers they started, and the motion smoother.
//!
//! # State Machine
//!
//! ```text
//! Attached ──(teardown)──► Detached
//! ```
//!
//! Teardown removes every listener and cancels every timer the generation still owns.
//! A detached generation cannot be reattached; the next `enable()` builds a new one.

use crate::input::event::ListenerKind;
use crate::input::motion::MotionSmoother;
use crate::input::scheduler::{Scheduler, Timer, TimerId, TimerKind};
use crate::mapping::codes::{self, ScrollDirection};
use crate::mapping::compiler::CodeMapping;
use statum::{machine, state};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, info};

#[state]
#[derive(Debug, Clone)]
pub enum GenerationState {
    Attached, // Listeners live, timers may be pending
    Detached, // Torn down, nothing live
}

#[machine]
pub struct ListenerGeneration<S: GenerationState> {
    id: u64,
    mapping: CodeMapping,
    listeners: BTreeSet<ListenerKind>,
    timers: HashMap<TimerKind, TimerId>,
    last_scroll: Option<ScrollDirection>,
    motion: Option<MotionSmoother>,
}

impl<S: GenerationState> ListenerGeneration<S> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_attached(&self, kind: ListenerKind) -> bool {
        self.listeners.contains(&kind)
    }

    pub fn listeners(&self) -> Vec<ListenerKind> {
        self.listeners.iter().copied().collect()
    }

    pub fn live_timers(&self) -> usize {
        self.timers.len()
    }
}

impl<S: GenerationState> fmt::Debug for ListenerGeneration<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerGeneration")
            .field("id", &self.id)
            .field("listeners", &self.listeners)
            .field("timers", &self.timers)
            .field("last_scroll", &self.last_scroll)
            .finish_non_exhaustive()
    }
}

impl ListenerGeneration<Attached> {
    /// Picks the listeners the mapping needs
    ///
    /// Keyboard listeners are always attached. Mouse buttons, the context menu and the
    /// wheel are only intercepted when a binding uses them, so unconfigured buttons keep
    /// their native behavior. Pointer motion needs a smoother; its `mousemove` listener
    /// is only added once pointer lock is acquired.
    pub fn attach(id: u64, mapping: CodeMapping, motion: Option<MotionSmoother>) -> Self {
        let mut listeners = BTreeSet::from([ListenerKind::KeyDown, ListenerKind::KeyUp]);

        if mapping.has_mouse_buttons() {
            listeners.insert(ListenerKind::MouseDown);
            listeners.insert(ListenerKind::MouseUp);
            if mapping.contains(codes::RIGHT_CLICK) {
                listeners.insert(ListenerKind::ContextMenu);
            }
        }
        if mapping.has_scroll() {
            listeners.insert(ListenerKind::Wheel);
        }
        if motion.is_some() {
            listeners.insert(ListenerKind::PointerLockChange);
            listeners.insert(ListenerKind::PointerLockError);
        }

        info!("Attaching listener generation {}: {:?}", id, listeners);
        Self::new(id, mapping, listeners, HashMap::new(), None, motion)
    }

    pub fn mapping(&self) -> &CodeMapping {
        &self.mapping
    }

    pub fn motion_mut(&mut self) -> Option<&mut MotionSmoother> {
        self.motion.as_mut()
    }

    pub fn add_listener(&mut self, kind: ListenerKind) {
        if self.listeners.insert(kind) {
            debug!("Generation {}: attached {:?}", self.id, kind);
        }
    }

    pub fn remove_listener(&mut self, kind: ListenerKind) {
        if self.listeners.remove(&kind) {
            debug!("Generation {}: removed {:?}", self.id, kind);
        }
    }

    pub fn last_scroll(&self) -> Option<ScrollDirection> {
        self.last_scroll
    }

    pub fn set_last_scroll(&mut self, direction: Option<ScrollDirection>) {
        self.last_scroll = direction;
    }

    pub fn has_timer(&self, kind: TimerKind) -> bool {
        self.timers.contains_key(&kind)
    }

    /// A fired timer counts only if this generation created it and still waits for it
    pub fn owns_timer(&self, id: TimerId, timer: &Timer) -> bool {
        timer.generation == self.id && self.timers.get(&timer.kind) == Some(&id)
    }

    pub fn take_timer(&mut self, kind: TimerKind) -> Option<TimerId> {
        self.timers.remove(&kind)
    }

    /// Cancels the pending timer of `kind` (if any) and schedules a fresh one
    pub fn restart_timer<S: Scheduler>(
        &mut self,
        scheduler: &mut S,
        kind: TimerKind,
        delay: std::time::Duration,
    ) {
        if let Some(previous) = self.timers.remove(&kind) {
            scheduler.cancel(previous);
        }
        let id = scheduler.schedule(
            delay,
            Timer {
                generation: self.id,
                kind,
            },
        );
        self.timers.insert(kind, id);
    }

    pub fn cancel_timer<S: Scheduler>(&mut self, scheduler: &mut S, kind: TimerKind) {
        if let Some(id) = self.timers.remove(&kind) {
            scheduler.cancel(id);
        }
    }

    /// Removes every listener and cancels every pending timer
    pub fn teardown<S: Scheduler>(mut self, scheduler: &mut S) -> ListenerGeneration<Detached> {
        let cancelled = self.timers.len();
        for (_, id) in self.timers.drain() {
            scheduler.cancel(id);
        }
        self.listeners.clear();
        self.last_scroll = None;
        self.motion = None;

        info!(
            "Detached listener generation {} ({} timers cancelled)",
            self.id, cancelled
        );
        self.transition()
    }
}

// Implementierung für den abgelösten Zustand
impl ListenerGeneration<Detached> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamepad::clock::ManualClock;
    use crate::input::scheduler::VirtualScheduler;
    use crate::mapping::binding::{Binding, KeyConfig, Stick};
    use crate::mapping::codes::StandardButton;
    use crate::mapping::compiler::compile;
    use std::time::Duration;

    fn mapping(codes: &[&str]) -> CodeMapping {
        let mut config = KeyConfig::new();
        for (index, code) in codes.iter().enumerate() {
            config.bind(*code, Binding::Button { button: index });
        }
        compile(&config).code_mapping
    }

    #[test]
    fn keyboard_only_mapping_attaches_keyboard_listeners() {
        let generation = ListenerGeneration::attach(1, mapping(&["KeyA"]), None);
        assert_eq!(
            generation.listeners(),
            vec![ListenerKind::KeyDown, ListenerKind::KeyUp]
        );
    }

    #[test]
    fn context_menu_is_only_suppressed_for_right_click() {
        let left_only = ListenerGeneration::attach(1, mapping(&["LeftClick"]), None);
        assert!(left_only.is_attached(ListenerKind::MouseDown));
        assert!(!left_only.is_attached(ListenerKind::ContextMenu));

        let right = ListenerGeneration::attach(2, mapping(&["RightClick"]), None);
        assert!(right.is_attached(ListenerKind::ContextMenu));
    }

    #[test]
    fn scroll_and_motion_listeners_follow_config() {
        let mut config = KeyConfig::new();
        config.bind("ScrollUp", Binding::button(StandardButton::Y));
        let motion = MotionSmoother::new(Stick::Right, 20.0);
        let generation =
            ListenerGeneration::attach(1, compile(&config).code_mapping, Some(motion));

        assert!(generation.is_attached(ListenerKind::Wheel));
        assert!(generation.is_attached(ListenerKind::PointerLockChange));
        assert!(generation.is_attached(ListenerKind::PointerLockError));
        assert!(!generation.is_attached(ListenerKind::MouseMove));
        assert!(!generation.is_attached(ListenerKind::MouseDown));
    }

    #[test]
    fn teardown_cancels_everything() {
        let mut scheduler = VirtualScheduler::new(ManualClock::new());
        let mut generation = ListenerGeneration::attach(3, mapping(&["ScrollDown"]), None);
        generation.restart_timer(&mut scheduler, TimerKind::ScrollRelease, Duration::from_millis(20));
        generation.restart_timer(&mut scheduler, TimerKind::ScrollRelease, Duration::from_millis(20));
        assert_eq!(scheduler.pending(), 1);

        let detached = generation.teardown(&mut scheduler);
        assert_eq!(detached.id(), 3);
        assert!(detached.listeners().is_empty());
        assert_eq!(detached.live_timers(), 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn foreign_timers_are_not_owned() {
        let mut scheduler = VirtualScheduler::new(ManualClock::new());
        let mut generation = ListenerGeneration::attach(5, mapping(&["ScrollDown"]), None);
        generation.restart_timer(&mut scheduler, TimerKind::ScrollRelease, Duration::from_millis(20));
        let (id, timer) = scheduler.pending_timers()[0];

        assert!(generation.owns_timer(id, &timer));
        let older = Timer {
            generation: 4,
            ..timer
        };
        assert!(!generation.owns_timer(id, &older));
    }
}
