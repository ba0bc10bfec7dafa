//! Raw input handling
//!
//! 1. [`event`] - Host events, dispositions and the listening status
//! 2. [`scheduler`] - Injectable timers (virtual and tokio-backed)
//! 3. [`motion`] - Pointer delta accumulation for the mouse stick
//! 4. [`generation`] - Listeners and timers owned by one `enable()` call
//! 5. [`listener`] - The manager that routes events to the virtual gamepad
//! 6. [`listener_handle`] - Manager running in its own tokio task

pub mod event;
pub mod generation;
pub mod listener;
pub mod listener_handle;
pub mod motion;
pub mod scheduler;

pub use event::{EventDisposition, InputEvent, ListenerKind, ListeningStatus, ParseEventError};
pub use listener::InputListenerManager;
pub use listener_handle::{HandleError, ListenerHandle};
pub use motion::MotionSmoother;
pub use scheduler::{DelayQueueScheduler, Scheduler, Timer, TimerId, TimerKind, VirtualScheduler};
