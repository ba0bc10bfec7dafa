//! Input codes and the standard controller layout
//!
//! Keyboard codes are the physical `KeyboardEvent.code` strings ("KeyW", "Space", ...).
//! Mouse buttons and the scroll wheel get synthetic codes so that all three sources
//! share one binding table.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Number of buttons in the standard controller mapping
pub const STANDARD_BUTTON_COUNT: usize = 17;

/// Number of axes in the standard controller mapping (two sticks, x and y each)
pub const STANDARD_AXIS_COUNT: usize = 4;

pub const SCROLL_UP: &str = "ScrollUp";
pub const SCROLL_DOWN: &str = "ScrollDown";
pub const RIGHT_CLICK: &str = "RightClick";

/// Synthetic codes for mouse buttons, indexed by `MouseEvent.button`
pub const MOUSE_BUTTON_CODES: [&str; 5] = [
    "LeftClick",
    "MiddleClick",
    RIGHT_CLICK,
    "BrowserBack",
    "BrowserForward",
];

pub const SCROLL_CODES: [&str; 2] = [SCROLL_UP, SCROLL_DOWN];

/// Translates a DOM mouse button number into its synthetic code
pub fn mouse_button_code(button: i16) -> Option<&'static str> {
    usize::try_from(button)
        .ok()
        .and_then(|index| MOUSE_BUTTON_CODES.get(index).copied())
}

pub fn is_mouse_button_code(code: &str) -> bool {
    MOUSE_BUTTON_CODES.contains(&code)
}

pub fn is_scroll_code(code: &str) -> bool {
    SCROLL_CODES.contains(&code)
}

/// Direction of a single wheel event, keyed by the sign of `deltaY`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    /// Negative deltas scroll up; zero counts as down, matching browsers' wheel handling
    pub fn from_delta(delta_y: f64) -> Self {
        if delta_y < 0.0 {
            ScrollDirection::Up
        } else {
            ScrollDirection::Down
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ScrollDirection::Up => SCROLL_UP,
            ScrollDirection::Down => SCROLL_DOWN,
        }
    }
}

/// Buttons of the standard controller mapping, in index order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardButton {
    A,
    B,
    X,
    Y,
    LeftShoulder,
    RightShoulder,
    LeftTrigger,
    RightTrigger,
    Select,
    Start,
    LeftStickPress,
    RightStickPress,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    Home,
}

impl StandardButton {
    pub const ALL: [StandardButton; STANDARD_BUTTON_COUNT] = [
        StandardButton::A,
        StandardButton::B,
        StandardButton::X,
        StandardButton::Y,
        StandardButton::LeftShoulder,
        StandardButton::RightShoulder,
        StandardButton::LeftTrigger,
        StandardButton::RightTrigger,
        StandardButton::Select,
        StandardButton::Start,
        StandardButton::LeftStickPress,
        StandardButton::RightStickPress,
        StandardButton::DPadUp,
        StandardButton::DPadDown,
        StandardButton::DPadLeft,
        StandardButton::DPadRight,
        StandardButton::Home,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl Display for StandardButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
